// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered configuration load: system directories, then the user
//! directory, each merged over the previous. A missing file is not an
//! error; a malformed one is, with its location annotated.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::schema::{ClientConfig, ConfigFragment};
use crate::CONFIG_FILE;

/// System-wide configuration directories, lowest precedence first.
pub const SYSTEM_CONFIG_DIRS: [&str; 2] = ["/etc/telepresence", "/usr/local/etc/telepresence"];

/// Configuration load errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {file}: {source}")]
    Read {
        file: PathBuf,
        source: std::io::Error,
    },

    #[error("{file}{}: {source}", location(.source))]
    Parse {
        file: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("could not determine the user configuration directory")]
    NoUserDir,

    #[error("watch error: {0}")]
    Watch(String),
}

fn location(err: &serde_yaml::Error) -> String {
    match err.location() {
        Some(loc) => format!(":{}:{}", loc.line(), loc.column()),
        None => String::new(),
    }
}

/// The per-user configuration directory.
pub fn user_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("TELEPRESENCE_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join("telepresence"))
}

/// The per-user configuration file (may not exist).
pub fn user_config_file() -> Option<PathBuf> {
    user_config_dir().map(|d| d.join(CONFIG_FILE))
}

/// Default load order: system directories, then the user directory.
pub fn default_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = SYSTEM_CONFIG_DIRS.iter().map(PathBuf::from).collect();
    if let Some(user) = user_config_dir() {
        dirs.push(user);
    }
    dirs
}

/// Load and merge configuration from the default directories.
pub fn load() -> Result<ClientConfig, ConfigError> {
    load_from_dirs(&default_dirs())
}

/// Load and merge configuration from an explicit directory list.
///
/// The last directory is treated as the user directory: its `config.yml`
/// path becomes the file named by timeout errors, whether or not the file
/// currently exists.
pub fn load_from_dirs(dirs: &[PathBuf]) -> Result<ClientConfig, ConfigError> {
    let mut merged = ConfigFragment::default();
    for dir in dirs {
        let file = dir.join(CONFIG_FILE);
        if let Some(fragment) = load_fragment(&file)? {
            merged = merged.merge(fragment);
        }
    }
    let mut config = merged.resolve();
    config.source_file = dirs.last().map(|d| d.join(CONFIG_FILE));
    Ok(config)
}

/// Parse one file into a fragment; `None` when the file does not exist.
fn load_fragment(file: &Path) -> Result<Option<ConfigFragment>, ConfigError> {
    let text = match std::fs::read_to_string(file) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(file = %file.display(), "no config file");
            return Ok(None);
        }
        Err(source) => {
            return Err(ConfigError::Read {
                file: file.to_path_buf(),
                source,
            })
        }
    };
    let fragment: ConfigFragment =
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            file: file.to_path_buf(),
            source,
        })?;
    fragment.warn_unknown(file);
    debug!(file = %file.display(), "merged config file");
    Ok(Some(fragment))
}

#[cfg(test)]
#[path = "load_tests.rs"]
mod tests;
