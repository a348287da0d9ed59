// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration reload watcher.
//!
//! Watches the directory containing the user config file rather than the
//! file itself: editors typically rename-then-create, and an inode watch
//! would go stale on the first save. Rapid successive events are
//! coalesced into a single reload.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::load::{load_from_dirs, ConfigError};
use crate::schema::ClientConfig;
use crate::CONFIG_FILE;

/// Debounce window for bursts of filesystem events.
const DEBOUNCE: Duration = Duration::from_millis(5);

/// Running watcher; dropping it stops both the OS watch and the task.
pub struct ConfigWatcher {
    // NOTE(lifetime): held to keep the OS watch registered; dropped last
    _watcher: RecommendedWatcher,
    task: tokio::task::JoinHandle<()>,
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Watch the last directory of `dirs` for changes to its `config.yml`.
///
/// On each (debounced) change the full directory list is reloaded; a
/// successful parse replaces the process-wide slot and invokes
/// `on_reload`. Parse failures are logged and the previous configuration
/// stays in effect.
pub fn watch<F>(dirs: Vec<PathBuf>, on_reload: F) -> Result<ConfigWatcher, ConfigError>
where
    F: Fn(Arc<ClientConfig>) + Send + Sync + 'static,
{
    let user_dir = dirs
        .last()
        .cloned()
        .ok_or_else(|| ConfigError::Watch("no directories to watch".to_string()))?;

    let (tx, rx) = mpsc::channel::<()>(32);
    let config_name = std::ffi::OsString::from(CONFIG_FILE);
    let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
        if let Ok(event) = res {
            let relevant = event
                .paths
                .iter()
                .any(|p| p.file_name() == Some(config_name.as_os_str()));
            if relevant || event.paths.is_empty() {
                let _ = tx.blocking_send(());
            }
        }
    })
    .map_err(|e| ConfigError::Watch(e.to_string()))?;

    std::fs::create_dir_all(&user_dir)
        .map_err(|e| ConfigError::Watch(format!("{}: {e}", user_dir.display())))?;
    watcher
        .watch(&user_dir, RecursiveMode::NonRecursive)
        .map_err(|e| ConfigError::Watch(e.to_string()))?;

    let task = tokio::spawn(reload_loop(dirs, rx, on_reload));
    Ok(ConfigWatcher {
        _watcher: watcher,
        task,
    })
}

async fn reload_loop<F>(dirs: Vec<PathBuf>, mut rx: mpsc::Receiver<()>, on_reload: F)
where
    F: Fn(Arc<ClientConfig>) + Send + Sync + 'static,
{
    while rx.recv().await.is_some() {
        // Coalesce the rename/create burst a typical editor save produces.
        while let Ok(Some(())) = tokio::time::timeout(DEBOUNCE, rx.recv()).await {}

        match load_from_dirs(&dirs) {
            Ok(config) => {
                debug!("configuration reloaded");
                let config = Arc::new(config);
                crate::slot::replace(Arc::clone(&config));
                on_reload(config);
            }
            Err(e) => {
                warn!(error = %e, "ignoring config reload failure");
            }
        }
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
