// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error categories carried by every user-facing failure.
//!
//! The category decides how the CLI presents an error: `User` errors are
//! the caller's fault and are printed without the "see the daemon log"
//! hint; `Config` errors point at a malformed config file; `NoDaemonLogs`
//! marks failures that are expected and carry no useful log context.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failure, serialized across the IPC boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Bad input. Never logged with a stack, never hints at log files.
    User,
    /// Malformed configuration file.
    Config,
    /// Expected failure; don't prompt the user to look at logs.
    NoDaemonLogs,
    /// Anything else.
    #[default]
    Unknown,
}

impl Category {
    /// Whether the CLI should append the "see logs" hint for this category.
    pub fn wants_log_hint(self) -> bool {
        matches!(self, Category::Unknown)
    }
}

/// A categorized failure as it travels over the wire.
///
/// Daemon-side errors are flattened into this shape before being written
/// back to the CLI; the optional intercept code survives the trip so the
/// caller can match on it structurally instead of parsing message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct Failure {
    pub message: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<crate::intercept::InterceptCode>,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            category: Category::Unknown,
            code: None,
        }
    }

    pub fn user(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            category: Category::User,
            code: None,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            category: Category::Config,
            code: None,
        }
    }

    pub fn with_code(mut self, code: crate::intercept::InterceptCode) -> Self {
        self.code = Some(code);
        self
    }
}

#[cfg(test)]
#[path = "category_tests.rs"]
mod tests;
