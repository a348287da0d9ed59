// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide configuration slot.
//!
//! Readers take a snapshot for the duration of a call; they never cache
//! the pointer across RPC boundaries.

use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::schema::ClientConfig;

static SLOT: OnceLock<RwLock<Arc<ClientConfig>>> = OnceLock::new();

fn slot() -> &'static RwLock<Arc<ClientConfig>> {
    SLOT.get_or_init(|| RwLock::new(Arc::new(ClientConfig::default())))
}

/// Snapshot of the current configuration.
pub fn current() -> Arc<ClientConfig> {
    Arc::clone(&slot().read())
}

/// Atomically replace the current configuration, returning the previous one.
pub fn replace(config: Arc<ClientConfig>) -> Arc<ClientConfig> {
    std::mem::replace(&mut *slot().write(), config)
}

#[cfg(test)]
#[path = "slot_tests.rs"]
mod tests;
