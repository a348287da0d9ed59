// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tp-manager: client side of the in-cluster traffic manager.
//!
//! The [`ManagerApi`] trait is the seam: the wire client implements it
//! over the framed codec, and tests script a fake. Session keep-alive
//! and watch-stream reconnection live here too, so every consumer gets
//! the same backoff and invalidation behavior.

pub mod api;
pub mod session;
pub mod watch;
pub mod wire;

pub use api::{
    Arrival, ClientInfo, ClusterInfo, ManagerApi, ManagerError, PreparedIntercept, VersionInfo,
    WorkloadInfo, CLIENT_MAJOR_VERSION,
};
pub use session::{SessionEvent, SessionKeeper};
pub use watch::{spawn_watch, BACKOFF_INITIAL, BACKOFF_MAX};
pub use wire::{ManagerRequest, ManagerResponse, WireManager};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeManager, ManagerCall};
