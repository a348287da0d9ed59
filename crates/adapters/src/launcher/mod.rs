// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess launching seam.

mod process;
pub use process::CommandLauncher;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub mod fake;

use async_trait::async_trait;
use tokio::sync::oneshot;

/// Something that can start the supervised subprocess.
#[async_trait]
pub trait Launchable: Send + Sync + 'static {
    /// Start the subprocess; resolves once it is running.
    async fn launch(&mut self) -> Result<Box<dyn Running>, String>;
}

/// A running subprocess owned by exactly one supervisor loop.
pub trait Running: std::fmt::Debug + Send + Sync + 'static {
    /// OS process id, when there is a real process behind this.
    fn id(&self) -> Option<u32>;

    /// Ask the process to stop (SIGTERM).
    fn terminate(&self);

    /// Force the process down (SIGKILL).
    fn kill(&self);

    /// Channel resolving with the exit code when the process exits.
    fn exit_rx(&mut self) -> &mut oneshot::Receiver<Option<i32>>;
}
