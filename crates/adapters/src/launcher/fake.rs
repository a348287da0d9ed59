// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable launcher for tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::{Launchable, Running};

/// What the fake records about supervisor interactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LauncherCall {
    Launch,
    Terminate,
    Kill,
}

/// Launcher whose processes exit only when the test says so.
#[derive(Clone, Default)]
pub struct FakeLauncher {
    inner: Arc<Mutex<FakeInner>>,
}

#[derive(Debug, Default)]
struct FakeInner {
    calls: Vec<LauncherCall>,
    /// Exit senders for every launched process, in launch order.
    exits: Vec<Option<oneshot::Sender<Option<i32>>>>,
    fail_next_launch: bool,
    /// When set, terminate() completes the process with this code.
    exit_on_terminate: Option<i32>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make terminate() behave like a process honoring SIGTERM.
    pub fn exit_on_terminate(self, code: i32) -> Self {
        self.inner.lock().exit_on_terminate = Some(code);
        self
    }

    pub fn fail_next_launch(&self) {
        self.inner.lock().fail_next_launch = true;
    }

    pub fn calls(&self) -> Vec<LauncherCall> {
        self.inner.lock().calls.clone()
    }

    pub fn launch_count(&self) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| **c == LauncherCall::Launch)
            .count()
    }

    /// Make the most recently launched process exit with `code`.
    pub fn exit_current(&self, code: i32) {
        let mut inner = self.inner.lock();
        if let Some(tx) = inner.exits.last_mut().and_then(Option::take) {
            let _ = tx.send(Some(code));
        }
    }
}

#[async_trait]
impl Launchable for FakeLauncher {
    async fn launch(&mut self) -> Result<Box<dyn Running>, String> {
        let mut inner = self.inner.lock();
        inner.calls.push(LauncherCall::Launch);
        if inner.fail_next_launch {
            inner.fail_next_launch = false;
            return Err("launch scripted to fail".to_string());
        }
        let (exit_tx, exit_rx) = oneshot::channel();
        inner.exits.push(Some(exit_tx));
        Ok(Box::new(FakeProcess {
            index: inner.exits.len() - 1,
            shared: Arc::clone(&self.inner),
            exit_rx,
        }))
    }
}

/// The fake's running-process handle.
#[derive(Debug)]
pub struct FakeProcess {
    index: usize,
    shared: Arc<Mutex<FakeInner>>,
    exit_rx: oneshot::Receiver<Option<i32>>,
}

impl Running for FakeProcess {
    fn id(&self) -> Option<u32> {
        None
    }

    fn terminate(&self) {
        let mut inner = self.shared.lock();
        inner.calls.push(LauncherCall::Terminate);
        if let Some(code) = inner.exit_on_terminate {
            if let Some(tx) = inner.exits.get_mut(self.index).and_then(Option::take) {
                let _ = tx.send(Some(code));
            }
        }
    }

    fn kill(&self) {
        let mut inner = self.shared.lock();
        inner.calls.push(LauncherCall::Kill);
        if let Some(tx) = inner.exits.get_mut(self.index).and_then(Option::take) {
            let _ = tx.send(None);
        }
    }

    fn exit_rx(&mut self) -> &mut oneshot::Receiver<Option<i32>> {
        &mut self.exit_rx
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
