// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mount-bridge contract.
//!
//! The intercept manager only requests and releases mounts; the bridge
//! itself (FUSE or SFTP based) is an external collaborator. `NoBridge`
//! stands in on workstations without the bridge binary.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

/// Mount failures as seen by the intercept manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MountError {
    #[error("no filesystem bridge is available on this workstation")]
    BridgeUnavailable,

    #[error("mount point {0} is already in use")]
    MountPointBusy(PathBuf),

    #[error("mount failed: {0}")]
    Failed(String),
}

/// Seam through which the intercept manager requests pod filesystem mounts.
#[async_trait]
pub trait MountBridge: Clone + Send + Sync + 'static {
    /// Whether the bridge binary exists on this workstation.
    fn available(&self) -> bool;

    /// Expose the intercepted pod's filesystem at `mount_point`.
    async fn mount(&self, intercept_id: &str, mount_point: &Path) -> Result<(), MountError>;

    /// Release a mount created by [`MountBridge::mount`].
    async fn unmount(&self, intercept_id: &str, mount_point: &Path) -> Result<(), MountError>;
}

/// The no-bridge bridge: reports unavailable, refuses to mount.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBridge;

#[async_trait]
impl MountBridge for NoBridge {
    fn available(&self) -> bool {
        false
    }

    async fn mount(&self, _intercept_id: &str, _mount_point: &Path) -> Result<(), MountError> {
        Err(MountError::BridgeUnavailable)
    }

    async fn unmount(&self, _intercept_id: &str, _mount_point: &Path) -> Result<(), MountError> {
        Ok(())
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::Arc;

    /// In-memory bridge tracking active mounts.
    #[derive(Clone, Default)]
    pub struct FakeMountBridge {
        inner: Arc<Mutex<FakeInner>>,
    }

    #[derive(Default)]
    struct FakeInner {
        active: HashSet<PathBuf>,
        mounted: Vec<(String, PathBuf)>,
        unmounted: Vec<(String, PathBuf)>,
        unavailable: bool,
    }

    impl FakeMountBridge {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn unavailable() -> Self {
            let bridge = Self::default();
            bridge.inner.lock().unavailable = true;
            bridge
        }

        pub fn mounts(&self) -> Vec<(String, PathBuf)> {
            self.inner.lock().mounted.clone()
        }

        pub fn unmounts(&self) -> Vec<(String, PathBuf)> {
            self.inner.lock().unmounted.clone()
        }

        pub fn active_count(&self) -> usize {
            self.inner.lock().active.len()
        }
    }

    #[async_trait]
    impl MountBridge for FakeMountBridge {
        fn available(&self) -> bool {
            !self.inner.lock().unavailable
        }

        async fn mount(&self, intercept_id: &str, mount_point: &Path) -> Result<(), MountError> {
            let mut inner = self.inner.lock();
            if inner.unavailable {
                return Err(MountError::BridgeUnavailable);
            }
            if !inner.active.insert(mount_point.to_path_buf()) {
                return Err(MountError::MountPointBusy(mount_point.to_path_buf()));
            }
            inner
                .mounted
                .push((intercept_id.to_string(), mount_point.to_path_buf()));
            Ok(())
        }

        async fn unmount(&self, intercept_id: &str, mount_point: &Path) -> Result<(), MountError> {
            let mut inner = self.inner.lock();
            inner.active.remove(mount_point);
            inner
                .unmounted
                .push((intercept_id.to_string(), mount_point.to_path_buf()));
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "mount_tests.rs"]
mod tests;
