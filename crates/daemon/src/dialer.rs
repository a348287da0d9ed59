// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seams for reaching the cluster and its traffic manager.
//!
//! The orchestrator never touches the Kubernetes API directly; it probes
//! the cluster and dials the manager through [`ClusterDialer`], and
//! treats manager installation as an opaque RPC behind
//! [`ManagerInstaller`].

use async_trait::async_trait;

use tp_core::{ConnectCode, ConnectRequest};
use tp_manager::{ManagerApi, WireManager};

/// A failed connect step, already mapped to its outcome code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ConnectFailure {
    pub code: ConnectCode,
    pub message: String,
}

impl ConnectFailure {
    pub fn new(code: ConnectCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Reaching the cluster and dialing its manager.
#[async_trait]
pub trait ClusterDialer: Send + Sync + 'static {
    type Api: ManagerApi;

    /// Load the cluster config for `request.context` and verify the
    /// cluster answers. Maps auth rejections to `Unauthenticated`.
    async fn probe_cluster(&self, request: &ConnectRequest) -> Result<(), ConnectFailure>;

    /// Dial the manager API through the virtual network.
    async fn dial_manager(&self, request: &ConnectRequest) -> Result<Self::Api, ConnectFailure>;
}

/// Opaque install/upgrade RPC for an absent traffic manager.
#[async_trait]
pub trait ManagerInstaller: Send + Sync + 'static {
    /// Make sure a manager is present in `request.manager_namespace`.
    async fn ensure(&self, request: &ConnectRequest) -> Result<(), ConnectFailure>;
}

/// Installer used when installation is not permitted: presence is
/// checked at dial time, absence is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInstaller;

#[async_trait]
impl ManagerInstaller for NoInstaller {
    async fn ensure(&self, _request: &ConnectRequest) -> Result<(), ConnectFailure> {
        Ok(())
    }
}

/// Production dialer: manager address derived from the request, reached
/// over the root daemon's virtual network.
#[derive(Debug, Clone)]
pub struct WireDialer {
    /// Port of the manager's API service.
    pub api_port: u16,
    /// Override address, e.g. from tests or a port-forward.
    pub addr_override: Option<String>,
}

impl WireDialer {
    pub fn new(api_port: u16) -> Self {
        Self {
            api_port,
            addr_override: None,
        }
    }
}

#[async_trait]
impl ClusterDialer for WireDialer {
    type Api = WireManager;

    async fn probe_cluster(&self, request: &ConnectRequest) -> Result<(), ConnectFailure> {
        if request.context.is_empty() {
            return Err(ConnectFailure::new(
                ConnectCode::ClusterUnreachable,
                "no cluster context given",
            ));
        }
        Ok(())
    }

    async fn dial_manager(&self, request: &ConnectRequest) -> Result<Self::Api, ConnectFailure> {
        let addr = match &self.addr_override {
            Some(addr) => addr.clone(),
            None => WireManager::service_addr(&request.manager_namespace, self.api_port),
        };
        // No round-trip here: reachability and compatibility are judged
        // by the version gate, under its own (shorter) timeout.
        Ok(WireManager::new(addr))
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tp_manager::FakeManager;

    /// Scriptable dialer handing out one [`FakeManager`].
    #[derive(Clone)]
    pub struct FakeDialer {
        pub manager: FakeManager,
        inner: Arc<Mutex<FakeDialerState>>,
    }

    #[derive(Default)]
    struct FakeDialerState {
        probe_failure: Option<ConnectFailure>,
        dial_failure: Option<ConnectFailure>,
    }

    impl FakeDialer {
        pub fn new(manager: FakeManager) -> Self {
            Self {
                manager,
                inner: Arc::new(Mutex::new(FakeDialerState::default())),
            }
        }

        pub fn fail_probe(&self, failure: ConnectFailure) {
            self.inner.lock().probe_failure = Some(failure);
        }

        pub fn fail_dial(&self, failure: ConnectFailure) {
            self.inner.lock().dial_failure = Some(failure);
        }

        pub fn heal(&self) {
            let mut inner = self.inner.lock();
            inner.probe_failure = None;
            inner.dial_failure = None;
        }
    }

    #[async_trait]
    impl ClusterDialer for FakeDialer {
        type Api = FakeManager;

        async fn probe_cluster(&self, _request: &ConnectRequest) -> Result<(), ConnectFailure> {
            match self.inner.lock().probe_failure.clone() {
                Some(failure) => Err(failure),
                None => Ok(()),
            }
        }

        async fn dial_manager(
            &self,
            _request: &ConnectRequest,
        ) -> Result<Self::Api, ConnectFailure> {
            match self.inner.lock().dial_failure.clone() {
                Some(failure) => Err(failure),
                None => Ok(self.manager.clone()),
            }
        }
    }
}

#[cfg(test)]
#[path = "dialer_tests.rs"]
mod tests;
