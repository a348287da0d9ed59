// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable in-memory traffic manager for tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

use tp_core::{
    Disposition, InterceptCode, InterceptError, InterceptId, InterceptInfo, InterceptSpec,
    PreviewSpec, SessionId,
};

use crate::api::{
    Arrival, ClientInfo, ClusterInfo, ManagerApi, ManagerError, PreparedIntercept, VersionInfo,
    WorkloadInfo,
};

/// Operations recorded by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerCall {
    Version,
    Arrive,
    Remain,
    Depart,
    CanIntercept(String),
    PrepareIntercept(String),
    CreateIntercept(String),
    UpdateIntercept(String),
    RemoveIntercept(String),
    WatchIntercepts,
    WatchWorkloads,
    WatchClusterInfo,
}

struct FakeState {
    calls: Vec<ManagerCall>,
    version: VersionInfo,
    version_hangs: bool,
    idle_timeout: Duration,
    arrived: Option<SessionId>,
    remain_fails: bool,
    remain_count: usize,
    can_intercept_error: Option<InterceptError>,
    create_error: Option<InterceptError>,
    pod_environment: HashMap<String, String>,
    intercepts: HashMap<String, InterceptInfo>,
    intercept_watchers: Vec<mpsc::Sender<Vec<InterceptInfo>>>,
    workloads: Vec<WorkloadInfo>,
    workload_watchers: Vec<mpsc::Sender<Vec<WorkloadInfo>>>,
    cluster_info: ClusterInfo,
    cluster_watchers: Vec<mpsc::Sender<ClusterInfo>>,
    /// Disposition newly created intercepts start in.
    initial_disposition: Disposition,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            version: VersionInfo {
                name: "traffic-manager".to_string(),
                version: "2.7.0".to_string(),
            },
            version_hangs: false,
            idle_timeout: Duration::from_secs(15),
            arrived: None,
            remain_fails: false,
            remain_count: 0,
            can_intercept_error: None,
            create_error: None,
            pod_environment: HashMap::from([(
                "POD_NAME".to_string(),
                "echo-easy-abcde".to_string(),
            )]),
            intercepts: HashMap::new(),
            intercept_watchers: Vec::new(),
            workloads: Vec::new(),
            workload_watchers: Vec::new(),
            cluster_info: ClusterInfo {
                service_subnet: Some("10.96.0.0/12".to_string()),
                pod_subnets: vec!["10.244.0.0/16".to_string()],
                cluster_domain: "cluster.local".to_string(),
            },
            cluster_watchers: Vec::new(),
            initial_disposition: Disposition::Waiting,
        }
    }
}

/// In-memory [`ManagerApi`] with scriptable dispositions and failures.
#[derive(Clone, Default)]
pub struct FakeManager {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(self, version: &str) -> Self {
        self.inner.lock().version.version = version.to_string();
        self
    }

    /// Make `version` never respond, for timeout tests.
    pub fn hang_version(self) -> Self {
        self.inner.lock().version_hangs = true;
        self
    }

    pub fn with_idle_timeout(self, idle_timeout: Duration) -> Self {
        self.inner.lock().idle_timeout = idle_timeout;
        self
    }

    pub fn with_initial_disposition(self, disposition: Disposition) -> Self {
        self.inner.lock().initial_disposition = disposition;
        self
    }

    pub fn set_remain_fails(&self, fails: bool) {
        self.inner.lock().remain_fails = fails;
    }

    pub fn reject_can_intercept(&self, error: InterceptError) {
        self.inner.lock().can_intercept_error = Some(error);
    }

    pub fn reject_create(&self, error: InterceptError) {
        self.inner.lock().create_error = Some(error);
    }

    pub fn set_pod_environment(&self, env: HashMap<String, String>) {
        self.inner.lock().pod_environment = env;
    }

    pub fn calls(&self) -> Vec<ManagerCall> {
        self.inner.lock().calls.clone()
    }

    pub fn remain_count(&self) -> usize {
        self.inner.lock().remain_count
    }

    pub fn intercept_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.lock().intercepts.keys().cloned().collect();
        names.sort();
        names
    }

    /// Drive the disposition state machine and notify watchers.
    pub fn set_disposition(&self, name: &str, disposition: Disposition, message: &str) {
        let mut state = self.inner.lock();
        if let Some(info) = state.intercepts.get_mut(name) {
            info.disposition = disposition;
            info.message = message.to_string();
        }
        broadcast_intercepts(&mut state);
    }

    /// Simulate a server-side removal (scale to zero, higher-priority client).
    pub fn drop_intercept(&self, name: &str) {
        let mut state = self.inner.lock();
        state.intercepts.remove(name);
        broadcast_intercepts(&mut state);
    }

    pub fn set_workloads(&self, workloads: Vec<WorkloadInfo>) {
        let mut state = self.inner.lock();
        state.workloads = workloads;
        let snapshot = state.workloads.clone();
        state
            .workload_watchers
            .retain(|tx| tx.try_send(snapshot.clone()).is_ok());
    }

    fn session_check(state: &FakeState, session: &SessionId) -> Result<(), ManagerError> {
        match &state.arrived {
            Some(current) if current == session => Ok(()),
            _ => Err(ManagerError::SessionInvalid),
        }
    }
}

fn broadcast_intercepts(state: &mut FakeState) {
    let mut snapshot: Vec<InterceptInfo> = state.intercepts.values().cloned().collect();
    snapshot.sort_by(|a, b| a.spec.name.cmp(&b.spec.name));
    state
        .intercept_watchers
        .retain(|tx| tx.try_send(snapshot.clone()).is_ok());
}

#[async_trait]
impl ManagerApi for FakeManager {
    async fn version(&self) -> Result<VersionInfo, ManagerError> {
        let hangs = {
            let mut state = self.inner.lock();
            state.calls.push(ManagerCall::Version);
            state.version_hangs
        };
        if hangs {
            std::future::pending::<()>().await;
        }
        Ok(self.inner.lock().version.clone())
    }

    async fn arrive(&self, _client: ClientInfo) -> Result<Arrival, ManagerError> {
        let mut state = self.inner.lock();
        state.calls.push(ManagerCall::Arrive);
        let session = SessionId(Uuid::new_v4().to_string());
        state.arrived = Some(session.clone());
        Ok(Arrival {
            session,
            idle_timeout: state.idle_timeout,
        })
    }

    async fn remain(&self, session: &SessionId) -> Result<(), ManagerError> {
        let mut state = self.inner.lock();
        state.calls.push(ManagerCall::Remain);
        Self::session_check(&state, session)?;
        state.remain_count += 1;
        if state.remain_fails {
            return Err(ManagerError::Unavailable("remain scripted to fail".into()));
        }
        Ok(())
    }

    async fn depart(&self, session: &SessionId) -> Result<(), ManagerError> {
        let mut state = self.inner.lock();
        state.calls.push(ManagerCall::Depart);
        Self::session_check(&state, session)?;
        state.arrived = None;
        state.intercepts.clear();
        broadcast_intercepts(&mut state);
        Ok(())
    }

    async fn can_intercept(
        &self,
        session: &SessionId,
        spec: &InterceptSpec,
    ) -> Result<(), ManagerError> {
        let mut state = self.inner.lock();
        state.calls.push(ManagerCall::CanIntercept(spec.name.clone()));
        Self::session_check(&state, session)?;
        if let Some(err) = state.can_intercept_error.clone() {
            return Err(err.into());
        }
        Ok(())
    }

    async fn prepare_intercept(
        &self,
        session: &SessionId,
        spec: &InterceptSpec,
    ) -> Result<PreparedIntercept, ManagerError> {
        let mut state = self.inner.lock();
        state
            .calls
            .push(ManagerCall::PrepareIntercept(spec.name.clone()));
        Self::session_check(&state, session)?;
        Ok(PreparedIntercept {
            pod_name: format!("{}-pod", spec.workload.name),
            pod_port: spec.port.local,
            environment: state.pod_environment.clone(),
        })
    }

    async fn create_intercept(
        &self,
        session: &SessionId,
        spec: &InterceptSpec,
    ) -> Result<InterceptInfo, ManagerError> {
        let mut state = self.inner.lock();
        state
            .calls
            .push(ManagerCall::CreateIntercept(spec.name.clone()));
        Self::session_check(&state, session)?;
        if let Some(err) = state.create_error.clone() {
            return Err(err.into());
        }
        if state.intercepts.contains_key(&spec.name) {
            return Err(InterceptError::new(
                InterceptCode::AlreadyExists,
                format!("intercept {} already exists", spec.name),
            )
            .into());
        }
        let info = InterceptInfo {
            id: InterceptId(Uuid::new_v4().to_string()),
            spec: spec.clone(),
            disposition: state.initial_disposition,
            message: String::new(),
            environment: state.pod_environment.clone(),
            mount_point: None,
        };
        state.intercepts.insert(spec.name.clone(), info.clone());
        broadcast_intercepts(&mut state);
        Ok(info)
    }

    async fn update_intercept(
        &self,
        session: &SessionId,
        name: &str,
        preview: Option<PreviewSpec>,
    ) -> Result<InterceptInfo, ManagerError> {
        let mut state = self.inner.lock();
        state
            .calls
            .push(ManagerCall::UpdateIntercept(name.to_string()));
        Self::session_check(&state, session)?;
        let info = state.intercepts.get_mut(name).ok_or_else(|| {
            ManagerError::from(InterceptError::new(
                InterceptCode::NotFound,
                format!("intercept {name} not found"),
            ))
        })?;
        info.spec.preview_url = preview;
        let info = info.clone();
        broadcast_intercepts(&mut state);
        Ok(info)
    }

    async fn remove_intercept(&self, session: &SessionId, name: &str) -> Result<(), ManagerError> {
        let mut state = self.inner.lock();
        state
            .calls
            .push(ManagerCall::RemoveIntercept(name.to_string()));
        Self::session_check(&state, session)?;
        if state.intercepts.remove(name).is_none() {
            return Err(InterceptError::new(
                InterceptCode::NotFound,
                format!("intercept {name} not found"),
            )
            .into());
        }
        broadcast_intercepts(&mut state);
        Ok(())
    }

    async fn watch_intercepts(
        &self,
        session: &SessionId,
    ) -> Result<mpsc::Receiver<Vec<InterceptInfo>>, ManagerError> {
        let mut state = self.inner.lock();
        state.calls.push(ManagerCall::WatchIntercepts);
        Self::session_check(&state, session)?;
        let (tx, rx) = mpsc::channel(16);
        let mut snapshot: Vec<InterceptInfo> = state.intercepts.values().cloned().collect();
        snapshot.sort_by(|a, b| a.spec.name.cmp(&b.spec.name));
        let _ = tx.try_send(snapshot);
        state.intercept_watchers.push(tx);
        Ok(rx)
    }

    async fn watch_workloads(
        &self,
        session: &SessionId,
    ) -> Result<mpsc::Receiver<Vec<WorkloadInfo>>, ManagerError> {
        let mut state = self.inner.lock();
        state.calls.push(ManagerCall::WatchWorkloads);
        Self::session_check(&state, session)?;
        let (tx, rx) = mpsc::channel(16);
        let _ = tx.try_send(state.workloads.clone());
        state.workload_watchers.push(tx);
        Ok(rx)
    }

    async fn watch_cluster_info(
        &self,
        session: &SessionId,
    ) -> Result<mpsc::Receiver<ClusterInfo>, ManagerError> {
        let mut state = self.inner.lock();
        state.calls.push(ManagerCall::WatchClusterInfo);
        Self::session_check(&state, session)?;
        let (tx, rx) = mpsc::channel(16);
        let _ = tx.try_send(state.cluster_info.clone());
        state.cluster_watchers.push(tx);
        Ok(rx)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
