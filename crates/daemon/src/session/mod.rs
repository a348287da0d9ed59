// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The session orchestrator.
//!
//! Single-flight owner of the one session: an internal coroutine reads
//! commands from a channel and owns all session mutation, so callers
//! never race on the session field. The observable snapshot lives under
//! a read/write lock that only this coroutine writes.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use tp_adapters::MountBridge;
use tp_config::TimeoutId;
use tp_core::{
    Cancel, ConnectCode, ConnectRequest, Failure, InterceptInfo, InterceptSpec, SessionId,
    SessionInfo,
};
use tp_ipc::{ConnectionState, DnsSpec, ManagerInfo};
use tp_manager::{
    spawn_watch, ClientInfo, ClusterInfo, ManagerApi, SessionEvent, SessionKeeper, VersionInfo,
    WorkloadInfo,
};

use crate::dialer::{ClusterDialer, ConnectFailure, ManagerInstaller};
use crate::intercept::InterceptManager;
use crate::rootd::RootClient;

/// Drain window watchers get before their tasks are aborted.
const SOFT_SHUTDOWN: Duration = Duration::from_secs(2);

/// Bound on the depart RPC during teardown.
const DEPART_TIMEOUT: Duration = Duration::from_secs(5);

/// What a Connect returns.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectResult {
    pub code: ConnectCode,
    pub message: String,
    pub session: Option<SessionInfo>,
}

impl ConnectResult {
    fn ok(session: SessionInfo) -> Self {
        Self {
            code: ConnectCode::Unspecified,
            message: String::new(),
            session: Some(session),
        }
    }

    fn already_connected(session: SessionInfo) -> Self {
        Self {
            code: ConnectCode::AlreadyConnected,
            message: String::new(),
            session: Some(session),
        }
    }

    fn failed(code: ConnectCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            session: None,
        }
    }
}

/// Read-only view assembled for Status.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub state: ConnectionState,
    pub session: Option<SessionInfo>,
    pub manager: Option<ManagerInfo>,
    pub intercepts: Vec<InterceptInfo>,
    pub mapped_namespaces: Vec<String>,
}

/// Everything the orchestrator needs injected.
pub struct OrchestratorDeps<D, B, I> {
    pub dialer: D,
    pub installer: I,
    pub bridge: B,
    pub root: RootClient,
    pub client_version: String,
    pub install_id: String,
}

enum Command {
    Connect {
        request: ConnectRequest,
        reply: oneshot::Sender<ConnectResult>,
    },
    Disconnect {
        reply: oneshot::Sender<Result<(), Failure>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    CreateIntercept {
        spec: InterceptSpec,
        reply: oneshot::Sender<Result<InterceptInfo, Failure>>,
    },
    RemoveIntercept {
        name: String,
        reply: oneshot::Sender<Result<(), Failure>>,
    },
    MarkContainer {
        name: String,
        container: String,
    },
    Quit {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle to the orchestrator coroutine.
#[derive(Clone)]
pub struct OrchestratorHandle {
    tx: mpsc::Sender<Command>,
    session_view: Arc<RwLock<Option<SessionInfo>>>,
    state_view: Arc<RwLock<ConnectionState>>,
}

impl OrchestratorHandle {
    /// At most one session is ever observable here.
    pub fn session(&self) -> Option<SessionInfo> {
        self.session_view.read().clone()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_view.read()
    }

    pub async fn connect(&self, request: ConnectRequest) -> ConnectResult {
        match self
            .round_trip(|reply| Command::Connect { request, reply })
            .await
        {
            Some(result) => result,
            None => ConnectResult::failed(ConnectCode::DaemonFailed, "connector is shutting down"),
        }
    }

    pub async fn disconnect(&self) -> Result<(), Failure> {
        self.round_trip(|reply| Command::Disconnect { reply })
            .await
            .unwrap_or_else(|| Err(Failure::new("connector is shutting down")))
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.round_trip(|reply| Command::Snapshot { reply })
            .await
            .unwrap_or_default()
    }

    pub async fn create_intercept(&self, spec: InterceptSpec) -> Result<InterceptInfo, Failure> {
        self.round_trip(|reply| Command::CreateIntercept { spec, reply })
            .await
            .unwrap_or_else(|| Err(Failure::new("connector is shutting down")))
    }

    pub async fn remove_intercept(&self, name: String) -> Result<(), Failure> {
        self.round_trip(|reply| Command::RemoveIntercept { name, reply })
            .await
            .unwrap_or_else(|| Err(Failure::new("connector is shutting down")))
    }

    pub fn mark_container(&self, name: String, container: String) {
        let _ = self.tx.try_send(Command::MarkContainer { name, container });
    }

    /// Disconnect (if needed) and stop the coroutine.
    pub async fn quit(&self) {
        let _ = self.round_trip(|reply| Command::Quit { reply }).await;
    }

    async fn round_trip<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Option<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send(make(reply_tx)).await.is_err() {
            return None;
        }
        reply_rx.await.ok()
    }
}

/// Factory for the orchestrator coroutine.
pub struct Orchestrator;

impl Orchestrator {
    pub fn spawn<D, B, I>(deps: OrchestratorDeps<D, B, I>) -> OrchestratorHandle
    where
        D: ClusterDialer,
        B: MountBridge,
        I: ManagerInstaller,
    {
        let (tx, rx) = mpsc::channel(16);
        let session_view = Arc::new(RwLock::new(None));
        let state_view = Arc::new(RwLock::new(ConnectionState::Disconnected));
        tokio::spawn(run_loop(
            deps,
            rx,
            Arc::clone(&session_view),
            Arc::clone(&state_view),
        ));
        OrchestratorHandle {
            tx,
            session_view,
            state_view,
        }
    }
}

/// A fully established session and its satellite tasks.
struct Active<M: ManagerApi, B: MountBridge> {
    request: ConnectRequest,
    info: SessionInfo,
    api: M,
    manager_version: VersionInfo,
    cancel: Cancel,
    intercepts: Arc<InterceptManager<M, B>>,
    // Satellite channels are dropped to None when their sender goes
    // away, so a dead channel degrades to pending() instead of being
    // re-polled on every loop iteration.
    keeper_rx: Option<mpsc::Receiver<SessionEvent>>,
    intercept_watch_rx: Option<mpsc::Receiver<Vec<InterceptInfo>>>,
    workload_watch_rx: Option<mpsc::Receiver<Vec<WorkloadInfo>>>,
    cluster_watch_rx: Option<mpsc::Receiver<ClusterInfo>>,
    watch_tasks: Vec<tokio::task::JoinHandle<()>>,
}

async fn run_loop<D, B, I>(
    deps: OrchestratorDeps<D, B, I>,
    mut rx: mpsc::Receiver<Command>,
    session_view: Arc<RwLock<Option<SessionInfo>>>,
    state_view: Arc<RwLock<ConnectionState>>,
) where
    D: ClusterDialer,
    B: MountBridge,
    I: ManagerInstaller,
{
    let mut active: Option<Active<D::Api, B>> = None;

    let set_state = |state: ConnectionState| {
        *state_view.write() = state;
    };
    let set_session = |session: Option<SessionInfo>| {
        *session_view.write() = session;
    };

    loop {
        tokio::select! {
            command = rx.recv() => {
                let Some(command) = command else { break };
                match command {
                    Command::Connect { request, reply } => {
                        let result = handle_connect(&deps, &mut active, request, &set_state).await;
                        set_session(active.as_ref().map(|a| a.info.clone()));
                        let _ = reply.send(result);
                    }

                    Command::Disconnect { reply } => {
                        let result = match active.take() {
                            Some(session) => {
                                teardown(&deps, session).await;
                                set_state(ConnectionState::Disconnected);
                                Ok(())
                            }
                            None => Err(Failure::user("not connected")),
                        };
                        set_session(None);
                        let _ = reply.send(result);
                    }

                    Command::Snapshot { reply } => {
                        let snapshot = match &active {
                            Some(a) => SessionSnapshot {
                                state: *state_view.read(),
                                session: Some(a.info.clone()),
                                manager: Some(ManagerInfo {
                                    name: a.manager_version.name.clone(),
                                    version: a.manager_version.version.clone(),
                                }),
                                intercepts: a.intercepts.list(),
                                mapped_namespaces: a.info.mapped_namespaces.clone(),
                            },
                            None => SessionSnapshot {
                                state: *state_view.read(),
                                ..SessionSnapshot::default()
                            },
                        };
                        let _ = reply.send(snapshot);
                    }

                    Command::CreateIntercept { spec, reply } => {
                        let result = match &active {
                            Some(a) => a.intercepts.create(spec).await,
                            None => Err(Failure::user("not connected")),
                        };
                        let _ = reply.send(result);
                    }

                    Command::RemoveIntercept { name, reply } => {
                        let result = match &active {
                            Some(a) => a.intercepts.remove(&name).await,
                            None => Err(Failure::user("not connected")),
                        };
                        let _ = reply.send(result);
                    }

                    Command::MarkContainer { name, container } => {
                        if let Some(a) = &active {
                            a.intercepts.set_container(&name, container);
                        }
                    }

                    Command::Quit { reply } => {
                        if let Some(session) = active.take() {
                            teardown(&deps, session).await;
                        }
                        set_state(ConnectionState::Disconnected);
                        set_session(None);
                        let _ = reply.send(());
                        break;
                    }
                }
            }

            event = next_session_event(&mut active) => {
                match event {
                    SessionPoll::Keeper(SessionEvent::Invalidated) => {
                        warn!("session invalidated, reconnecting");
                        set_state(ConnectionState::Reconnecting);
                        let Some(dead) = active.take() else { continue };
                        let request = dead.request.clone();
                        teardown(&deps, dead).await;
                        match establish(&deps, request).await {
                            Ok(session) => {
                                set_session(Some(session.info.clone()));
                                active = Some(session);
                                set_state(ConnectionState::Connected);
                                info!("session re-established");
                            }
                            Err(failure) => {
                                set_session(None);
                                set_state(ConnectionState::Failed);
                                warn!(error = %failure.message, "reconnect failed");
                            }
                        }
                    }

                    SessionPoll::Intercepts(snapshot) => {
                        if let Some(a) = &active {
                            let dropped = a.intercepts.apply_snapshot(snapshot);
                            for name in dropped {
                                debug!(name, "intercept pruned from table");
                            }
                        }
                    }

                    SessionPoll::Workloads(workloads) => {
                        debug!(count = workloads.len(), "workload snapshot received");
                    }

                    SessionPoll::Cluster(cluster) => {
                        let mut subnets = cluster.pod_subnets.clone();
                        if let Some(svc) = &cluster.service_subnet {
                            subnets.push(svc.clone());
                        }
                        if let Err(e) = deps.root.add_subnets(subnets).await {
                            warn!(error = %e, "failed to route cluster subnets");
                        }
                    }
                }
            }
        }
    }

    // Channel closed without Quit: tear down anyway.
    if let Some(session) = active.take() {
        teardown(&deps, session).await;
    }
}

/// One event from whichever satellite task of the session speaks first.
enum SessionPoll {
    Keeper(SessionEvent),
    Intercepts(Vec<InterceptInfo>),
    Workloads(Vec<WorkloadInfo>),
    Cluster(ClusterInfo),
}

async fn next_session_event<M: ManagerApi, B: MountBridge>(
    active: &mut Option<Active<M, B>>,
) -> SessionPoll {
    let Some(a) = active else {
        return std::future::pending().await;
    };
    loop {
        tokio::select! {
            event = recv_or_pending(&mut a.keeper_rx) => match event {
                Some(event) => return SessionPoll::Keeper(event),
                None => {
                    debug!("keeper channel closed");
                    a.keeper_rx = None;
                }
            },
            snapshot = recv_or_pending(&mut a.intercept_watch_rx) => match snapshot {
                Some(snapshot) => return SessionPoll::Intercepts(snapshot),
                None => {
                    debug!("intercept watch channel closed");
                    a.intercept_watch_rx = None;
                }
            },
            workloads = recv_or_pending(&mut a.workload_watch_rx) => match workloads {
                Some(workloads) => return SessionPoll::Workloads(workloads),
                None => {
                    debug!("workload watch channel closed");
                    a.workload_watch_rx = None;
                }
            },
            cluster = recv_or_pending(&mut a.cluster_watch_rx) => match cluster {
                Some(cluster) => return SessionPoll::Cluster(cluster),
                None => {
                    debug!("cluster-info watch channel closed");
                    a.cluster_watch_rx = None;
                }
            },
        }
    }
}

/// Receive from a channel that may already be gone; a missing channel
/// never resolves.
async fn recv_or_pending<T>(rx: &mut Option<mpsc::Receiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn handle_connect<D, B, I>(
    deps: &OrchestratorDeps<D, B, I>,
    active: &mut Option<Active<D::Api, B>>,
    request: ConnectRequest,
    set_state: &impl Fn(ConnectionState),
) -> ConnectResult
where
    D: ClusterDialer,
    B: MountBridge,
    I: ManagerInstaller,
{
    if let Some(current) = active {
        return if current.request.matches(&request) {
            ConnectResult::already_connected(current.info.clone())
        } else {
            ConnectResult::failed(
                ConnectCode::ContextMismatch,
                format!(
                    "already connected to context {}, namespace {}; disconnect first",
                    current.request.context, current.info.manager_namespace
                ),
            )
        };
    }

    set_state(ConnectionState::Connecting);
    match establish(deps, request).await {
        Ok(session) => {
            let info = session.info.clone();
            *active = Some(session);
            set_state(ConnectionState::Connected);
            info!(session = %info.id, context = %info.context, "connected");
            ConnectResult::ok(info)
        }
        Err(failure) => {
            set_state(ConnectionState::Failed);
            ConnectResult::failed(failure.code, failure.message)
        }
    }
}

/// The connect pipeline. Any step's failure tears down prior steps in
/// reverse before returning.
async fn establish<D, B, I>(
    deps: &OrchestratorDeps<D, B, I>,
    request: ConnectRequest,
) -> Result<Active<D::Api, B>, ConnectFailure>
where
    D: ClusterDialer,
    B: MountBridge,
    I: ManagerInstaller,
{
    let config = tp_config::current();

    // 1. Cluster config + reachability.
    config
        .bounded(TimeoutId::ClusterConnect, deps.dialer.probe_cluster(&request))
        .await
        .map_err(|t| ConnectFailure::new(ConnectCode::ClusterUnreachable, t.to_string()))??;

    // 2. Traffic manager presence (opaque install RPC).
    config
        .bounded(TimeoutId::Helm, deps.installer.ensure(&request))
        .await
        .map_err(|t| ConnectFailure::new(ConnectCode::ManagerUnreachable, t.to_string()))??;

    // 3. Virtual network, keyed by a connection id of our own: the
    //    manager session does not exist yet.
    let connection_id = Uuid::new_v4().to_string();
    let dns = DnsSpec {
        include_suffixes: config.dns.include_suffixes.clone(),
        exclude_suffixes: config.dns.exclude_suffixes.clone(),
        local_address: config.dns.local_address.clone(),
    };
    deps.root
        .open_network(
            &connection_id,
            dns,
            config.routing.also_proxy.clone(),
            config.routing.never_proxy.clone(),
            config.routing.allow_conflicting.clone(),
        )
        .await
        .map_err(|e| ConnectFailure::new(ConnectCode::DaemonFailed, e.to_string()))?;

    let result = establish_manager(deps, &request, &config).await;
    match result {
        Ok(active) => Ok(active),
        Err(failure) => {
            // Reverse teardown of step 3.
            if let Err(e) = deps.root.close_network().await {
                warn!(error = %e, "failed to close network after connect failure");
            }
            Err(failure)
        }
    }
}

async fn establish_manager<D, B, I>(
    deps: &OrchestratorDeps<D, B, I>,
    request: &ConnectRequest,
    config: &tp_config::ClientConfig,
) -> Result<Active<D::Api, B>, ConnectFailure>
where
    D: ClusterDialer,
    B: MountBridge,
    I: ManagerInstaller,
{
    // 4. Dial the manager through the virtual network.
    let api = config
        .bounded(
            TimeoutId::TrafficManagerConnect,
            deps.dialer.dial_manager(request),
        )
        .await
        .map_err(|t| ConnectFailure::new(ConnectCode::ManagerUnreachable, t.to_string()))??;

    // 5. Version gate, under the shorter API timeout.
    let manager_version = config
        .bounded(TimeoutId::TrafficManagerApi, api.version())
        .await
        .map_err(|t| ConnectFailure::new(ConnectCode::ManagerUnreachable, t.to_string()))?
        .map_err(|e| ConnectFailure::new(ConnectCode::ManagerUnreachable, e.to_string()))?;
    if !manager_version.compatible() {
        return Err(ConnectFailure::new(
            ConnectCode::VersionMismatch,
            format!(
                "traffic manager version {} is not compatible with this client",
                manager_version.version
            ),
        ));
    }

    // 6. Arrive.
    let arrival = config
        .bounded(
            TimeoutId::TrafficManagerApi,
            api.arrive(ClientInfo {
                name: client_name(),
                install_id: deps.install_id.clone(),
                version: deps.client_version.clone(),
            }),
        )
        .await
        .map_err(|t| ConnectFailure::new(ConnectCode::ManagerUnreachable, t.to_string()))?
        .map_err(|e| ConnectFailure::new(ConnectCode::ManagerUnreachable, e.to_string()))?;

    let mapped_namespaces = if request.mapped_namespaces.is_empty() {
        config.cluster.mapped_namespaces.clone()
    } else {
        request.mapped_namespaces.clone()
    };

    let info = SessionInfo {
        id: arrival.session.clone(),
        context: request.context.clone(),
        manager_namespace: request.manager_namespace.clone(),
        client_version: deps.client_version.clone(),
        manager_version: manager_version.version.clone(),
        mapped_namespaces,
    };

    // 7. Keep-alive and watches, all hanging off one session cancel.
    let cancel = Cancel::new();
    let keeper_rx = SessionKeeper::spawn(
        api.clone(),
        arrival.session.clone(),
        arrival.idle_timeout,
        cancel.clone(),
    );

    let (watch_tasks, intercept_watch_rx, workload_watch_rx, cluster_watch_rx) =
        spawn_watches(api.clone(), arrival.session.clone(), cancel.clone());

    let intercepts = Arc::new(InterceptManager::new(
        api.clone(),
        arrival.session,
        deps.bridge.clone(),
    ));

    Ok(Active {
        request: request.clone(),
        info,
        api,
        manager_version,
        cancel,
        intercepts,
        keeper_rx: Some(keeper_rx),
        intercept_watch_rx: Some(intercept_watch_rx),
        workload_watch_rx: Some(workload_watch_rx),
        cluster_watch_rx: Some(cluster_watch_rx),
        watch_tasks,
    })
}

type WatchChannels = (
    Vec<tokio::task::JoinHandle<()>>,
    mpsc::Receiver<Vec<InterceptInfo>>,
    mpsc::Receiver<Vec<WorkloadInfo>>,
    mpsc::Receiver<ClusterInfo>,
);

fn spawn_watches<M: ManagerApi>(api: M, session: SessionId, cancel: Cancel) -> WatchChannels {
    let (intercept_tx, intercept_rx) = mpsc::channel(16);
    let (workload_tx, workload_rx) = mpsc::channel(16);
    let (cluster_tx, cluster_rx) = mpsc::channel(16);

    let api_i = api.clone();
    let session_i = session.clone();
    let intercept_task = spawn_watch(
        "intercepts",
        move || {
            let api = api_i.clone();
            let session = session_i.clone();
            async move { api.watch_intercepts(&session).await }
        },
        intercept_tx,
        cancel.clone(),
    );

    let api_w = api.clone();
    let session_w = session.clone();
    let workload_task = spawn_watch(
        "workloads",
        move || {
            let api = api_w.clone();
            let session = session_w.clone();
            async move { api.watch_workloads(&session).await }
        },
        workload_tx,
        cancel.clone(),
    );

    let cluster_task = spawn_watch(
        "cluster-info",
        move || {
            let api = api.clone();
            let session = session.clone();
            async move { api.watch_cluster_info(&session).await }
        },
        cluster_tx,
        cancel,
    );

    (
        vec![intercept_task, workload_task, cluster_task],
        intercept_rx,
        workload_rx,
        cluster_rx,
    )
}

/// Tear a session down in reverse establishment order.
async fn teardown<D, B, I>(deps: &OrchestratorDeps<D, B, I>, session: Active<D::Api, B>)
where
    D: ClusterDialer,
    B: MountBridge,
    I: ManagerInstaller,
{
    let Active {
        info,
        api,
        cancel,
        intercepts,
        watch_tasks,
        ..
    } = session;

    // Every created intercept gets its Remove no later than now.
    intercepts.close().await;

    // Soft shutdown: let watchers drain, then cancel hard.
    cancel.cancel();
    let drain = futures_drain(watch_tasks);
    if tokio::time::timeout(SOFT_SHUTDOWN, drain).await.is_err() {
        debug!("watchers did not drain in time, aborted");
    }

    if let Err(e) = tokio::time::timeout(DEPART_TIMEOUT, api.depart(&info.id)).await {
        debug!(error = %e, "depart timed out");
    }

    if let Err(e) = deps.root.close_network().await {
        warn!(error = %e, "failed to close the virtual network");
    }

    info!(session = %info.id, "session torn down");
}

/// Await all tasks, aborting whatever is still running when dropped.
async fn futures_drain(tasks: Vec<tokio::task::JoinHandle<()>>) {
    struct AbortOnDrop(Vec<tokio::task::JoinHandle<()>>);
    impl Drop for AbortOnDrop {
        fn drop(&mut self) {
            for task in &self.0 {
                task.abort();
            }
        }
    }
    let guard = AbortOnDrop(tasks);
    for task in &guard.0 {
        // JoinHandle is not consumed here; poll via abort-safe wait.
        while !task.is_finished() {
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }
}

fn client_name() -> String {
    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
    format!("{user}@{host}")
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
