// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The monitored-resource supervisor.
//!
//! Wraps a launchable subprocess plus user-supplied `check` and `quit`
//! hooks in a single loop that alternates between draining a task queue
//! and firing the health check. Every long-running cluster-facing
//! subprocess (manager port-forward, DNS helper, mount bridge) gets the
//! same failure semantics from this one primitive.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::launcher::{Launchable, Running};

/// Health-check cadence.
pub const CHECK_INTERVAL: Duration = Duration::from_secs(3);

/// How long Close waits for a terminated subprocess before SIGKILL.
const CLOSE_GRACE: Duration = Duration::from_secs(5);

type HookFuture = Pin<Box<dyn Future<Output = Result<(), String>> + Send>>;

/// Async hook: health check or polite-quit override.
pub type Hook = Arc<dyn Fn() -> HookFuture + Send + Sync>;

/// What to supervise.
pub struct ResourceSpec<L: Launchable> {
    pub name: String,
    pub launcher: L,
    /// Health check fired every [`CHECK_INTERVAL`].
    pub check: Hook,
    /// Polite stop; defaults to terminating the subprocess.
    pub quit: Option<Hook>,
    /// Window after launch in which a failing check never kills.
    pub start_grace: Duration,
}

/// Supervisor state snapshot, readable for status reporting.
#[derive(Debug, Clone)]
pub struct ResourceState {
    pub name: String,
    /// Last check outcome.
    pub okay: bool,
    pub started_at: Option<Instant>,
    /// When `okay` last flipped.
    pub transitioned_at: Option<Instant>,
    pub restarts: u32,
    pub quitting: bool,
    pub done: bool,
}

impl ResourceState {
    fn new(name: String) -> Self {
        Self {
            name,
            okay: false,
            started_at: None,
            transitioned_at: None,
            restarts: 0,
            quitting: false,
            done: false,
        }
    }
}

type Task = Box<dyn FnOnce() + Send>;

/// Handle to a running supervisor loop.
pub struct SupervisorHandle {
    task_tx: mpsc::Sender<Task>,
    close_tx: Option<oneshot::Sender<()>>,
    state: Arc<Mutex<ResourceState>>,
    join: tokio::task::JoinHandle<()>,
}

impl SupervisorHandle {
    /// Submit a closure to run on the supervisor loop.
    pub fn submit(&self, task: impl FnOnce() + Send + 'static) -> Result<(), String> {
        self.task_tx
            .try_send(Box::new(task))
            .map_err(|_| "supervisor task queue closed".to_string())
    }

    /// Snapshot of the loop's state.
    pub fn state(&self) -> ResourceState {
        self.state.lock().clone()
    }

    /// Set quitting, stop the subprocess, and wait for the loop to finish.
    pub async fn close(mut self) {
        if let Some(tx) = self.close_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.join.await;
    }
}

/// The supervisor itself; construct with [`Supervisor::spawn`].
pub struct Supervisor;

impl Supervisor {
    /// Launch the resource and start the supervision loop.
    pub fn spawn<L: Launchable>(spec: ResourceSpec<L>) -> SupervisorHandle {
        let state = Arc::new(Mutex::new(ResourceState::new(spec.name.clone())));
        let (task_tx, task_rx) = mpsc::channel(32);
        let (close_tx, close_rx) = oneshot::channel();

        let join = tokio::spawn(run_loop(spec, Arc::clone(&state), task_rx, close_rx));

        SupervisorHandle {
            task_tx,
            close_tx: Some(close_tx),
            state,
            join,
        }
    }
}

async fn run_loop<L: Launchable>(
    mut spec: ResourceSpec<L>,
    state: Arc<Mutex<ResourceState>>,
    mut task_rx: mpsc::Receiver<Task>,
    mut close_rx: oneshot::Receiver<()>,
) {
    let mut child: Option<Box<dyn Running>> = None;
    launch(&mut spec, &state, &mut child).await;

    let mut ticker = tokio::time::interval(CHECK_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            Some(task) = task_rx.recv() => {
                task();
            }

            exit = wait_for_exit(&mut child) => {
                let name = state.lock().name.clone();
                warn!(resource = %name, exit_code = ?exit, "subprocess exited unexpectedly, relaunching");
                child = None;
                {
                    let mut st = state.lock();
                    st.okay = false;
                    st.transitioned_at = Some(Instant::now());
                    st.restarts += 1;
                }
                launch(&mut spec, &state, &mut child).await;
            }

            _ = ticker.tick() => {
                run_check(&spec, &state, child.as_deref()).await;
            }

            _ = &mut close_rx => {
                break;
            }
        }
    }

    shutdown(&spec, &state, &mut child).await;
    state.lock().done = true;
}

/// Resolve when the current subprocess exits; pend while there is none.
async fn wait_for_exit(child: &mut Option<Box<dyn Running>>) -> Option<i32> {
    match child {
        Some(c) => c.exit_rx().await.ok().flatten(),
        None => std::future::pending().await,
    }
}

async fn launch<L: Launchable>(
    spec: &mut ResourceSpec<L>,
    state: &Arc<Mutex<ResourceState>>,
    child: &mut Option<Box<dyn Running>>,
) {
    match spec.launcher.launch().await {
        Ok(running) => {
            info!(resource = %spec.name, pid = ?running.id(), "resource launched");
            *child = Some(running);
            let mut st = state.lock();
            st.started_at = Some(Instant::now());
            st.okay = true;
            st.transitioned_at = Some(Instant::now());
        }
        Err(e) => {
            warn!(resource = %spec.name, error = %e, "launch failed");
            let mut st = state.lock();
            st.okay = false;
            st.transitioned_at = Some(Instant::now());
        }
    }
}

async fn run_check<L: Launchable>(
    spec: &ResourceSpec<L>,
    state: &Arc<Mutex<ResourceState>>,
    child: Option<&dyn Running>,
) {
    let result = (spec.check)().await;
    let now = Instant::now();
    match result {
        Ok(()) => {
            let mut st = state.lock();
            if !st.okay {
                st.okay = true;
                st.transitioned_at = Some(now);
            }
        }
        Err(e) => {
            let (within_grace, first_failure) = {
                let mut st = state.lock();
                let first = st.okay;
                if st.okay {
                    st.okay = false;
                    st.transitioned_at = Some(now);
                }
                let within = st
                    .started_at
                    .is_none_or(|t| now.duration_since(t) <= spec.start_grace);
                (within, first)
            };
            if within_grace {
                // Still booting: record the failure, never kill.
                debug!(resource = %spec.name, error = %e, "check failed within start grace");
            } else if let Some(c) = child {
                if first_failure {
                    warn!(resource = %spec.name, error = %e, "check failed, terminating subprocess");
                }
                c.terminate();
            }
        }
    }
}

async fn shutdown<L: Launchable>(
    spec: &ResourceSpec<L>,
    state: &Arc<Mutex<ResourceState>>,
    child: &mut Option<Box<dyn Running>>,
) {
    state.lock().quitting = true;

    if let Some(quit) = &spec.quit {
        if let Err(e) = quit().await {
            warn!(resource = %spec.name, error = %e, "quit hook failed");
        }
    }

    if let Some(c) = child.as_deref() {
        c.terminate();
    }
    if let Some(c) = child.as_mut() {
        match tokio::time::timeout(CLOSE_GRACE, c.exit_rx()).await {
            Ok(_) => debug!(resource = %spec.name, "subprocess stopped"),
            Err(_) => {
                warn!(resource = %spec.name, "subprocess ignored SIGTERM, killing");
                c.kill();
                let _ = tokio::time::timeout(CLOSE_GRACE, c.exit_rx()).await;
            }
        }
    }
    *child = None;
    info!(resource = %spec.name, "supervisor loop finished");
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
