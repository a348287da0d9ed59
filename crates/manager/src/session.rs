// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session keep-alive.
//!
//! The manager drops sessions idle longer than its advertised timeout,
//! so the keeper pings at a third of that period. A single failed ping
//! is routine (logged at debug, retried on the next tick); pings failing
//! for longer than the idle timeout invalidate the session.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use tp_core::{Cancel, SessionId};

use crate::api::ManagerApi;

/// Floor for the remain period.
const MIN_REMAIN_PERIOD: Duration = Duration::from_secs(1);

/// What the keeper reports to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Pings have failed past the idle timeout; reconnect or tear down.
    Invalidated,
}

/// Runs the remain loop for one session.
pub struct SessionKeeper;

impl SessionKeeper {
    /// Derive the ping period from the manager's idle timeout.
    pub fn remain_period(idle_timeout: Duration) -> Duration {
        (idle_timeout / 3).max(MIN_REMAIN_PERIOD)
    }

    /// Spawn the keep-alive loop; events arrive on the returned channel.
    pub fn spawn<M: ManagerApi>(
        api: M,
        session: SessionId,
        idle_timeout: Duration,
        cancel: Cancel,
    ) -> mpsc::Receiver<SessionEvent> {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(run(api, session, idle_timeout, cancel, tx));
        rx
    }
}

async fn run<M: ManagerApi>(
    api: M,
    session: SessionId,
    idle_timeout: Duration,
    cancel: Cancel,
    tx: mpsc::Sender<SessionEvent>,
) {
    let period = SessionKeeper::remain_period(idle_timeout);
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick fires immediately; skip it, we just arrived.
    ticker.tick().await;

    let mut last_success = Instant::now();
    info!(session = %session, period_secs = period.as_secs_f64(), "session keeper running");

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            () = cancel.cancelled() => {
                debug!(session = %session, "session keeper stopped");
                return;
            }
        }

        match api.remain(&session).await {
            Ok(()) => {
                last_success = Instant::now();
            }
            Err(e) => {
                let silent_for = Instant::now().duration_since(last_success);
                if silent_for > idle_timeout {
                    warn!(session = %session, error = %e, "session invalidated by missed pings");
                    let _ = tx.send(SessionEvent::Invalidated).await;
                    return;
                }
                debug!(session = %session, error = %e, "remain ping failed, will retry");
            }
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
