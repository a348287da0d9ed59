// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The ensured-state combinator: acquire, run, release.
//!
//! Every operation that mutates cluster or local state flows through
//! [`ensured`]. Once the prologue reports the state as acquired, the
//! epilogue runs exactly once, whether the action succeeds, fails, or is
//! cancelled. It runs detached from the caller's cancellation, bounded
//! by [`EPILOG_DEADLINE`], so cleanup RPCs still succeed after a Ctrl-C.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Notify;

/// Deadline for the detached epilogue.
pub const EPILOG_DEADLINE: Duration = Duration::from_secs(10);

/// Clone-able cancellation signal.
///
/// Late subscribers observe a cancel that happened before they subscribed.
#[derive(Clone, Default)]
pub struct Cancel(Arc<CancelInner>);

#[derive(Default)]
struct CancelInner {
    notify: Notify,
    cancelled: AtomicBool,
}

impl Cancel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal. Idempotent.
    pub fn cancel(&self) {
        self.0.cancelled.store(true, Ordering::SeqCst);
        self.0.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve when the signal fires (immediately if it already has).
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent cancel()
            // between check and await cannot be missed.
            let notified = self.0.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl std::fmt::Debug for Cancel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cancel")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Errors from [`ensured`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnsureError {
    #[error("{0}")]
    Prolog(String),

    /// Action and epilogue failures, concatenated action-first.
    #[error("{}", format_run(.action, .epilog))]
    Run {
        action: Option<String>,
        epilog: Option<String>,
    },
}

fn format_run(action: &Option<String>, epilog: &Option<String>) -> String {
    match (action, epilog) {
        (Some(a), Some(e)) => format!("{a}; {e}"),
        (Some(a), None) => a.clone(),
        (None, Some(e)) => e.clone(),
        (None, None) => String::new(),
    }
}

/// Run `prolog`, then `action`, then (if the prologue acquired anything)
/// `epilog`, exactly once, even if the action fails or `cancel` fires.
///
/// The epilogue runs inside a spawned task so it also completes when the
/// composed future is dropped while the epilogue is in flight; a drop
/// guard covers a drop during the action.
pub async fn ensured<PF, AF, E, EF>(
    cancel: &Cancel,
    prolog: PF,
    action: AF,
    epilog: E,
) -> Result<(), EnsureError>
where
    PF: Future<Output = Result<bool, String>>,
    AF: Future<Output = Result<(), String>>,
    E: FnOnce() -> EF + Send + 'static,
    EF: Future<Output = Result<(), String>> + Send + 'static,
{
    let acquired = prolog.await.map_err(EnsureError::Prolog)?;
    if !acquired {
        return Ok(());
    }

    let mut guard = EpilogGuard { epilog: Some(epilog) };

    let action_err = tokio::select! {
        result = action => result.err(),
        () = cancel.cancelled() => Some("cancelled".to_string()),
    };

    let epilog_err = match guard.epilog.take() {
        Some(ep) => run_epilog(ep).await,
        None => None,
    };

    if action_err.is_none() && epilog_err.is_none() {
        Ok(())
    } else {
        Err(EnsureError::Run {
            action: action_err,
            epilog: epilog_err,
        })
    }
}

async fn run_epilog<E, EF>(epilog: E) -> Option<String>
where
    E: FnOnce() -> EF + Send + 'static,
    EF: Future<Output = Result<(), String>> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        match tokio::time::timeout(EPILOG_DEADLINE, epilog()).await {
            Ok(result) => result.err(),
            Err(_) => Some(format!(
                "cleanup timed out after {}s",
                EPILOG_DEADLINE.as_secs()
            )),
        }
    });
    match handle.await {
        Ok(err) => err,
        Err(join) => Some(format!("cleanup task failed: {join}")),
    }
}

/// Spawns the epilogue if the composed future is dropped mid-action.
struct EpilogGuard<E, EF>
where
    E: FnOnce() -> EF + Send + 'static,
    EF: Future<Output = Result<(), String>> + Send + 'static,
{
    epilog: Option<E>,
}

impl<E, EF> Drop for EpilogGuard<E, EF>
where
    E: FnOnce() -> EF + Send + 'static,
    EF: Future<Output = Result<(), String>> + Send + 'static,
{
    fn drop(&mut self) {
        if let Some(epilog) = self.epilog.take() {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    let _ = tokio::time::timeout(EPILOG_DEADLINE, epilog()).await;
                });
            }
        }
    }
}

#[cfg(test)]
#[path = "ensure_tests.rs"]
mod tests;
