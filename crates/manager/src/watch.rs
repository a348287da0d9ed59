// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watch-stream supervision.
//!
//! Each watch topic reconnects independently: exponential backoff from
//! 100 ms capped at 3 s, reset by any successful message. Items flow to
//! the consumer through one channel that survives reconnects.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use tp_core::Cancel;

use crate::api::ManagerError;

pub const BACKOFF_INITIAL: Duration = Duration::from_millis(100);
pub const BACKOFF_MAX: Duration = Duration::from_secs(3);

/// Supervise one watch topic until cancelled.
///
/// `open` performs a single subscription attempt and yields the stream's
/// receiver; when that stream ends (server close, error) a new attempt
/// is made after the current backoff delay.
pub fn spawn_watch<T, F, Fut>(
    topic: &'static str,
    open: F,
    out: mpsc::Sender<T>,
    cancel: Cancel,
) -> tokio::task::JoinHandle<()>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<mpsc::Receiver<T>, ManagerError>> + Send,
{
    tokio::spawn(async move {
        let mut backoff = BACKOFF_INITIAL;
        loop {
            if cancel.is_cancelled() {
                return;
            }
            match open().await {
                Ok(mut stream) => loop {
                    tokio::select! {
                        item = stream.recv() => match item {
                            Some(item) => {
                                // Any successful message resets the backoff.
                                backoff = BACKOFF_INITIAL;
                                if out.send(item).await.is_err() {
                                    return;
                                }
                            }
                            None => {
                                debug!(topic, "watch stream ended, reconnecting");
                                break;
                            }
                        },
                        () = cancel.cancelled() => return,
                    }
                },
                Err(e) => {
                    debug!(topic, error = %e, "watch subscription failed");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(backoff) => {}
                () = cancel.cancelled() => return,
            }
            backoff = (backoff * 2).min(BACKOFF_MAX);
        }
    })
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
