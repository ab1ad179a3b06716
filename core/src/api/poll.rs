//! Polling loops over run status and transcript.
//!
//! RULES:
//!   - The first fetch happens immediately. A loop ends when the run reaches a
//!     terminal state, when it is cancelled, or when the retry policy gives up.
//!   - Cancellation is cooperative: the active flag is checked before each
//!     fetch. A fetch already in flight completes and its callback still fires.
//!   - Errors are reported through `on_error` and never end the loop on their
//!     own; only an exhausted retry policy does.

use super::CourtroomApi;
use crate::{
    config::RetryPolicy,
    error::{CourtroomError, CourtroomResult},
    model::{DebateStage, RunStatus, Transcript},
    types::Millis,
};
use std::{
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::task::JoinHandle;

/// Handle on a running poll loop. Dropping it leaves the loop running.
pub struct PollHandle {
    active: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stop the loop before its next fetch.
    pub fn cancel(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// False once the loop has been cancelled or has finished.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Wait for the loop to end.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            log::warn!("Poll task ended abnormally: {e}");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

fn spawn_poll<T, F, Fut, S, E>(
    label: String,
    interval_ms: Millis,
    retry: RetryPolicy,
    fetch: F,
    mut step: S,
    mut on_error: E,
) -> PollHandle
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = CourtroomResult<T>> + Send,
    S: FnMut(T) -> Flow + Send + 'static,
    E: FnMut(CourtroomError) + Send + 'static,
{
    let active = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&active);
    let task = tokio::spawn(async move {
        let mut consecutive_errors = 0u32;
        while flag.load(Ordering::SeqCst) {
            let delay = match fetch().await {
                Ok(value) => {
                    consecutive_errors = 0;
                    if step(value) == Flow::Stop {
                        log::debug!("{label}: terminal, polling stopped");
                        break;
                    }
                    interval_ms
                }
                Err(e) => {
                    consecutive_errors += 1;
                    log::warn!("{label}: poll failed ({consecutive_errors} in a row): {e}");
                    on_error(e);
                    if retry.exhausted(consecutive_errors) {
                        log::warn!("{label}: giving up after {consecutive_errors} errors");
                        break;
                    }
                    retry.delay_ms(interval_ms, consecutive_errors)
                }
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        flag.store(false, Ordering::SeqCst);
    });
    PollHandle { active, task }
}

/// Poll a run's status until it is decided or failed.
pub fn poll_run_status<U, E>(
    api: Arc<dyn CourtroomApi>,
    run_id: &str,
    interval_ms: Millis,
    retry: RetryPolicy,
    mut on_update: U,
    on_error: E,
) -> PollHandle
where
    U: FnMut(RunStatus) + Send + 'static,
    E: FnMut(CourtroomError) + Send + 'static,
{
    let id = run_id.to_string();
    spawn_poll(
        format!("status {run_id}"),
        interval_ms,
        retry,
        move || {
            let api = Arc::clone(&api);
            let id = id.clone();
            async move { api.run_status(&id).await }
        },
        move |status: RunStatus| {
            let terminal = status.status.is_terminal();
            on_update(status);
            if terminal {
                Flow::Stop
            } else {
                Flow::Continue
            }
        },
        on_error,
    )
}

/// Poll a run's transcript until it reaches `done`. `on_update` fires only
/// when the number of messages differs from the last one reported.
pub fn poll_transcript<U, E>(
    api: Arc<dyn CourtroomApi>,
    run_id: &str,
    interval_ms: Millis,
    retry: RetryPolicy,
    mut on_update: U,
    on_error: E,
) -> PollHandle
where
    U: FnMut(Transcript) + Send + 'static,
    E: FnMut(CourtroomError) + Send + 'static,
{
    let id = run_id.to_string();
    let mut last_count = 0usize;
    spawn_poll(
        format!("transcript {run_id}"),
        interval_ms,
        retry,
        move || {
            let api = Arc::clone(&api);
            let id = id.clone();
            async move { api.transcript(&id).await }
        },
        move |transcript: Transcript| {
            let done = transcript.stage == DebateStage::Done;
            if transcript.messages.len() != last_count {
                last_count = transcript.messages.len();
                on_update(transcript);
            }
            if done {
                Flow::Stop
            } else {
                Flow::Continue
            }
        },
        on_error,
    )
}
