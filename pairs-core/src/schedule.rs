//! Cancellable scheduled work on the tokio runtime.
//!
//! A [`ScheduledTask`] is the single owner of a spawned task. Cancelling or
//! dropping it aborts the task, so a step that has not started yet never
//! runs. Every constructor must be called from within a tokio runtime.

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Handle to a deferred or periodic task.
#[derive(Debug)]
pub struct ScheduledTask {
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Run `work` now, owned by the returned handle.
    pub fn spawn<F>(work: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(work),
        }
    }

    /// Run `work` once after `delay`.
    pub fn after<F>(delay: Duration, work: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            time::sleep(delay).await;
            work.await;
        });
        Self { handle }
    }

    /// Call `step` every `period`, starting one period from now, until it
    /// returns [`ControlFlow::Break`].
    pub fn every<F>(period: Duration, mut step: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if step().is_break() {
                    break;
                }
            }
        });
        Self { handle }
    }

    /// Abort the task.
    pub fn cancel(self) {
        drop(self);
    }

    /// Whether the task has run to completion or been aborted.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
