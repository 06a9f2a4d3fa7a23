//! Per-session elapsed-time tracking.
//!
//! A [`GameTimer`] belongs to exactly one session. While running and not
//! paused it notifies its observers once per tick with the elapsed whole
//! seconds, and stops itself when the configured cap is reached (the final
//! notification carries exactly the cap).
//!
//! `elapsed = now − start − paused`, measured on [`tokio::time::Instant`] so
//! a paused tokio clock drives it in tests.
//!
//! Observers run while the timer's lock is held and must not call back
//! into the timer.

use std::ops::ControlFlow;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::TimerConfig;
use crate::schedule::ScheduledTask;
use crate::time_format::format_time;
use crate::types::SessionId;

/// Callback receiving elapsed seconds.
pub type TimerObserver = Arc<dyn Fn(u64) + Send + Sync>;

enum TimerState {
    Idle,
    Running {
        started: Instant,
        carried: Duration,
        paused_total: Duration,
        paused_since: Option<Instant>,
    },
    /// Hit the cap; holds the final value until `stop` collects it.
    Expired { elapsed: u64 },
}

struct TimerInner {
    session: Option<SessionId>,
    state: TimerState,
    observers: Vec<(u64, TimerObserver)>,
    next_observer_id: u64,
    ticker: Option<ScheduledTask>,
}

impl TimerInner {
    fn elapsed_at(&self, now: Instant, cap: u64) -> u64 {
        match &self.state {
            TimerState::Idle => 0,
            TimerState::Expired { elapsed } => *elapsed,
            TimerState::Running {
                started,
                carried,
                paused_total,
                paused_since,
            } => {
                let until = paused_since.unwrap_or(now);
                let run = until
                    .saturating_duration_since(*started)
                    .saturating_sub(*paused_total);
                (run + *carried).as_secs().min(cap)
            }
        }
    }

    fn on_tick(&mut self, cap: u64) -> ControlFlow<()> {
        let paused = match &self.state {
            TimerState::Running { paused_since, .. } => paused_since.is_some(),
            _ => return ControlFlow::Break(()),
        };
        if paused {
            return ControlFlow::Continue(());
        }

        let elapsed = self.elapsed_at(Instant::now(), cap);
        for (_, observer) in &self.observers {
            observer(elapsed);
        }

        if elapsed >= cap {
            self.state = TimerState::Expired { elapsed: cap };
            if let Some(session) = self.session {
                info!(session = %session, cap_secs = cap, "Timer reached its cap and stopped");
            }
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }
}

/// Elapsed-time tracker for one session.
pub struct GameTimer {
    inner: Arc<Mutex<TimerInner>>,
    config: TimerConfig,
}

impl std::fmt::Debug for GameTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("GameTimer")
            .field("session", &inner.session)
            .field("observers", &inner.observers.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GameTimer {
    /// Create an idle timer.
    #[must_use]
    pub fn new(config: TimerConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TimerInner {
                session: None,
                state: TimerState::Idle,
                observers: Vec::new(),
                next_observer_id: 0,
                ticker: None,
            })),
            config,
        }
    }

    /// Begin tracking `session` from now. No-op unless idle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, session: SessionId) {
        self.start_from(session, Duration::ZERO);
    }

    /// Begin tracking `session` with `already_elapsed` carried over from a
    /// restored game. No-op unless idle.
    pub fn start_from(&self, session: SessionId, already_elapsed: Duration) {
        let mut inner = self.inner.lock();
        if !matches!(inner.state, TimerState::Idle) {
            debug!(session = %session, "Timer already started; ignoring start");
            return;
        }

        inner.session = Some(session);
        inner.state = TimerState::Running {
            started: Instant::now(),
            carried: already_elapsed,
            paused_total: Duration::ZERO,
            paused_since: None,
        };

        let weak: Weak<Mutex<TimerInner>> = Arc::downgrade(&self.inner);
        let cap = self.config.max_duration_secs;
        inner.ticker = Some(ScheduledTask::every(self.config.tick_interval(), move || {
            let Some(shared) = weak.upgrade() else {
                return ControlFlow::Break(());
            };
            let mut guard = shared.lock();
            guard.on_tick(cap)
        }));

        debug!(session = %session, carried_secs = already_elapsed.as_secs(), "Timer started");
    }

    /// Stop counting. No-op unless running and not paused.
    pub fn pause(&self) {
        let mut inner = self.inner.lock();
        if let TimerState::Running { paused_since, .. } = &mut inner.state {
            if paused_since.is_none() {
                *paused_since = Some(Instant::now());
            }
        }
    }

    /// Continue counting. No-op unless paused.
    pub fn resume(&self) {
        let mut inner = self.inner.lock();
        if let TimerState::Running {
            paused_total,
            paused_since,
            ..
        } = &mut inner.state
        {
            if let Some(since) = paused_since.take() {
                *paused_total += Instant::now().saturating_duration_since(since);
            }
        }
    }

    /// Finalise and return elapsed whole seconds, then forget the session.
    ///
    /// Returns 0 if the timer was never started. Pending ticks are cancelled
    /// and deliver nothing.
    pub fn stop(&self) -> u64 {
        let mut inner = self.inner.lock();
        let elapsed = inner.elapsed_at(Instant::now(), self.config.max_duration_secs);
        inner.ticker = None;
        inner.state = TimerState::Idle;
        if let Some(session) = inner.session.take() {
            debug!(session = %session, elapsed_secs = elapsed, "Timer stopped");
        }
        elapsed
    }

    /// Current elapsed whole seconds (0 when idle).
    #[must_use]
    pub fn elapsed(&self) -> u64 {
        self.inner
            .lock()
            .elapsed_at(Instant::now(), self.config.max_duration_secs)
    }

    /// Elapsed time as `MM:SS`.
    #[must_use]
    pub fn formatted_time(&self) -> String {
        format_time(self.elapsed())
    }

    /// Seconds left before the cap.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.config.max_duration_secs.saturating_sub(self.elapsed())
    }

    /// Running and not paused.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(
            self.inner.lock().state,
            TimerState::Running {
                paused_since: None,
                ..
            }
        )
    }

    /// Running but paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        matches!(
            self.inner.lock().state,
            TimerState::Running {
                paused_since: Some(_),
                ..
            }
        )
    }

    /// Stopped itself at the cap and not yet collected by [`stop`](Self::stop).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self.inner.lock().state, TimerState::Expired { .. })
    }

    /// Session currently bound to this timer.
    #[must_use]
    pub fn session(&self) -> Option<SessionId> {
        self.inner.lock().session
    }

    /// Register an observer for tick notifications.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        let id = inner.next_observer_id;
        inner.next_observer_id += 1;
        inner.observers.push((id, Arc::new(observer)));
        Subscription {
            id,
            timer: Arc::downgrade(&self.inner),
        }
    }

    /// Register a callback fired when the cap is reached.
    pub fn on_limit<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let cap = self.config.max_duration_secs;
        self.subscribe(move |elapsed| {
            if elapsed >= cap {
                callback();
            }
        })
    }

    /// Timer settings.
    #[must_use]
    pub fn config(&self) -> &TimerConfig {
        &self.config
    }
}

/// Registration handle returned by [`GameTimer::subscribe`].
///
/// Dropping the handle does not unregister anything: the observer stays
/// until [`unsubscribe`](Self::unsubscribe) is called or the timer is gone.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    timer: Weak<Mutex<TimerInner>>,
}

impl Subscription {
    /// Remove this observer. Other observers are unaffected.
    pub fn unsubscribe(self) {
        if let Some(inner) = self.timer.upgrade() {
            inner.lock().observers.retain(|(id, _)| *id != self.id);
        }
    }
}
