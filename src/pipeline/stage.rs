// src/pipeline/stage.rs

//! Completion tracking for a pipeline stage.
//!
//! A stage moves through `Idle → Dispatching → Draining → Closed`:
//!
//! - `Dispatching`: the first task has been registered, more may follow
//! - `Draining`: the stage is sealed, no task will be registered again
//! - `Closed`: sealed and every registered task has finished
//!
//! Transitions only move forward. Each registered task holds a
//! [`TaskTicket`]; dropping it marks the task finished, so the stage cannot
//! reach `Closed` while any task is still alive.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::error::AppError;

use super::summary::{Stage, StageFailure, StageReport};

/// Lifecycle state of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum StageState {
    Idle = 0,
    Dispatching = 1,
    Draining = 2,
    Closed = 3,
}

impl StageState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => StageState::Idle,
            1 => StageState::Dispatching,
            2 => StageState::Draining,
            _ => StageState::Closed,
        }
    }
}

/// Atomic in-flight counter plus outcome totals for one stage.
#[derive(Debug)]
pub struct StageTracker {
    stage: Stage,
    state: AtomicU8,
    in_flight: AtomicUsize,
    attempted: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    skipped: AtomicUsize,
    emitted: AtomicUsize,
    failures: Mutex<Vec<StageFailure>>,
    finished: Notify,
}

impl StageTracker {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            state: AtomicU8::new(StageState::Idle as u8),
            in_flight: AtomicUsize::new(0),
            attempted: AtomicUsize::new(0),
            succeeded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            emitted: AtomicUsize::new(0),
            failures: Mutex::new(Vec::new()),
            finished: Notify::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn state(&self) -> StageState {
        StageState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Tasks registered and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    fn advance(&self, to: StageState) {
        let previous = StageState::from_u8(self.state.fetch_max(to as u8, Ordering::AcqRel));
        if previous < to {
            log::debug!("{} stage: {:?} -> {:?}", self.stage, previous, to);
        }
    }

    /// Register a new task.
    ///
    /// Registration after [`seal`](Self::seal) is a logic error; the owning
    /// queue handle makes it unreachable.
    pub fn register(self: &Arc<Self>) -> TaskTicket {
        debug_assert!(
            self.state() < StageState::Draining,
            "{} stage registered a task after sealing",
            self.stage
        );
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        self.attempted.fetch_add(1, Ordering::Relaxed);
        self.advance(StageState::Dispatching);
        TaskTicket {
            tracker: Arc::clone(self),
            settled: false,
        }
    }

    /// Count work that was refused instead of dispatched.
    pub fn record_skipped(&self, count: usize) {
        self.skipped.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_emitted(&self) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Stop accepting registrations.
    pub fn seal(&self) {
        self.advance(StageState::Draining);
    }

    /// Wait until the stage is sealed and every registered task finished.
    pub async fn wait_quiescent(&self) {
        debug_assert!(self.state() >= StageState::Draining);
        while self.in_flight() > 0 {
            self.finished.notified().await;
        }
        self.advance(StageState::Closed);
    }

    /// Snapshot the counters and take the recorded failures.
    pub fn report(&self) -> StageReport {
        let failures = std::mem::take(&mut *self.lock_failures());
        StageReport {
            stage: self.stage,
            attempted: self.attempted.load(Ordering::Acquire),
            succeeded: self.succeeded.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
            skipped: self.skipped.load(Ordering::Acquire),
            emitted: self.emitted.load(Ordering::Acquire),
            failures,
        }
    }

    fn lock_failures(&self) -> std::sync::MutexGuard<'_, Vec<StageFailure>> {
        self.failures.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn finish(&self) {
        if self.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            // notify_one stores a permit, so a waiter that has not yet
            // polled still observes this.
            self.finished.notify_one();
        }
    }
}

/// Proof that a task is in flight. Settle it with [`succeed`](Self::succeed)
/// or [`fail`](Self::fail); dropping it unsettled counts as a failure.
#[derive(Debug)]
pub struct TaskTicket {
    tracker: Arc<StageTracker>,
    settled: bool,
}

impl TaskTicket {
    pub fn succeed(mut self) {
        self.settled = true;
        self.tracker.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fail(mut self, subject: impl Into<String>, error: AppError) {
        self.settled = true;
        self.tracker.failed.fetch_add(1, Ordering::Relaxed);
        self.tracker.lock_failures().push(StageFailure {
            subject: subject.into(),
            error,
        });
    }

    pub fn stage(&self) -> Stage {
        self.tracker.stage
    }

    pub(crate) fn tracker(&self) -> &StageTracker {
        &self.tracker
    }
}

impl Drop for TaskTicket {
    fn drop(&mut self) {
        if !self.settled {
            self.tracker.failed.fetch_add(1, Ordering::Relaxed);
            self.tracker.lock_failures().push(StageFailure {
                subject: "<unknown>".into(),
                error: AppError::TaskAborted(self.tracker.stage),
            });
        }
        self.tracker.finish();
    }
}
