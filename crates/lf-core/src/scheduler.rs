//! Deferred work.
//!
//! The scanner never holds closures across a deferral. It hands the host a
//! [`Job`] together with a [`Deferral`]; when the deferral elapses the host
//! passes the job back to [`Scanner::run_job`](crate::Scanner::run_job).

/// Opaque handle to a scheduled job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

/// When a job should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferral {
    /// Idle callback with a timeout ceiling; hosts without idle callbacks
    /// use a plain timer of `fallback_ms`.
    Idle { timeout_ms: u32, fallback_ms: u32 },
    /// Fixed delay timer.
    Delay(u32),
    /// Next animation frame.
    AnimationFrame,
}

/// Work the scanner resumes after a deferral.
#[derive(Debug, Clone, PartialEq)]
pub enum Job<N> {
    /// Drain the dirty-root queue.
    FlushScans,
    /// Repaint the menu status.
    Render,
    /// Removal transition of a card finished.
    CompleteRemoval(N),
    /// First frame after a card was put back.
    RestoreFirstFrame(N),
    /// Second frame: start the restore transition.
    RestoreSecondFrame(N),
    /// Restore transition finished.
    RestoreCleanup(N),
}

/// Host timer facility.
pub trait Scheduler<N> {
    fn schedule(&mut self, when: Deferral, job: Job<N>) -> TaskId;

    /// Drop a job that has not run yet. Unknown ids are ignored.
    fn cancel(&mut self, task: TaskId);

    /// Wall clock in milliseconds.
    fn now_ms(&self) -> f64;
}

/// Nominal frame length used by [`ManualScheduler`].
pub const FRAME_MS: f64 = 16.0;

#[derive(Debug, Clone)]
struct Pending<N> {
    id: TaskId,
    due: f64,
    job: Job<N>,
}

/// Virtual-time scheduler for tests and offline runs.
///
/// Idle callbacks resolve to their fallback delay. Jobs due at the same time
/// run in scheduling order.
#[derive(Debug, Clone)]
pub struct ManualScheduler<N> {
    now: f64,
    next_id: u64,
    pending: Vec<Pending<N>>,
}

impl<N> Default for ManualScheduler<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> ManualScheduler<N> {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            next_id: 0,
            pending: Vec::new(),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return the earliest job due at or before `deadline`,
    /// moving the clock to its due time.
    pub fn pop_due(&mut self, deadline: f64) -> Option<Job<N>> {
        let (index, _) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= deadline)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)))?;
        let pending = self.pending.remove(index);
        if pending.due > self.now {
            self.now = pending.due;
        }
        Some(pending.job)
    }

    /// Move the clock forward without running anything.
    pub fn set_now(&mut self, now_ms: f64) {
        if now_ms > self.now {
            self.now = now_ms;
        }
    }
}

impl<N> Scheduler<N> for ManualScheduler<N> {
    fn schedule(&mut self, when: Deferral, job: Job<N>) -> TaskId {
        let delay = match when {
            Deferral::Idle { fallback_ms, .. } => f64::from(fallback_ms),
            Deferral::Delay(ms) => f64::from(ms),
            Deferral::AnimationFrame => FRAME_MS,
        };
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            due: self.now + delay,
            job,
        });
        id
    }

    fn cancel(&mut self, task: TaskId) {
        self.pending.retain(|p| p.id != task);
    }

    fn now_ms(&self) -> f64 {
        self.now
    }
}
