//! Cancellable task timeline
//!
//! The transport runs two kinds of timed work: the periodic resync tick
//! and the finite step series of each fade. Instead of ad hoc repeating
//! timers, both are entries on one explicit timeline with cancellation
//! tokens, which makes last-scheduled-wins fade supersession a testable
//! contract rather than an accident of timer ordering.
//!
//! The scheduler is pure data: the owner loop asks [`Scheduler::pop_due`]
//! for due work and performs it itself, so there are no callbacks and no
//! threads in here.

use std::time::Duration;

/// Cancellation token for a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// What a due task asks the controller to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Drift-correction tick
    Resync,
    /// One step of the fade running on `lane`
    FadeStep { lane: usize },
}

#[derive(Debug)]
struct Task {
    id: TaskId,
    kind: TaskKind,
    next_due: Duration,
    interval: Duration,
    /// Remaining fires; None repeats until cancelled
    remaining: Option<u32>,
}

/// Ordered collection of pending timed work
#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: Vec<Task>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(
        &mut self,
        kind: TaskKind,
        first_due: Duration,
        interval: Duration,
        remaining: Option<u32>,
    ) -> TaskId {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        self.tasks.push(Task {
            id,
            kind,
            next_due: first_due,
            interval,
            remaining,
        });
        id
    }

    /// Schedule a task that repeats every `interval` until cancelled
    pub fn schedule_periodic(
        &mut self,
        kind: TaskKind,
        first_due: Duration,
        interval: Duration,
    ) -> TaskId {
        self.insert(kind, first_due, interval, None)
    }

    /// Schedule a finite series of `count` fires spaced by `interval`
    pub fn schedule_series(
        &mut self,
        kind: TaskKind,
        first_due: Duration,
        interval: Duration,
        count: u32,
    ) -> TaskId {
        self.insert(kind, first_due, interval, Some(count))
    }

    /// Remove a task; a stale or already-exhausted id is a no-op
    pub fn cancel(&mut self, id: TaskId) {
        self.tasks.retain(|t| t.id != id);
    }

    /// Drop every pending task
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Earliest pending deadline, for the owner loop's sleep
    pub fn next_deadline(&self) -> Option<Duration> {
        self.tasks.iter().map(|t| t.next_due).min()
    }

    /// Fire the earliest task due at or before `now`
    ///
    /// Advances periodic tasks to their next slot and retires series
    /// tasks that have exhausted their fires. Returns None once nothing
    /// further is due, so the owner loop drains with a `while let`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TaskId, TaskKind)> {
        let idx = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.next_due <= now)
            .min_by_key(|(_, t)| t.next_due)
            .map(|(i, _)| i)?;

        let task = &mut self.tasks[idx];
        let fired = (task.id, task.kind);
        task.next_due += task.interval;
        if let Some(remaining) = &mut task.remaining {
            *remaining -= 1;
            if *remaining == 0 {
                self.tasks.swap_remove(idx);
            }
        }
        Some(fired)
    }
}
