#![forbid(unsafe_code)]

//! Cooperative single-threaded task scheduler.
//!
//! The widget never sleeps or spawns threads. Work that must happen later is
//! queued here, and the host drives time forward with [`Scheduler::advance_to`]
//! then drains due tasks with [`Scheduler::pop_due`].
//!
//! Two kinds of trigger exist:
//!
//! - **Timer**: fires once scheduler time reaches `scheduled_at + delay`.
//! - **Frame**: fires on the first drain after the next presented frame
//!   (see [`Scheduler::frame_presented`]). This is the `requestAnimationFrame`
//!   slot: a marker created in one frame is guaranteed to be painted once in
//!   its initial state before the frame task runs.
//!
//! # Invariants
//!
//! 1. Time is monotonic: `advance_to` with an earlier instant is clamped.
//! 2. Due frame tasks drain before due timers.
//! 3. Due timers drain by deadline, then by scheduling order.
//! 4. A cancelled task never fires; cancelling twice is harmless.

use core::time::Duration;

/// Handle to a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Frame { requested_in: u64 },
    At(Duration),
}

#[derive(Debug, Clone)]
struct Entry<T> {
    id: TaskId,
    trigger: Trigger,
    task: T,
}

/// Timer and frame queue.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now: Duration,
    frame: u64,
    next_id: u64,
    entries: Vec<Entry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
            frame: 0,
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Current scheduler time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Number of presented frames observed.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Number of tasks waiting to fire.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_pending(&self, id: TaskId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Earliest timer deadline, if any timer is queued.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries
            .iter()
            .filter_map(|e| match e.trigger {
                Trigger::At(deadline) => Some(deadline),
                Trigger::Frame { .. } => None,
            })
            .min()
    }

    fn push(&mut self, trigger: Trigger, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, trigger, task });
        id
    }

    /// Queue `task` to fire `delay` after the current scheduler time.
    pub fn schedule_after(&mut self, delay: Duration, task: T) -> TaskId {
        let deadline = self.now.saturating_add(delay);
        let id = self.push(Trigger::At(deadline), task);
        tracing::trace!(
            target: "flipbook.sched",
            task_id = id.0,
            deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
            "timer scheduled"
        );
        id
    }

    /// Queue `task` for the first drain after the next presented frame.
    pub fn request_frame(&mut self, task: T) -> TaskId {
        let id = self.push(
            Trigger::Frame {
                requested_in: self.frame,
            },
            task,
        );
        tracing::trace!(target: "flipbook.sched", task_id = id.0, frame = self.frame, "frame task requested");
        id
    }

    /// Drop a queued task. Returns `false` if it already fired or never existed.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        let cancelled = self.entries.len() != before;
        if cancelled {
            tracing::trace!(target: "flipbook.sched", task_id = id.0, "task cancelled");
        }
        cancelled
    }

    /// Move scheduler time forward. Earlier instants are ignored.
    pub fn advance_to(&mut self, now: Duration) {
        if now > self.now {
            self.now = now;
        }
    }

    /// Note that the host presented a frame.
    pub fn frame_presented(&mut self) {
        self.frame = self.frame.saturating_add(1);
    }

    /// Remove and return the next due task, if any.
    pub fn pop_due(&mut self) -> Option<(TaskId, T)> {
        let frame = self.frame;
        let now = self.now;
        let frame_due = self.entries.iter().position(
            |e| matches!(e.trigger, Trigger::Frame { requested_in } if requested_in < frame),
        );
        let pos = frame_due.or_else(|| {
            self.entries
                .iter()
                .enumerate()
                .filter_map(|(pos, e)| match e.trigger {
                    Trigger::At(deadline) if deadline <= now => Some((deadline, e.id, pos)),
                    _ => None,
                })
                .min()
                .map(|(_, _, pos)| pos)
        })?;
        let entry = self.entries.remove(pos);
        Some((entry.id, entry.task))
    }
}
