#![forbid(unsafe_code)]

//! Startup loader overlay: opaque, then fading, then gone.

use crate::config::Timings;
use crate::scheduler::Scheduler;
use crate::widget::Task;

/// Where the overlay is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LoaderPhase {
    #[default]
    Shown,
    Fading,
    Removed,
}

impl LoaderPhase {
    /// Target opacity for the host; `None` once removed.
    #[must_use]
    pub const fn opacity(self) -> Option<f32> {
        match self {
            Self::Shown => Some(1.0),
            Self::Fading => Some(0.0),
            Self::Removed => None,
        }
    }
}

/// Drives the overlay through its phases.
#[derive(Debug, Clone, Default)]
pub struct LoaderFader {
    phase: LoaderPhase,
    started: bool,
}

impl LoaderFader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn phase(&self) -> LoaderPhase {
        self.phase
    }

    pub(crate) fn start(&mut self, timings: &Timings, sched: &mut Scheduler<Task>) {
        if self.started {
            return;
        }
        self.started = true;
        sched.schedule_after(timings.loader_hold(), Task::FadeLoader);
    }

    pub(crate) fn fade(&mut self, timings: &Timings, sched: &mut Scheduler<Task>) {
        if self.phase != LoaderPhase::Shown {
            return;
        }
        self.phase = LoaderPhase::Fading;
        tracing::debug!(target: "flipbook.loader", "loader fading");
        sched.schedule_after(timings.loader_fade(), Task::RemoveLoader);
    }

    pub(crate) fn remove(&mut self) {
        if self.phase != LoaderPhase::Removed {
            self.phase = LoaderPhase::Removed;
            tracing::debug!(target: "flipbook.loader", "loader removed");
        }
    }
}
