#![forbid(unsafe_code)]

//! Click markers: a short-lived decoration at every pointer press.
//!
//! Lifecycle of one marker:
//!
//! 1. `pointer_down` inserts it inactive at the press coordinates.
//! 2. On the next frame it becomes active (the host's CSS transition starts).
//! 3. `marker_active` after the press it is deactivated.
//! 4. A further `marker_linger` later it is removed.
//!
//! Both cleanup timers start at the press, not at activation, so a host that
//! never presents a frame still gets every marker removed on time.
//!
//! Markers are independent of each other and of navigation.

use std::collections::BTreeMap;

use crate::config::Timings;
use crate::scheduler::{Scheduler, TaskId};
use crate::widget::Task;

/// Identifier of one marker, unique for the life of the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(u64);

impl MarkerId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A live click marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    pub x: f64,
    pub y: f64,
    pub active: bool,
}

/// Owns every live marker.
#[derive(Debug, Clone, Default)]
pub struct EffectSpawner {
    markers: BTreeMap<MarkerId, Marker>,
    /// Activation frame tasks not yet fired.
    activations: BTreeMap<MarkerId, TaskId>,
    next_id: u64,
    spawned_total: u64,
}

impl EffectSpawner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Live markers in creation order.
    pub fn markers(&self) -> impl Iterator<Item = &Marker> + '_ {
        self.markers.values()
    }

    #[must_use]
    pub fn get(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.get(&id)
    }

    #[must_use]
    pub fn live(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub const fn spawned_total(&self) -> u64 {
        self.spawned_total
    }

    pub(crate) fn pointer_down(
        &mut self,
        x: f64,
        y: f64,
        timings: &Timings,
        sched: &mut Scheduler<Task>,
    ) -> MarkerId {
        let id = MarkerId(self.next_id);
        self.next_id += 1;
        self.spawned_total += 1;
        self.markers.insert(
            id,
            Marker {
                id,
                x,
                y,
                active: false,
            },
        );
        let activation = sched.request_frame(Task::ActivateMarker(id));
        self.activations.insert(id, activation);
        sched.schedule_after(timings.marker_active(), Task::DeactivateMarker(id));
        sched.schedule_after(
            timings.marker_active().saturating_add(timings.marker_linger()),
            Task::RemoveMarker(id),
        );
        tracing::debug!(target: "flipbook.effect", marker = id.0, x, y, "marker spawned");
        id
    }

    pub(crate) fn activate(&mut self, id: MarkerId) {
        self.activations.remove(&id);
        if let Some(marker) = self.markers.get_mut(&id) {
            marker.active = true;
        }
    }

    pub(crate) fn deactivate(&mut self, id: MarkerId) {
        if let Some(marker) = self.markers.get_mut(&id) {
            marker.active = false;
        }
    }

    pub(crate) fn remove(&mut self, id: MarkerId, sched: &mut Scheduler<Task>) {
        if let Some(activation) = self.activations.remove(&id) {
            sched.cancel(activation);
        }
        if self.markers.remove(&id).is_some() {
            tracing::debug!(target: "flipbook.effect", marker = id.0, "marker removed");
        }
    }
}
