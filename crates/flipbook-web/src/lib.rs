#![forbid(unsafe_code)]

//! `flipbook-web` provides a host-driven backend for the flipbook widget.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment (JS) pushes input events.
//! - **Deterministic time**: the host advances a monotonic clock explicitly.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! This crate does not bind to `wasm-bindgen`. It produces [`patch::DomPatch`]
//! lists that `flipbook-wasm` applies to the real document.

#[cfg(feature = "input-parser")]
pub mod input_parser;
pub mod patch;
pub mod session_record;
pub mod step_program;

use core::time::Duration;
use std::collections::VecDeque;

use flipbook_backend::{Backend, BackendClock, BackendEventSource, BackendPresenter};
use flipbook_core::ViewSnapshot;
use flipbook_core::event::Event;

use crate::patch::{DomPatch, PatchStats, diff_snapshots};

/// Web backend error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebBackendError {
    /// `step` was called before `init`.
    NotInitialized,
    /// Generic unsupported operation.
    Unsupported(&'static str),
}

impl core::fmt::Display for WebBackendError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "program not initialized"),
            Self::Unsupported(msg) => write!(f, "unsupported: {msg}"),
        }
    }
}

impl std::error::Error for WebBackendError {}

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Set current monotonic time.
    pub fn set(&mut self, now: Duration) {
        self.now = now;
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

impl BackendClock for DeterministicClock {
    fn now_mono(&self) -> Duration {
        self.now
    }
}

/// Host-driven FIFO event source.
#[derive(Debug, Clone, Default)]
pub struct WebEventSource {
    queue: VecDeque<Event>,
}

impl WebEventSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a canonical event into the queue.
    pub fn push_event(&mut self, event: Event) {
        self.queue.push_back(event);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drain all pending events.
    pub fn drain_events(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.queue.drain(..)
    }
}

impl BackendEventSource for WebEventSource {
    type Error = WebBackendError;

    fn poll_event(&mut self, timeout: Duration) -> Result<bool, Self::Error> {
        // Host-driven; we never block.
        let _ = timeout;
        Ok(!self.queue.is_empty())
    }

    fn read_event(&mut self) -> Result<Option<Event>, Self::Error> {
        Ok(self.queue.pop_front())
    }
}

/// Captured presentation outputs for host consumption.
#[derive(Debug, Default, Clone)]
pub struct WebOutputs {
    /// Log lines written by the program.
    pub logs: Vec<String>,
    /// Last presented snapshot.
    pub last_view: Option<ViewSnapshot>,
    /// Patches accumulated since the host last took outputs, in emission order.
    pub patches: Vec<DomPatch>,
    /// Accounting for the last present.
    pub last_patch_stats: Option<PatchStats>,
    /// Whether the last present requested a full repaint.
    pub last_full_repaint_hint: bool,
}

/// Presenter that diffs snapshots into DOM patches for the host.
#[derive(Debug, Clone, Default)]
pub struct WebPresenter {
    outputs: WebOutputs,
}

impl WebPresenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get captured outputs.
    #[must_use]
    pub const fn outputs(&self) -> &WebOutputs {
        &self.outputs
    }

    /// Mutably access captured outputs.
    pub fn outputs_mut(&mut self) -> &mut WebOutputs {
        &mut self.outputs
    }

    /// Take pending patches, keeping the last presented snapshot for diffing.
    pub fn take_patches(&mut self) -> Vec<DomPatch> {
        std::mem::take(&mut self.outputs.patches)
    }

    /// Take pending log lines.
    pub fn take_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outputs.logs)
    }

    /// Take captured outputs, leaving empty defaults.
    ///
    /// The next present diffs against nothing and emits a full patch set.
    pub fn take_outputs(&mut self) -> WebOutputs {
        std::mem::take(&mut self.outputs)
    }
}

impl BackendPresenter for WebPresenter {
    type Error = WebBackendError;

    fn write_log(&mut self, text: &str) -> Result<(), Self::Error> {
        self.outputs.logs.push(text.to_owned());
        Ok(())
    }

    fn present(&mut self, view: &ViewSnapshot, full_repaint_hint: bool) -> Result<(), Self::Error> {
        let previous = if full_repaint_hint {
            None
        } else {
            self.outputs.last_view.as_ref()
        };
        let patches = diff_snapshots(previous, view);
        let stats = PatchStats::of(&patches);
        tracing::trace!(
            target: "flipbook.web",
            patches = stats.patch_count,
            full = full_repaint_hint,
            "frame presented"
        );
        self.outputs.patches.extend(patches);
        self.outputs.last_view = Some(view.clone());
        self.outputs.last_patch_stats = Some(stats);
        self.outputs.last_full_repaint_hint = full_repaint_hint;
        Ok(())
    }

    fn gc(&mut self) {
        self.outputs.patches.shrink_to_fit();
        self.outputs.logs.shrink_to_fit();
    }
}

/// A minimal, host-driven web backend.
///
/// This backend is intended to be driven by a JS host:
/// - push events via [`Self::events_mut`]
/// - advance time via [`Self::clock_mut`]
/// - read DOM patches via [`Self::presenter_mut`]
#[derive(Debug, Clone, Default)]
pub struct WebBackend {
    clock: DeterministicClock,
    events: WebEventSource,
    presenter: WebPresenter,
}

impl WebBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutably access the clock.
    pub fn clock_mut(&mut self) -> &mut DeterministicClock {
        &mut self.clock
    }

    /// Mutably access the event source.
    pub fn events_mut(&mut self) -> &mut WebEventSource {
        &mut self.events
    }

    /// Mutably access the presenter.
    pub fn presenter_mut(&mut self) -> &mut WebPresenter {
        &mut self.presenter
    }

    #[must_use]
    pub const fn presenter_ref(&self) -> &WebPresenter {
        &self.presenter
    }
}

impl Backend for WebBackend {
    type Error = WebBackendError;

    type Clock = DeterministicClock;
    type Events = WebEventSource;
    type Presenter = WebPresenter;

    fn clock(&self) -> &Self::Clock {
        &self.clock
    }

    fn events(&mut self) -> &mut Self::Events {
        &mut self.events
    }

    fn presenter(&mut self) -> &mut Self::Presenter {
        &mut self.presenter
    }
}
