#![forbid(unsafe_code)]

//! Host-driven step loop around one [`Flipbook`].
//!
//! A JS host calls [`StepProgram::step`] once per animation frame:
//!
//! 1. time is read from the deterministic clock and due widget tasks fire
//! 2. queued input events are handled in arrival order
//! 3. the resulting view is presented if it differs from the last frame
//! 4. the widget is told a frame was presented (releasing frame tasks)
//!
//! Nothing here reads a real clock, so the same pushes and time steps always
//! produce the same patches.

use core::time::Duration;

use flipbook_backend::{Backend, BackendClock, BackendEventSource, BackendPresenter};
use flipbook_core::event::Event;
use flipbook_core::{Flipbook, ViewSnapshot};

use crate::patch::DomPatch;
use crate::{WebBackend, WebBackendError, WebOutputs};

/// Outcome of one [`StepProgram::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepResult {
    /// Whether the program is still running.
    pub running: bool,
    /// Whether a frame was presented.
    pub rendered: bool,
    /// Number of input events handled.
    pub events_processed: u32,
    /// Number of timer and frame tasks that fired.
    pub tasks_fired: u32,
}

/// Deterministic step loop.
#[derive(Debug, Clone)]
pub struct StepProgram {
    widget: Flipbook,
    backend: WebBackend,
    initialized: bool,
    running: bool,
    frame_idx: u64,
    last_checksum: Option<u64>,
}

impl StepProgram {
    #[must_use]
    pub fn new(widget: Flipbook) -> Self {
        Self {
            widget,
            backend: WebBackend::new(),
            initialized: false,
            running: true,
            frame_idx: 0,
            last_checksum: None,
        }
    }

    /// Initialize the widget and present the first full frame.
    pub fn init(&mut self) -> Result<(), WebBackendError> {
        if self.initialized {
            return Ok(());
        }
        self.widget.init();
        self.widget.advance(self.backend.clock().now_mono());
        let view = self.widget.view();
        self.present(&view, true)?;
        self.widget.frame_presented();
        self.initialized = true;
        tracing::debug!(
            target: "flipbook.web",
            pages = view.pages.len(),
            "step program initialized"
        );
        Ok(())
    }

    /// Queue an input event for the next step.
    pub fn push_event(&mut self, event: Event) {
        self.backend.events_mut().push_event(event);
    }

    /// Advance the clock by `dt`.
    pub fn advance_time(&mut self, dt: Duration) {
        self.backend.clock_mut().advance(dt);
    }

    /// Set the clock to an absolute instant. Earlier instants do not rewind widget time.
    pub fn set_time(&mut self, now: Duration) {
        self.backend.clock_mut().set(now);
    }

    /// Run one frame.
    pub fn step(&mut self) -> Result<StepResult, WebBackendError> {
        if !self.initialized {
            return Err(WebBackendError::NotInitialized);
        }
        if !self.running {
            return Ok(StepResult::default());
        }

        let now = self.backend.clock().now_mono();
        let mut tasks_fired = self.widget.advance(now);

        let mut events_processed: u32 = 0;
        while let Some(event) = self.backend.events_mut().read_event()? {
            tracing::trace!(target: "flipbook.web", kind = event.kind(), "input event");
            self.widget.handle_event(&event);
            events_processed = events_processed.saturating_add(1);
        }
        // Zero-delay work queued by the events above belongs to this frame.
        tasks_fired += self.widget.advance(now);

        let view = self.widget.view();
        let rendered = self.last_checksum != Some(view.checksum());
        if rendered {
            self.present(&view, false)?;
        }
        self.widget.frame_presented();

        Ok(StepResult {
            running: self.running,
            rendered,
            events_processed,
            tasks_fired: tasks_fired.min(u32::MAX as usize) as u32,
        })
    }

    /// Stop stepping; later steps do nothing.
    pub fn stop(&mut self) {
        self.running = false;
    }

    fn present(&mut self, view: &ViewSnapshot, full: bool) -> Result<(), WebBackendError> {
        self.backend.presenter_mut().present(view, full)?;
        self.last_checksum = Some(view.checksum());
        self.frame_idx += 1;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    #[must_use]
    pub const fn widget(&self) -> &Flipbook {
        &self.widget
    }

    /// Mutable widget access for direct operations outside the event queue.
    pub fn widget_mut(&mut self) -> &mut Flipbook {
        &mut self.widget
    }

    #[must_use]
    pub const fn outputs(&self) -> &WebOutputs {
        self.backend.presenter_ref().outputs()
    }

    pub fn take_patches(&mut self) -> Vec<DomPatch> {
        self.backend.presenter_mut().take_patches()
    }

    pub fn take_logs(&mut self) -> Vec<String> {
        self.backend.presenter_mut().take_logs()
    }

    /// Write a diagnostic line to the presenter's log buffer.
    pub fn write_log(&mut self, text: &str) -> Result<(), WebBackendError> {
        self.backend.presenter_mut().write_log(text)
    }

    /// Number of frames presented so far.
    #[must_use]
    pub const fn frame_idx(&self) -> u64 {
        self.frame_idx
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.backend.clock().now_mono()
    }

    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }
}
