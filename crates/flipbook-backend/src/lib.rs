#![forbid(unsafe_code)]
#![doc = "Backend traits for the flipbook widget: host abstraction for input, presentation, and time."]
#![doc = ""]
#![doc = "This crate defines the boundary between the widget state machine and the host"]
#![doc = "that paints it (the deterministic web backend in `flipbook-web`, or a test double)."]

use core::time::Duration;

use flipbook_core::ViewSnapshot;
use flipbook_core::event::Event;

/// Monotonic clock abstraction.
///
/// Browser hosts feed `performance.now()`; tests feed fixed instants.
/// The widget never reads a clock directly; all time flows through this trait.
pub trait BackendClock {
    /// Returns elapsed time since an unspecified epoch, monotonically increasing.
    fn now_mono(&self) -> Duration;
}

/// Event source abstraction.
///
/// This is the input half of the backend boundary: DOM listeners (or a test)
/// push canonical [`Event`] values and the step loop drains them.
pub trait BackendEventSource {
    /// Platform-specific error type.
    type Error: core::fmt::Debug + core::fmt::Display;

    /// Poll for an available event, returning `true` if one is ready.
    ///
    /// Must not block longer than `timeout`. Returns `Ok(false)` on timeout.
    fn poll_event(&mut self, timeout: Duration) -> Result<bool, Self::Error>;

    /// Read the next available event, or `None` if none is ready.
    fn read_event(&mut self) -> Result<Option<Event>, Self::Error>;
}

/// Presentation abstraction: view output and log lines.
///
/// The step loop hands each changed [`ViewSnapshot`] to the presenter, which
/// turns it into platform output (DOM patches on web).
pub trait BackendPresenter {
    /// Platform-specific error type.
    type Error: core::fmt::Debug + core::fmt::Display;

    /// Write a diagnostic log line.
    fn write_log(&mut self, text: &str) -> Result<(), Self::Error>;

    /// Present one frame.
    ///
    /// - `view`: full widget state for this frame.
    /// - `full_repaint_hint`: if `true`, emit everything instead of diffing
    ///   against the previously presented frame.
    fn present(&mut self, view: &ViewSnapshot, full_repaint_hint: bool) -> Result<(), Self::Error>;

    /// Optional: release buffered output the host has already consumed.
    fn gc(&mut self) {}
}

/// Unified backend combining clock, event source, and presenter.
pub trait Backend {
    /// Platform-specific error type shared across sub-traits.
    type Error: core::fmt::Debug + core::fmt::Display;

    type Clock: BackendClock;

    type Events: BackendEventSource<Error = Self::Error>;

    type Presenter: BackendPresenter<Error = Self::Error>;

    fn clock(&self) -> &Self::Clock;

    fn events(&mut self) -> &mut Self::Events;

    fn presenter(&mut self) -> &mut Self::Presenter;
}
