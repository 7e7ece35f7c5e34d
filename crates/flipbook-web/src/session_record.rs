#![forbid(unsafe_code)]

//! Deterministic session recording and replay.
//!
//! [`SessionRecorder`] wraps a [`StepProgram`] and records every input event,
//! time step, and presented frame. [`replay`] feeds the same records through
//! a fresh widget and verifies that each frame checksum matches.
//!
//! # Determinism contract
//!
//! Given identical recorded inputs and an identically built widget, replay
//! **must** produce identical frame checksums:
//!
//! 1. Time only advances through explicit tick records.
//! 2. Events are replayed from the trace in the recorded batches.
//! 3. The same widget state always yields the same [`ViewSnapshot`] checksum.
//!
//! [`ViewSnapshot`]: flipbook_core::ViewSnapshot

use core::time::Duration;

use flipbook_core::Flipbook;
use flipbook_core::event::Event;

use crate::WebBackendError;
use crate::step_program::{StepProgram, StepResult};

/// Schema version for session traces.
pub const SCHEMA_VERSION: &str = "flipbook-trace-v1";

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

fn fnv1a64_bytes(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn fnv1a64_pair(prev: u64, next: u64) -> u64 {
    let hash = fnv1a64_bytes(FNV_OFFSET_BASIS, &prev.to_le_bytes());
    fnv1a64_bytes(hash, &next.to_le_bytes())
}

fn as_nanos_u64(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// A single record in a session trace.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceRecord {
    /// Session header (must be first).
    Header {
        seed: u64,
        pages: u32,
        schema: String,
    },
    /// An input event at a specific timestamp.
    Input { ts_ns: u64, event: Event },
    /// Clock set to an absolute timestamp.
    Tick { ts_ns: u64 },
    /// Frame checkpoint with checksum.
    Frame {
        frame_idx: u64,
        ts_ns: u64,
        checksum: u64,
        checksum_chain: u64,
    },
    /// Trace summary (must be last).
    Summary {
        total_frames: u64,
        final_checksum_chain: u64,
    },
}

/// A complete recorded session trace.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTrace {
    pub records: Vec<TraceRecord>,
}

impl SessionTrace {
    /// Number of frame checkpoints in the trace.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.records
            .iter()
            .filter(|r| matches!(r, TraceRecord::Frame { .. }))
            .count() as u64
    }

    /// Extract the final checksum chain from the summary record.
    #[must_use]
    pub fn final_checksum_chain(&self) -> Option<u64> {
        self.records.iter().rev().find_map(|r| match r {
            TraceRecord::Summary {
                final_checksum_chain,
                ..
            } => Some(*final_checksum_chain),
            _ => None,
        })
    }
}

/// Records a session for deterministic replay.
pub struct SessionRecorder {
    program: StepProgram,
    records: Vec<TraceRecord>,
    checksum_chain: u64,
    current_ts_ns: u64,
}

impl SessionRecorder {
    #[must_use]
    pub fn new(widget: Flipbook, seed: u64) -> Self {
        let pages = u32::try_from(widget.deck().len()).unwrap_or(u32::MAX);
        Self {
            program: StepProgram::new(widget),
            records: vec![TraceRecord::Header {
                seed,
                pages,
                schema: SCHEMA_VERSION.to_string(),
            }],
            checksum_chain: 0,
            current_ts_ns: 0,
        }
    }

    /// Initialize the widget and record the first frame checkpoint.
    pub fn init(&mut self) -> Result<(), WebBackendError> {
        self.program.init()?;
        self.record_frame();
        Ok(())
    }

    /// Record an input event at the given timestamp (nanoseconds since start).
    pub fn push_event(&mut self, ts_ns: u64, event: Event) {
        self.current_ts_ns = ts_ns;
        self.records.push(TraceRecord::Input {
            ts_ns,
            event: event.clone(),
        });
        self.program.push_event(event);
    }

    /// Record a time advancement by `dt`.
    pub fn advance_time(&mut self, dt: Duration) {
        self.program.advance_time(dt);
        let ts_ns = as_nanos_u64(self.program.now());
        self.current_ts_ns = ts_ns;
        self.records.push(TraceRecord::Tick { ts_ns });
    }

    /// Process one step and record a frame checkpoint if rendered.
    pub fn step(&mut self) -> Result<StepResult, WebBackendError> {
        let result = self.program.step()?;
        if result.rendered {
            self.record_frame();
        }
        Ok(result)
    }

    /// Finish recording and return the completed trace.
    #[must_use]
    pub fn finish(mut self) -> SessionTrace {
        let total_frames = self
            .records
            .iter()
            .filter(|r| matches!(r, TraceRecord::Frame { .. }))
            .count() as u64;
        self.records.push(TraceRecord::Summary {
            total_frames,
            final_checksum_chain: self.checksum_chain,
        });
        SessionTrace {
            records: self.records,
        }
    }

    #[must_use]
    pub const fn program(&self) -> &StepProgram {
        &self.program
    }

    fn record_frame(&mut self) {
        let Some(view) = &self.program.outputs().last_view else {
            return;
        };
        let checksum = view.checksum();
        let chain = fnv1a64_pair(self.checksum_chain, checksum);
        self.records.push(TraceRecord::Frame {
            frame_idx: self.program.frame_idx().saturating_sub(1),
            ts_ns: self.current_ts_ns,
            checksum,
            checksum_chain: chain,
        });
        self.checksum_chain = chain;
    }
}

/// Result of replaying a session trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayResult {
    pub total_frames: u64,
    pub final_checksum_chain: u64,
    /// First frame where a checksum mismatch was detected, if any.
    pub first_mismatch: Option<ReplayMismatch>,
}

impl ReplayResult {
    /// Whether the replay produced identical checksums.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.first_mismatch.is_none()
    }
}

/// Description of a checksum mismatch during replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayMismatch {
    pub frame_idx: u64,
    pub expected: u64,
    pub actual: u64,
}

/// Errors that can occur during replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// The trace is missing a header record.
    MissingHeader,
    /// The replay widget has a different page count than the recorded one.
    PageCountMismatch { expected: u32, actual: u32 },
    /// A backend error occurred during replay.
    Backend(WebBackendError),
}

impl core::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "trace missing header record"),
            Self::PageCountMismatch { expected, actual } => {
                write!(f, "trace recorded {expected} pages, widget has {actual}")
            }
            Self::Backend(e) => write!(f, "backend error: {e}"),
        }
    }
}

impl std::error::Error for ReplayError {}

impl From<WebBackendError> for ReplayError {
    fn from(e: WebBackendError) -> Self {
        Self::Backend(e)
    }
}

/// Replay a recorded session trace through a fresh widget.
///
/// Input and tick records feed the program; each frame record triggers a
/// step (except the init frame) and a checksum comparison.
pub fn replay(widget: Flipbook, trace: &SessionTrace) -> Result<ReplayResult, ReplayError> {
    let expected_pages = trace
        .records
        .first()
        .and_then(|r| match r {
            TraceRecord::Header { pages, .. } => Some(*pages),
            _ => None,
        })
        .ok_or(ReplayError::MissingHeader)?;
    let actual_pages = u32::try_from(widget.deck().len()).unwrap_or(u32::MAX);
    if expected_pages != actual_pages {
        return Err(ReplayError::PageCountMismatch {
            expected: expected_pages,
            actual: actual_pages,
        });
    }

    let mut program = StepProgram::new(widget);
    program.init()?;

    let mut replay_frame_idx: u64 = 0;
    let mut checksum_chain: u64 = 0;
    let mut first_mismatch: Option<ReplayMismatch> = None;

    for record in &trace.records {
        match record {
            TraceRecord::Input { event, .. } => program.push_event(event.clone()),
            TraceRecord::Tick { ts_ns } => program.set_time(Duration::from_nanos(*ts_ns)),
            TraceRecord::Frame {
                frame_idx: expected_idx,
                checksum: expected_checksum,
                ..
            } => {
                // The init frame was already presented by init().
                if replay_frame_idx > 0 {
                    program.step()?;
                }
                if let Some(view) = &program.outputs().last_view {
                    let actual = view.checksum();
                    checksum_chain = fnv1a64_pair(checksum_chain, actual);
                    if actual != *expected_checksum && first_mismatch.is_none() {
                        first_mismatch = Some(ReplayMismatch {
                            frame_idx: *expected_idx,
                            expected: *expected_checksum,
                            actual,
                        });
                    }
                }
                replay_frame_idx += 1;
            }
            TraceRecord::Header { .. } | TraceRecord::Summary { .. } => {}
        }
    }

    Ok(ReplayResult {
        total_frames: replay_frame_idx,
        final_checksum_chain: checksum_chain,
        first_mismatch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flipbook_core::{Direction, FlipbookConfig, Zone};
    use pretty_assertions::assert_eq;

    const TAGS: [Option<&str>; 5] = [None, None, Some("Labrador"), Some("Poodle"), Some("Beagle")];

    fn widget() -> Flipbook {
        Flipbook::with_defaults(TAGS).expect("valid")
    }

    fn record_session() -> SessionTrace {
        let mut rec = SessionRecorder::new(widget(), 7);
        rec.init().unwrap();

        rec.push_event(0, Event::ZoneTap(Zone::Next));
        rec.step().unwrap();
        rec.advance_time(Duration::from_millis(16));
        rec.push_event(16_000_000, Event::PointerDown { x: 10.0, y: 20.0 });
        rec.step().unwrap();
        rec.advance_time(Duration::from_millis(700));
        rec.step().unwrap();
        rec.push_event(716_000_000, Event::SearchInput("oodle".into()));
        rec.push_event(716_000_000, Event::Navigate(Direction::Next));
        rec.step().unwrap();
        rec.advance_time(Duration::from_secs(2));
        rec.step().unwrap();
        rec.finish()
    }

    #[test]
    fn fnv1a64_pair_differs_for_different_input() {
        assert_eq!(fnv1a64_pair(0, 1234), fnv1a64_pair(0, 1234));
        assert_ne!(fnv1a64_pair(0, 1), fnv1a64_pair(0, 2));
        assert_ne!(fnv1a64_pair(1, 0), fnv1a64_pair(2, 0));
    }

    #[test]
    fn recorder_produces_header_frames_and_summary() {
        let trace = record_session();
        assert!(matches!(
            &trace.records[0],
            TraceRecord::Header {
                seed: 7,
                pages: 5,
                ..
            }
        ));
        assert!(matches!(
            trace.records.last(),
            Some(TraceRecord::Summary { .. })
        ));
        assert!(trace.frame_count() >= 4);
        assert!(trace.final_checksum_chain().is_some());
    }

    #[test]
    fn replay_matches_recording() {
        let trace = record_session();
        let result = replay(widget(), &trace).unwrap();
        assert!(result.ok(), "mismatch: {:?}", result.first_mismatch);
        assert_eq!(result.total_frames, trace.frame_count());
        assert_eq!(Some(result.final_checksum_chain), trace.final_checksum_chain());
    }

    #[test]
    fn replay_detects_divergent_widget() {
        let trace = record_session();
        let config = FlipbookConfig {
            settle_policy: flipbook_core::SettlePolicy::FireAndForget,
            timings: flipbook_core::Timings {
                flip_settle_ms: 10,
                ..flipbook_core::Timings::default()
            },
            ..FlipbookConfig::default()
        };
        let divergent = Flipbook::new(config, TAGS).expect("valid");
        let result = replay(divergent, &trace).unwrap();
        assert!(!result.ok());
    }

    #[test]
    fn replay_rejects_missing_header() {
        let trace = SessionTrace {
            records: vec![TraceRecord::Tick { ts_ns: 0 }],
        };
        assert_eq!(replay(widget(), &trace), Err(ReplayError::MissingHeader));
    }

    #[test]
    fn replay_rejects_page_count_mismatch() {
        let trace = record_session();
        let small = Flipbook::with_defaults([None::<&str>, None]).expect("valid");
        assert_eq!(
            replay(small, &trace),
            Err(ReplayError::PageCountMismatch {
                expected: 5,
                actual: 2
            })
        );
    }
}
