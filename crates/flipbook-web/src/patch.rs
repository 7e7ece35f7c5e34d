#![forbid(unsafe_code)]

//! DOM patch operations derived from consecutive view snapshots.
//!
//! The widget never touches the document. Each presented frame is diffed
//! against the previously presented one and the difference is expressed as
//! a flat list of [`DomPatch`] values the host applies in order.
//!
//! Emission order within one frame:
//!
//! 1. per page, in deck order: stack order, flipped class, hidden state
//! 2. book-open class
//! 3. zone visibility (prev, then next)
//! 4. transition cue
//! 5. markers: removals, then spawns and activation changes in creation order
//! 6. loader overlay
//!
//! A diff against nothing (first frame, or a forced repaint) emits every
//! page, book and zone field, every live marker, and the loader state, but
//! never the cue.

use flipbook_core::Zone;
use flipbook_core::ViewSnapshot;
use flipbook_core::loader::LoaderPhase;
use flipbook_core::view::{MarkerView, PageView};

#[cfg(feature = "json")]
fn serialize_zone<S: serde::Serializer>(zone: &Zone, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(zone.as_str())
}

/// One DOM mutation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(tag = "op", rename_all = "snake_case"))]
pub enum DomPatch {
    /// Set the page's `z-index`.
    StackOrder { page: usize, z: u32 },
    /// Toggle the page's `flipped` class.
    Flipped { page: usize, flipped: bool },
    /// Toggle the page's `filtered` class and `display: none`.
    Hidden { page: usize, hidden: bool },
    /// Toggle the wrapper's `is-open` class.
    BookOpen { open: bool },
    /// Show or hide a click zone.
    ZoneVisible {
        #[cfg_attr(feature = "json", serde(serialize_with = "serialize_zone"))]
        zone: Zone,
        visible: bool,
    },
    /// Rewind and play the transition sound.
    PlayCue,
    /// Append a marker element at page coordinates.
    SpawnMarker { id: u64, x: f64, y: f64 },
    /// Toggle a marker's `active` class.
    MarkerActive { id: u64, active: bool },
    /// Remove a marker element.
    RemoveMarker { id: u64 },
    /// Set the loader overlay opacity.
    LoaderOpacity { opacity: f32 },
    /// Hide the loader overlay for good.
    RemoveLoader,
}

impl DomPatch {
    /// Whether the patch targets a page element.
    #[must_use]
    pub const fn is_page_update(&self) -> bool {
        matches!(
            self,
            Self::StackOrder { .. } | Self::Flipped { .. } | Self::Hidden { .. }
        )
    }

    /// Whether the patch targets a marker element.
    #[must_use]
    pub const fn is_marker_update(&self) -> bool {
        matches!(
            self,
            Self::SpawnMarker { .. } | Self::MarkerActive { .. } | Self::RemoveMarker { .. }
        )
    }
}

/// Aggregate patch accounting for host instrumentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchStats {
    pub patch_count: u32,
    pub page_updates: u32,
    pub marker_updates: u32,
}

impl PatchStats {
    #[must_use]
    pub fn of(patches: &[DomPatch]) -> Self {
        let count = |pred: fn(&DomPatch) -> bool| {
            patches
                .iter()
                .filter(|p| pred(p))
                .count()
                .min(u32::MAX as usize) as u32
        };
        Self {
            patch_count: patches.len().min(u32::MAX as usize) as u32,
            page_updates: count(DomPatch::is_page_update),
            marker_updates: count(DomPatch::is_marker_update),
        }
    }
}

fn page_patches(prev: Option<&PageView>, next: &PageView, out: &mut Vec<DomPatch>) {
    let page = next.index;
    if prev.is_none_or(|p| p.stack_order != next.stack_order) {
        out.push(DomPatch::StackOrder {
            page,
            z: next.stack_order,
        });
    }
    if prev.is_none_or(|p| p.flipped != next.flipped) {
        out.push(DomPatch::Flipped {
            page,
            flipped: next.flipped,
        });
    }
    if prev.is_none_or(|p| p.hidden != next.hidden) {
        out.push(DomPatch::Hidden {
            page,
            hidden: next.hidden,
        });
    }
}

fn marker_patches(prev: &[MarkerView], next: &[MarkerView], out: &mut Vec<DomPatch>) {
    for old in prev {
        if !next.iter().any(|m| m.id == old.id) {
            out.push(DomPatch::RemoveMarker { id: old.id.get() });
        }
    }
    for marker in next {
        let id = marker.id.get();
        match prev.iter().find(|m| m.id == marker.id) {
            None => {
                out.push(DomPatch::SpawnMarker {
                    id,
                    x: marker.x,
                    y: marker.y,
                });
                if marker.active {
                    out.push(DomPatch::MarkerActive { id, active: true });
                }
            }
            Some(old) if old.active != marker.active => {
                out.push(DomPatch::MarkerActive {
                    id,
                    active: marker.active,
                });
            }
            Some(_) => {}
        }
    }
}

fn loader_patch(phase: LoaderPhase) -> DomPatch {
    match phase.opacity() {
        Some(opacity) => DomPatch::LoaderOpacity { opacity },
        None => DomPatch::RemoveLoader,
    }
}

/// Patches that turn the `prev` presentation into `next`.
///
/// `prev = None` produces a full patch set.
#[must_use]
pub fn diff_snapshots(prev: Option<&ViewSnapshot>, next: &ViewSnapshot) -> Vec<DomPatch> {
    // A deck never changes length; a mismatch means the host swapped widgets.
    let prev = prev.filter(|p| p.pages.len() == next.pages.len());
    let mut out = Vec::new();

    for page in &next.pages {
        page_patches(prev.and_then(|p| p.page(page.index)), page, &mut out);
    }

    if prev.is_none_or(|p| p.book_open != next.book_open) {
        out.push(DomPatch::BookOpen {
            open: next.book_open,
        });
    }
    if prev.is_none_or(|p| p.zones.prev != next.zones.prev) {
        out.push(DomPatch::ZoneVisible {
            zone: Zone::Prev,
            visible: next.zones.prev,
        });
    }
    if prev.is_none_or(|p| p.zones.next != next.zones.next) {
        out.push(DomPatch::ZoneVisible {
            zone: Zone::Next,
            visible: next.zones.next,
        });
    }

    if prev.is_some_and(|p| next.cue_count > p.cue_count) {
        out.push(DomPatch::PlayCue);
    }

    marker_patches(
        prev.map_or(&[][..], |p| p.markers.as_slice()),
        &next.markers,
        &mut out,
    );

    if prev.is_none_or(|p| p.loader != next.loader) {
        out.push(loader_patch(next.loader));
    }

    out
}
