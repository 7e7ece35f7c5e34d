#![forbid(unsafe_code)]

//! Render-agnostic view of the widget.
//!
//! A [`ViewSnapshot`] is everything a host needs to paint one frame. Hosts
//! diff consecutive snapshots rather than observing individual mutations,
//! which keeps the widget free of any display-surface dependency.

use crate::effects::MarkerId;
use crate::loader::LoaderPhase;
use crate::navigation::Zones;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Per-page presentation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageView {
    pub index: usize,
    pub stack_order: u32,
    pub flipped: bool,
    pub hidden: bool,
}

/// Per-marker presentation state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerView {
    pub id: MarkerId,
    pub x: f64,
    pub y: f64,
    pub active: bool,
}

/// Full presentation state for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub pages: Vec<PageView>,
    pub book_open: bool,
    pub zones: Zones,
    /// Markers in creation order.
    pub markers: Vec<MarkerView>,
    pub loader: LoaderPhase,
    /// Incremented every time the transition cue should play.
    pub cue_count: u64,
}

struct Fnv(u64);

impl Fnv {
    fn bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= u64::from(b);
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }

    fn u64(&mut self, v: u64) {
        self.bytes(&v.to_le_bytes());
    }

    fn flag(&mut self, v: bool) {
        self.bytes(&[u8::from(v)]);
    }
}

impl ViewSnapshot {
    /// FNV-1a 64 over every field, stable across runs and platforms.
    #[must_use]
    pub fn checksum(&self) -> u64 {
        let mut h = Fnv(FNV_OFFSET_BASIS);
        h.u64(self.pages.len() as u64);
        for page in &self.pages {
            h.u64(page.index as u64);
            h.u64(u64::from(page.stack_order));
            h.flag(page.flipped);
            h.flag(page.hidden);
        }
        h.flag(self.book_open);
        h.flag(self.zones.prev);
        h.flag(self.zones.next);
        h.u64(self.markers.len() as u64);
        for marker in &self.markers {
            h.u64(marker.id.get());
            h.u64(marker.x.to_bits());
            h.u64(marker.y.to_bits());
            h.flag(marker.active);
        }
        h.bytes(&[match self.loader {
            LoaderPhase::Shown => 0,
            LoaderPhase::Fading => 1,
            LoaderPhase::Removed => 2,
        }]);
        h.u64(self.cue_count);
        h.0
    }

    #[must_use]
    pub fn page(&self, index: usize) -> Option<&PageView> {
        self.pages.get(index)
    }
}
