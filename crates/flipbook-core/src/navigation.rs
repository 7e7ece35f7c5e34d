#![forbid(unsafe_code)]

//! Navigation rules: target scanning, flip bookkeeping, and zone availability.
//!
//! # Flip bookkeeping
//!
//! Moving `Next` from cursor `c` to target `t` flips page `c` (the page being
//! turned past) and raises it above the deck. Moving `Prev` from `c` to `t`
//! unflips page `t` (the page being turned back) and raises it instead. Pages
//! strictly between `c` and `t` are filtered and keep their flags, so a
//! `Next` followed by a `Prev` restores every flag it touched.
//!
//! # Zone rule
//!
//! With [`ZonePolicy::RawIndex`] the forward zone is enabled whenever the
//! cursor is not on the last page of the deck, even if every later page is
//! filtered; a tap there is then a no-op. [`ZonePolicy::LastVisible`] checks
//! for an actual visible page instead.

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::deck::Deck;
use crate::event::Direction;

/// How the forward zone decides whether it is enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "kebab-case"))]
pub enum ZonePolicy {
    /// `next` iff `current < N - 1`, ignoring filters.
    #[default]
    RawIndex,
    /// `next` iff a visible page exists after `current`.
    LastVisible,
}

/// Enabled state of the two click zones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Zones {
    pub prev: bool,
    pub next: bool,
}

impl Zones {
    /// Compute zone availability for `current` over `deck`.
    #[must_use]
    pub fn compute(deck: &Deck, current: usize, policy: ZonePolicy) -> Self {
        if deck.is_empty() {
            return Self::default();
        }
        let prev = current != 0;
        let next = match policy {
            ZonePolicy::RawIndex => current < deck.len() - 1,
            ZonePolicy::LastVisible => deck.next_visible(current).is_some(),
        };
        Self { prev, next }
    }

    #[must_use]
    pub const fn allows(self, direction: Direction) -> bool {
        match direction {
            Direction::Prev => self.prev,
            Direction::Next => self.next,
        }
    }
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigateOutcome {
    /// The cursor moved; `crossed` is the page whose flip state changed.
    Moved {
        from: usize,
        to: usize,
        crossed: usize,
    },
    /// No visible page in that direction; nothing changed.
    AtBoundary,
}

impl NavigateOutcome {
    #[must_use]
    pub const fn moved(self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

/// Nearest visible target from `current` in `direction`.
#[must_use]
pub fn find_target(deck: &Deck, current: usize, direction: Direction) -> Option<usize> {
    match direction {
        Direction::Next => deck.next_visible(current),
        Direction::Prev => deck.prev_visible(current),
    }
}

/// Apply the flag changes of a flip from `from` to `to` and return the crossed page.
///
/// Does not touch the settled stack; the caller schedules that.
pub(crate) fn flip(deck: &mut Deck, from: usize, to: usize, direction: Direction) -> usize {
    let crossed = match direction {
        Direction::Next => from,
        Direction::Prev => to,
    };
    deck.raise_to_top(crossed);
    deck.set_flipped(crossed, direction == Direction::Next);
    crossed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{self, SearchTerm};
    use pretty_assertions::assert_eq;

    fn breeds() -> Deck {
        Deck::with_default_leading([
            None,
            None,
            Some("Labrador"),
            Some("Poodle"),
            Some("Beagle"),
        ])
    }

    #[test]
    fn zones_at_edges() {
        let deck = breeds();
        assert_eq!(
            Zones::compute(&deck, 0, ZonePolicy::RawIndex),
            Zones {
                prev: false,
                next: true
            }
        );
        assert_eq!(
            Zones::compute(&deck, 4, ZonePolicy::RawIndex),
            Zones {
                prev: true,
                next: false
            }
        );
    }

    #[test]
    fn raw_index_zone_stays_enabled_past_last_visible() {
        let mut deck = breeds();
        filter::apply(&mut deck, &SearchTerm::parse("oodle"));
        // Page 3 is the last visible page but not the last page.
        assert!(Zones::compute(&deck, 3, ZonePolicy::RawIndex).next);
        assert!(!Zones::compute(&deck, 3, ZonePolicy::LastVisible).next);
    }

    #[test]
    fn empty_deck_disables_both_zones() {
        let deck = Deck::with_default_leading(std::iter::empty::<Option<&str>>());
        assert_eq!(
            Zones::compute(&deck, 0, ZonePolicy::RawIndex),
            Zones::default()
        );
    }

    #[test]
    fn flip_next_marks_departing_page() {
        let mut deck = breeds();
        let crossed = flip(&mut deck, 1, 2, Direction::Next);
        assert_eq!(crossed, 1);
        assert!(deck.get(1).is_some_and(|p| p.is_flipped()));
        assert_eq!(deck.topmost(), Some(1));
    }

    #[test]
    fn flip_prev_unmarks_arriving_page() {
        let mut deck = breeds();
        deck.set_flipped(1, true);
        let crossed = flip(&mut deck, 2, 1, Direction::Prev);
        assert_eq!(crossed, 1);
        assert!(deck.get(1).is_some_and(|p| !p.is_flipped()));
    }

    #[test]
    fn find_target_respects_direction() {
        let deck = breeds();
        assert_eq!(find_target(&deck, 0, Direction::Next), Some(1));
        assert_eq!(find_target(&deck, 0, Direction::Prev), None);
        assert_eq!(find_target(&deck, 4, Direction::Next), None);
    }
}
