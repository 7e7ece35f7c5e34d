#![forbid(unsafe_code)]

//! Canonical input events.
//!
//! Hosts translate their native input (DOM pointer/keyboard/input events,
//! test scripts, replayed traces) into [`Event`] values before handing them
//! to the widget.
//!
//! # Design Notes
//!
//! - Pointer coordinates are viewport pixels as reported by the host.
//! - A click on a navigation zone arrives twice: once as a global
//!   [`Event::PointerDown`] (spawning a marker) and once as [`Event::ZoneTap`].
//! - Only key presses reach the widget; the host drops key releases.

/// Navigation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Next,
    Prev,
}

impl Direction {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Next => Self::Prev,
            Self::Prev => Self::Next,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Prev => "prev",
        }
    }
}

/// The two click zones flanking the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    Prev,
    Next,
}

impl Zone {
    /// Direction a tap on this zone navigates.
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::Prev => Direction::Prev,
            Self::Next => Direction::Next,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prev => "prev",
            Self::Next => "next",
        }
    }
}

/// Key codes the widget understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    Char(char),
    /// Anything the host could not map.
    Null,
}

impl KeyCode {
    /// Navigation direction bound to this key, if any.
    #[must_use]
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::Right | Self::PageDown => Some(Direction::Next),
            Self::Left | Self::PageUp => Some(Direction::Prev),
            Self::Home | Self::End | Self::Char(_) | Self::Null => None,
        }
    }
}

/// Canonical widget input event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Global pointer press at viewport coordinates.
    PointerDown {
        x: f64,
        y: f64,
    },
    /// Tap on one of the navigation zones.
    ZoneTap(Zone),
    /// Keyboard press.
    Key(KeyCode),
    /// Live value of the search field.
    SearchInput(String),
    /// Navigation requested by an external control.
    Navigate(Direction),
}

impl Event {
    /// Short label used in logs and traces.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PointerDown { .. } => "pointer",
            Self::ZoneTap(_) => "zone",
            Self::Key(_) => "key",
            Self::SearchInput(_) => "search",
            Self::Navigate(_) => "navigate",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_and_page_keys_navigate() {
        assert_eq!(KeyCode::Right.direction(), Some(Direction::Next));
        assert_eq!(KeyCode::PageDown.direction(), Some(Direction::Next));
        assert_eq!(KeyCode::Left.direction(), Some(Direction::Prev));
        assert_eq!(KeyCode::PageUp.direction(), Some(Direction::Prev));
        assert_eq!(KeyCode::Char('n').direction(), None);
        assert_eq!(KeyCode::Home.direction(), None);
    }

    #[test]
    fn zones_map_to_directions() {
        assert_eq!(Zone::Prev.direction(), Direction::Prev);
        assert_eq!(Zone::Next.direction(), Direction::Next);
        assert_eq!(Direction::Next.opposite(), Direction::Prev);
    }

    #[test]
    fn event_kinds() {
        assert_eq!(Event::PointerDown { x: 1.0, y: 2.0 }.kind(), "pointer");
        assert_eq!(Event::SearchInput("poo".into()).kind(), "search");
        assert_eq!(Event::Navigate(Direction::Prev).kind(), "navigate");
    }
}
