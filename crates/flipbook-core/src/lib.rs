#![forbid(unsafe_code)]

//! Core: page deck, navigation, search filtering, and timed decorations.
//!
//! # Role in the flipbook
//! `flipbook-core` owns every piece of widget state. It never touches a
//! display surface: hosts feed it [`event::Event`] values and monotonic time,
//! then read a [`view::ViewSnapshot`] back and apply it however they render.
//!
//! # Primary responsibilities
//! - **Deck**: the fixed ordered pages with flipped/filtered flags and derived
//!   stack order.
//! - **Navigation**: nearest-visible page scanning, flip bookkeeping, and the
//!   deferred stack settle.
//! - **Filter**: case-insensitive substring search over page tags.
//! - **Effects / loader**: short-lived click markers and the startup overlay.
//! - **Scheduler**: single-threaded cooperative timers with cancellation.
//!
//! # How it fits in the system
//! `flipbook-web` wraps a [`widget::Flipbook`] with a deterministic clock and
//! turns snapshots into DOM patches; `flipbook-wasm` exports that to JS.

pub mod config;
pub mod deck;
pub mod effects;
pub mod event;
pub mod filter;
pub mod loader;
pub mod navigation;
pub mod page;
pub mod scheduler;
pub mod view;
pub mod widget;

pub use config::{FlipbookConfig, SettlePolicy, Timings};
pub use deck::Deck;
pub use event::{Direction, Event, KeyCode, Zone};
pub use navigation::{NavigateOutcome, ZonePolicy, Zones};
pub use page::{Page, PageRole};
pub use view::ViewSnapshot;
pub use widget::{Flipbook, FlipbookError};
