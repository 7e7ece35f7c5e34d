#![forbid(unsafe_code)]

//! WASM runner for the flipbook widget.
//!
//! [`runner_core::RunnerCore`] wraps `flipbook_web::step_program::StepProgram`
//! with host-friendly entry points (millisecond clocks, JSON inputs, JSON
//! patches). On `wasm32` the `FlipbookRunner` export drives it from JS, and
//! `mount` binds it straight onto an existing page.

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{FlipbookRunner, mount};

pub mod runner_core;
