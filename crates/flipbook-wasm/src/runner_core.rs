#![forbid(unsafe_code)]

//! Platform-independent runner core wrapping [`StepProgram`].
//!
//! Shared between the wasm-bindgen exports and the native tests. No JS/WASM
//! types here.

use core::cell::RefCell;
use core::time::Duration;

use flipbook_core::config::ConfigError;
use flipbook_core::{Direction, Event, Flipbook, FlipbookConfig, FlipbookError};
use flipbook_web::patch::DomPatch;
use flipbook_web::step_program::{StepProgram, StepResult};
use serde::Deserialize;

/// Errors building a runner from host-provided JSON.
#[derive(Debug)]
pub enum RunnerError {
    /// Page tags were not a JSON array of strings or nulls.
    Tags(serde_json::Error),
    /// Mount options were not valid JSON.
    Options(serde_json::Error),
    /// Configuration failed to parse or validate.
    Config(ConfigError),
    /// The widget rejected its inputs.
    Widget(FlipbookError),
}

impl std::fmt::Display for RunnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tags(e) => write!(f, "invalid page tags: {e}"),
            Self::Options(e) => write!(f, "invalid mount options: {e}"),
            Self::Config(e) => write!(f, "invalid config: {e}"),
            Self::Widget(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RunnerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Tags(e) | Self::Options(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Widget(e) => Some(e),
        }
    }
}

impl From<ConfigError> for RunnerError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<FlipbookError> for RunnerError {
    fn from(e: FlipbookError) -> Self {
        Self::Widget(e)
    }
}

/// Where the DOM binding finds each widget role.
///
/// Every field has a default matching the stock page markup, so hosts only
/// send the selectors they changed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MountOptions {
    pub page_selector: String,
    pub wrapper_selector: String,
    pub prev_zone_selector: String,
    pub next_zone_selector: String,
    pub search_selector: String,
    pub audio_selector: String,
    pub loader_selector: String,
    /// Attribute holding a page's search tag.
    pub tag_attribute: String,
    /// Attach click listeners to the zone elements.
    ///
    /// Turn this off when the markup already calls the global navigate
    /// function from inline handlers, or every tap flips twice.
    pub wire_zones: bool,
    /// Name of the `window` function installed for external navigation.
    pub global_navigate: Option<String>,
    pub config: FlipbookConfig,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            page_selector: ".page".to_string(),
            wrapper_selector: ".book-wrapper".to_string(),
            prev_zone_selector: ".left-zone".to_string(),
            next_zone_selector: ".right-zone".to_string(),
            search_selector: "#breedSearch".to_string(),
            audio_selector: "#flipSound".to_string(),
            loader_selector: "#loader".to_string(),
            tag_attribute: "data-breed".to_string(),
            wire_zones: true,
            global_navigate: Some("navigateBook".to_string()),
            config: FlipbookConfig::default(),
        }
    }
}

impl MountOptions {
    /// Parse options; an empty or whitespace-only string yields the defaults.
    pub fn from_json(json: &str) -> Result<Self, RunnerError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let options: Self = serde_json::from_str(json).map_err(RunnerError::Options)?;
        let errors = options.config.validate();
        if !errors.is_empty() {
            return Err(RunnerError::Config(ConfigError::Validation(errors)));
        }
        Ok(options)
    }
}

/// Parse a `[tag | null, ...]` JSON array into page tags.
pub fn parse_tags(json: &str) -> Result<Vec<Option<String>>, RunnerError> {
    serde_json::from_str(json).map_err(RunnerError::Tags)
}

fn parse_direction(label: &str) -> Option<Direction> {
    match label {
        "next" => Some(Direction::Next),
        "prev" => Some(Direction::Prev),
        _ => None,
    }
}

/// Run `f` on a shared slot unless something else holds it.
///
/// DOM callbacks can fire while a frame is being applied. Such input is
/// dropped with a warning naming `what`; returns whether `f` ran.
pub fn with_slot<T>(slot: &RefCell<T>, what: &str, f: impl FnOnce(&mut T)) -> bool {
    match slot.try_borrow_mut() {
        Ok(mut inner) => {
            f(&mut inner);
            true
        }
        Err(_) => {
            tracing::warn!(target: "flipbook.web", input = what, "input dropped during frame");
            false
        }
    }
}

/// Platform-independent flipbook runner.
pub struct RunnerCore {
    inner: StepProgram,
    /// Runner-level log lines not produced by the presenter.
    cached_logs: Vec<String>,
}

impl RunnerCore {
    #[must_use]
    pub fn new(widget: Flipbook) -> Self {
        Self {
            inner: StepProgram::new(widget),
            cached_logs: Vec::new(),
        }
    }

    /// Build a runner from a JSON tag array and optional JSON config.
    pub fn from_json(tags_json: &str, config_json: Option<&str>) -> Result<Self, RunnerError> {
        let tags = parse_tags(tags_json)?;
        let config = match config_json {
            Some(json) if !json.trim().is_empty() => FlipbookConfig::from_json_str(json)?,
            _ => FlipbookConfig::default(),
        };
        Ok(Self::new(Flipbook::new(config, tags)?))
    }

    /// Initialize the widget and present the first frame.
    pub fn init(&mut self) {
        if let Err(err) = self.inner.init() {
            self.cached_logs.push(format!("runner_init_error: {err}"));
        }
    }

    /// Advance the deterministic clock by `dt_ms` milliseconds.
    pub fn advance_time_ms(&mut self, dt_ms: f64) {
        // Hosts can hand us NaN, infinities or negative spikes.
        if !dt_ms.is_finite() || dt_ms <= 0.0 {
            return;
        }
        let max_secs = Duration::MAX.as_secs_f64();
        let secs = (dt_ms / 1000.0).min(max_secs);
        let duration = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);
        self.inner.advance_time(duration);
    }

    /// Set the deterministic clock to absolute milliseconds.
    pub fn set_time_ms(&mut self, ts_ms: f64) {
        let secs = if !ts_ms.is_finite() || ts_ms <= 0.0 {
            0.0
        } else {
            (ts_ms / 1000.0).min(Duration::MAX.as_secs_f64())
        };
        let duration = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);
        self.inner.set_time(duration);
    }

    /// Parse a JSON-encoded input event and queue it.
    ///
    /// Returns `true` if the event was accepted, `false` if it was
    /// malformed or had no widget meaning.
    pub fn push_encoded_input(&mut self, json: &str) -> bool {
        match flipbook_web::input_parser::parse_encoded_input_to_event(json) {
            Ok(Some(event)) => {
                self.inner.push_event(event);
                true
            }
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(target: "flipbook.web", error = %err, "rejected encoded input");
                self.cached_logs.push(format!("input_parse_error: {err}"));
                false
            }
        }
    }

    pub fn push_event(&mut self, event: Event) {
        self.inner.push_event(event);
    }

    /// Queue a navigation request by label (`"next"` or `"prev"`).
    pub fn navigate(&mut self, label: &str) -> bool {
        match parse_direction(label) {
            Some(direction) => {
                self.inner.push_event(Event::Navigate(direction));
                true
            }
            None => {
                tracing::warn!(target: "flipbook.web", direction = label, "unknown navigate direction");
                false
            }
        }
    }

    /// Queue a search term as if typed into the search field.
    pub fn apply_filter(&mut self, term: &str) {
        self.inner.push_event(Event::SearchInput(term.to_string()));
    }

    /// Process pending events and timers, presenting if anything changed.
    pub fn step(&mut self) -> StepResult {
        if !self.inner.is_initialized() {
            self.init();
            if !self.inner.is_initialized() {
                return StepResult::default();
            }
        }
        match self.inner.step() {
            Ok(result) => result,
            Err(err) => {
                self.cached_logs.push(format!("runner_step_error: {err}"));
                StepResult {
                    running: self.inner.is_running(),
                    ..StepResult::default()
                }
            }
        }
    }

    pub fn take_patches(&mut self) -> Vec<DomPatch> {
        self.inner.take_patches()
    }

    /// Drain pending patches as a JSON array.
    pub fn take_patches_json(&mut self) -> String {
        let patches = self.inner.take_patches();
        match serde_json::to_string(&patches) {
            Ok(json) => json,
            Err(err) => {
                self.cached_logs.push(format!("patch_encode_error: {err}"));
                "[]".to_string()
            }
        }
    }

    /// Drain presenter logs followed by runner logs.
    pub fn take_logs(&mut self) -> Vec<String> {
        let mut logs = self.inner.take_logs();
        logs.append(&mut self.cached_logs);
        logs
    }

    #[must_use]
    pub fn current_page(&self) -> usize {
        self.inner.widget().current_page()
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.inner.widget().deck().len()
    }

    #[must_use]
    pub fn marker_glyph(&self) -> &str {
        &self.inner.widget().config().marker_glyph
    }

    /// Deterministic clock reading in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> f64 {
        self.inner.now().as_secs_f64() * 1000.0
    }

    #[must_use]
    pub fn frame_idx(&self) -> u64 {
        self.inner.frame_idx()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.is_running()
    }

    #[must_use]
    pub fn widget(&self) -> &Flipbook {
        self.inner.widget()
    }
}
