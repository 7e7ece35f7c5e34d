#![forbid(unsafe_code)]

//! JSON input parser for host-encoded DOM inputs.
//!
//! [`parse_encoded_input_to_event`] accepts one JSON object per DOM input and
//! returns the matching widget [`Event`]. Kinds without a widget mapping
//! return `Ok(None)` so hosts can forward everything they capture.
//!
//! | kind | fields | event |
//! |---|---|---|
//! | `pointer` | `x`, `y`, optional `phase` (`down`) | `PointerDown` |
//! | `key` | `key` or `code`, optional `phase` (`down`) | `Key` |
//! | `zone` | `zone` (`prev` / `next`) | `ZoneTap` |
//! | `search` | `value` | `SearchInput` |
//! | `navigate` | `direction` (`prev` / `next`) | `Navigate` |

use flipbook_core::event::{Direction, Event, KeyCode, Zone};
use serde::Deserialize;

/// Errors from parsing encoded input JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputParseError {
    /// Malformed JSON.
    Json(String),
    /// Missing required field.
    MissingField(&'static str),
    /// Unknown phase value.
    UnknownPhase(String),
    /// A field held a value outside its vocabulary.
    UnknownValue { field: &'static str, value: String },
}

impl core::fmt::Display for InputParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Json(msg) => write!(f, "JSON parse error: {msg}"),
            Self::MissingField(field) => write!(f, "missing required field: {field}"),
            Self::UnknownPhase(phase) => write!(f, "unknown phase: {phase}"),
            Self::UnknownValue { field, value } => {
                write!(f, "unknown value for {field}: {value}")
            }
        }
    }
}

impl std::error::Error for InputParseError {}

#[derive(Debug, Deserialize)]
struct RawInput {
    kind: String,
    #[serde(default)]
    phase: Option<String>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
    #[serde(default)]
    zone: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    direction: Option<String>,
}

/// Parse one JSON-encoded host input into an [`Event`].
///
/// Returns `Ok(None)` for kinds (and phases) that have no widget meaning.
/// Returns `Err` for malformed JSON, missing fields, or unknown values.
pub fn parse_encoded_input_to_event(json: &str) -> Result<Option<Event>, InputParseError> {
    let raw: RawInput =
        serde_json::from_str(json).map_err(|e| InputParseError::Json(e.to_string()))?;

    match raw.kind.as_str() {
        "pointer" => parse_pointer_event(&raw),
        "key" => parse_key_event(&raw),
        "zone" => parse_zone_event(&raw).map(Some),
        "search" => parse_search_event(&raw).map(Some),
        "navigate" => parse_navigate_event(&raw).map(Some),
        _ => Ok(None),
    }
}

/// `true` for a press, `false` for a release, error otherwise.
fn is_press(raw: &RawInput) -> Result<bool, InputParseError> {
    match raw.phase.as_deref().unwrap_or("down") {
        "down" => Ok(true),
        "up" | "move" => Ok(false),
        other => Err(InputParseError::UnknownPhase(other.to_string())),
    }
}

fn parse_pointer_event(raw: &RawInput) -> Result<Option<Event>, InputParseError> {
    if !is_press(raw)? {
        return Ok(None);
    }
    let x = raw.x.ok_or(InputParseError::MissingField("x"))?;
    let y = raw.y.ok_or(InputParseError::MissingField("y"))?;
    if !x.is_finite() || !y.is_finite() {
        return Ok(None);
    }
    Ok(Some(Event::PointerDown { x, y }))
}

/// Map a DOM `KeyboardEvent.key` or `.code` label to a [`KeyCode`].
pub fn parse_key_code(label: &str) -> KeyCode {
    match label {
        "Left" | "ArrowLeft" => KeyCode::Left,
        "Right" | "ArrowRight" => KeyCode::Right,
        "PageUp" => KeyCode::PageUp,
        "PageDown" => KeyCode::PageDown,
        "Home" => KeyCode::Home,
        "End" => KeyCode::End,
        "Space" | "Spacebar" => KeyCode::Char(' '),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => KeyCode::Null,
            }
        }
    }
}

fn parse_key_event(raw: &RawInput) -> Result<Option<Event>, InputParseError> {
    if !is_press(raw)? {
        return Ok(None);
    }
    let key = raw.key.as_deref().filter(|s| !s.is_empty());
    let code = raw.code.as_deref().filter(|s| !s.is_empty());
    if key.is_none() && code.is_none() {
        return Err(InputParseError::MissingField("code"));
    }
    // Prefer the logical key; fall back to the physical code label.
    let parsed = key
        .map(parse_key_code)
        .filter(|k| *k != KeyCode::Null)
        .or_else(|| code.map(parse_key_code))
        .unwrap_or(KeyCode::Null);
    Ok(Some(Event::Key(parsed)))
}

fn parse_zone_event(raw: &RawInput) -> Result<Event, InputParseError> {
    let zone = raw
        .zone
        .as_deref()
        .ok_or(InputParseError::MissingField("zone"))?;
    match zone {
        "prev" | "left" => Ok(Event::ZoneTap(Zone::Prev)),
        "next" | "right" => Ok(Event::ZoneTap(Zone::Next)),
        other => Err(InputParseError::UnknownValue {
            field: "zone",
            value: other.to_string(),
        }),
    }
}

fn parse_search_event(raw: &RawInput) -> Result<Event, InputParseError> {
    let value = raw
        .value
        .as_deref()
        .ok_or(InputParseError::MissingField("value"))?;
    Ok(Event::SearchInput(value.to_string()))
}

fn parse_navigate_event(raw: &RawInput) -> Result<Event, InputParseError> {
    let direction = raw
        .direction
        .as_deref()
        .ok_or(InputParseError::MissingField("direction"))?;
    match direction {
        "next" => Ok(Event::Navigate(Direction::Next)),
        "prev" => Ok(Event::Navigate(Direction::Prev)),
        other => Err(InputParseError::UnknownValue {
            field: "direction",
            value: other.to_string(),
        }),
    }
}
