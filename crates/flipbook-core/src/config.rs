#![forbid(unsafe_code)]

//! Widget configuration as data.
//!
//! [`FlipbookConfig::default()`] reproduces the stock widget exactly: 650 ms
//! flip settle, 50 ms + 500 ms marker window, 1000 ms + 1000 ms loader fade,
//! two fixed leading pages, raw-index zone rule.
//!
//! # Loading
//!
//! ```toml
//! settle_policy = "fire-and-forget"
//!
//! [timings]
//! flip_settle_ms = 800
//! ```
//!
//! ```rust,ignore
//! let config = FlipbookConfig::from_toml_str(text)?;
//! let config = FlipbookConfig::from_json_str(json)?;
//! ```

use core::time::Duration;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::navigation::ZonePolicy;
use crate::page::DEFAULT_FIXED_LEADING_PAGES;

/// Glyph shown by click markers.
pub const DEFAULT_MARKER_GLYPH: &str = "\u{1F43E}";

/// What happens to a pending stack settle when newer state arrives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "kebab-case"))]
pub enum SettlePolicy {
    /// A new navigation or filter cancels the pending settle.
    #[default]
    CancelPrevious,
    /// Every settle fires regardless of later state changes.
    ///
    /// A late settle can overwrite the stack order of a newer flip or filter.
    FireAndForget,
}

/// Animation timing constants, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct Timings {
    /// Delay between a flip and the stack-order settle (600 ms CSS transition + margin).
    pub flip_settle_ms: u64,
    /// How long a marker stays active after its first frame.
    pub marker_active_ms: u64,
    /// How long a deactivated marker lingers before removal.
    pub marker_linger_ms: u64,
    /// How long the loader overlay stays opaque.
    pub loader_hold_ms: u64,
    /// How long the loader fade runs before removal.
    pub loader_fade_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            flip_settle_ms: 650,
            marker_active_ms: 50,
            marker_linger_ms: 500,
            loader_hold_ms: 1000,
            loader_fade_ms: 1000,
        }
    }
}

impl Timings {
    #[must_use]
    pub const fn flip_settle(&self) -> Duration {
        Duration::from_millis(self.flip_settle_ms)
    }

    #[must_use]
    pub const fn marker_active(&self) -> Duration {
        Duration::from_millis(self.marker_active_ms)
    }

    #[must_use]
    pub const fn marker_linger(&self) -> Duration {
        Duration::from_millis(self.marker_linger_ms)
    }

    #[must_use]
    pub const fn loader_hold(&self) -> Duration {
        Duration::from_millis(self.loader_hold_ms)
    }

    #[must_use]
    pub const fn loader_fade(&self) -> Duration {
        Duration::from_millis(self.loader_fade_ms)
    }
}

/// Top-level widget configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct FlipbookConfig {
    pub timings: Timings,
    pub zone_policy: ZonePolicy,
    pub settle_policy: SettlePolicy,
    /// Leading pages exempt from search filtering.
    pub fixed_leading_pages: usize,
    pub marker_glyph: String,
}

impl Default for FlipbookConfig {
    fn default() -> Self {
        Self {
            timings: Timings::default(),
            zone_policy: ZonePolicy::default(),
            settle_policy: SettlePolicy::default(),
            fixed_leading_pages: DEFAULT_FIXED_LEADING_PAGES,
            marker_glyph: DEFAULT_MARKER_GLYPH.to_string(),
        }
    }
}

impl FlipbookConfig {
    /// Load from a TOML string and validate.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.into_validated()
    }

    /// Load from a JSON string and validate.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.into_validated()
    }

    /// Validate all parameters. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let t = &self.timings;
        if t.flip_settle_ms == 0 {
            errors.push("timings.flip_settle_ms must be > 0".to_string());
        }
        if t.marker_linger_ms == 0 {
            errors.push("timings.marker_linger_ms must be > 0".to_string());
        }
        if t.loader_fade_ms == 0 {
            errors.push("timings.loader_fade_ms must be > 0".to_string());
        }
        if self.fixed_leading_pages == 0 {
            errors.push("fixed_leading_pages must be >= 1 (the cover is never filtered)".to_string());
        }
        if self.marker_glyph.is_empty() {
            errors.push("marker_glyph must not be empty".to_string());
        }
        errors
    }

    /// Consume the config, returning it only if [`Self::validate`] passes.
    pub fn into_validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Errors from loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parse error.
    #[cfg(feature = "config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => write!(f, "validation errors: {}", errors.join("; ")),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(feature = "config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
