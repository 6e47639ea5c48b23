//! Settings for the quarry query engine.
//!
//! This module provides the [`Settings`] struct holding engine-wide
//! configuration with sensible defaults, loadable from TOML, plus a
//! globally-accessible, lazily-initialized instance.

use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::QuarryError;

/// Engine-wide configuration.
///
/// The query-safety flags here are only the *defaults* a new query graph
/// starts from; each graph can still opt in or out per query.
///
/// # Examples
///
/// ```
/// use quarry_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(!settings.blank_query_allowed);
/// assert!(!settings.cartesian_join_allowed);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether the engine runs in debug mode (pretty, verbose logging).
    pub debug: bool,
    /// The tracing filter directive (e.g. "info", "quarry_db=debug").
    pub log_level: String,
    /// Default for whether query graphs permit queries with no conditions.
    pub blank_query_allowed: bool,
    /// Default for whether query graphs permit unlinked table pairs.
    pub cartesian_join_allowed: bool,
    /// Default for whether column references use table aliases.
    pub use_table_aliases: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: "info".to_string(),
            blank_query_allowed: false,
            cartesian_join_allowed: false,
            use_table_aliases: true,
        }
    }
}

impl Settings {
    /// Parses settings from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::Settings`] if the document is not valid TOML
    /// or does not match the settings schema.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, QuarryError> {
        toml::from_str(toml_str).map_err(|e| QuarryError::Settings(e.to_string()))
    }

    /// Loads settings from a TOML file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::Settings`] if the file cannot be read or
    /// parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, QuarryError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| QuarryError::Settings(e.to_string()))?;
        Self::from_toml_str(&contents)
    }

    /// Installs this instance as the global settings.
    ///
    /// Subsequent calls are no-ops; the first installation wins.
    pub fn install(self) {
        GLOBAL_SETTINGS.set(self).ok();
    }

    /// Returns the global settings, installing defaults if none were set.
    pub fn global() -> &'static Self {
        GLOBAL_SETTINGS.get_or_init(Self::default)
    }
}

static GLOBAL_SETTINGS: OnceLock<Settings> = OnceLock::new();
