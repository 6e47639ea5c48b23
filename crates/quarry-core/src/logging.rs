//! Logging integration for quarry.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and for creating per-query spans.

use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter is read from `settings.log_level` (e.g. "debug", "info",
/// "quarry_db=trace"). In debug mode a pretty, human-readable format is
/// used; otherwise a structured JSON format is used. Calling this more than
/// once is harmless; the first subscriber wins.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span covering the compilation of one query.
///
/// Enter this span before resolving a query graph so that all log entries
/// emitted during resolution and SQL generation carry the query label.
///
/// # Examples
///
/// ```
/// use quarry_core::logging::query_span;
///
/// let span = query_span("villain-report");
/// let _guard = span.enter();
/// tracing::debug!("resolving query graph");
/// ```
pub fn query_span(label: &str) -> tracing::Span {
    tracing::debug_span!("query", label = label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_logging_is_idempotent() {
        let settings = Settings::default();
        setup_logging(&settings);
        setup_logging(&settings);
    }

    #[test]
    fn test_query_span() {
        let span = query_span("test");
        let _guard = span.enter();
        tracing::debug!("inside span");
    }
}
