//! Logging setup for the command-line tool.
//!
//! Log lines go to stderr so rendered URLs and decoded bids on stdout stay
//! machine-readable.

use std::io;

use clap::ValueEnum;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Log format configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format.
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Determines log format from the `LOG_FORMAT` environment variable.
    ///
    /// `json` selects [`LogFormat::Json`]; anything else, including an unset
    /// variable, selects [`LogFormat::Pretty`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_name(&std::env::var("LOG_FORMAT").unwrap_or_default())
    }

    fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Filter used when `RUST_LOG` is unset: `info`, or `debug` when verbose.
fn default_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `verbose`. Span close events are logged
/// so `make_requests`, `make_bids` and `decode` report their timing.
pub fn init_observability(format: LogFormat, verbose: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    let registry = tracing_subscriber::registry().with(filter);
    let layer = fmt::layer().with_span_events(FmtSpan::CLOSE).with_writer(io::stderr);

    match format {
        LogFormat::Pretty => registry.with(layer).init(),
        LogFormat::Json => registry.with(layer.json().with_span_list(true)).init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_name() {
        assert_eq!(LogFormat::from_name("json"), LogFormat::Json);
        assert_eq!(LogFormat::from_name(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::from_name("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::from_name(""), LogFormat::Pretty);
        assert_eq!(LogFormat::from_name("xml"), LogFormat::Pretty);
    }

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(false), "info");
        assert_eq!(default_filter(true), "debug");
    }
}
