//! Logging setup for the micro host binaries
//!
//! Stores, cache clients and the action logger middleware only emit
//! `tracing` events under the `libmicro` target. A host installs the
//! subscriber once, at startup, through [`LoggingConfig::init`].
//!
//! # Examples
//!
//! ```no_run
//! use libmicro::logging::{LoggingConfig, LogFormat};
//!
//! // Every dispatched action and every request, as JSON lines on stderr
//! LoggingConfig::new(LogFormat::Json, "warn".to_string(), true).init();
//! ```

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

/// Target every store and cache event is recorded under
pub const LIBRARY_TARGET: &str = "libmicro";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Plain lines, no colors
    Text,
    /// One JSON object per event
    Json,
    /// Multi-line and colored, for development
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!("Invalid log format: '{}'. Valid options: text, json, pretty", s)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
    pub verbose: bool,
}

impl LoggingConfig {
    pub fn new(format: LogFormat, level: String, verbose: bool) -> Self {
        Self { format, level, verbose }
    }

    /// Filter directives for this configuration
    ///
    /// `verbose` raises the library target to `debug`, where the action
    /// logger reports each applied action and the cache reports each
    /// request, while dependencies stay at `level`.
    pub fn directives(&self) -> String {
        if self.verbose {
            format!("{},{}=debug", self.level, LIBRARY_TARGET)
        } else {
            self.level.clone()
        }
    }

    /// Install the global subscriber on stderr. `RUST_LOG` wins over
    /// [`LoggingConfig::directives`] when set.
    pub fn init(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.directives()));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);

        let result = match self.format {
            LogFormat::Json => builder
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .try_init(),
            LogFormat::Pretty => builder.pretty().with_line_number(true).try_init(),
            LogFormat::Text => builder.with_target(false).with_ansi(false).try_init(),
        };

        // A second init in the same process keeps the first subscriber
        if let Err(e) = result {
            tracing::debug!("Logging already initialized: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);

        let err = "yaml".parse::<LogFormat>().unwrap_err();
        assert!(err.contains("Invalid log format: 'yaml'"));
    }

    #[test]
    fn test_display_parses_back() {
        for format in [LogFormat::Text, LogFormat::Json, LogFormat::Pretty] {
            assert_eq!(format.to_string().parse::<LogFormat>().unwrap(), format);
        }
    }

    #[test]
    fn test_directives() {
        let quiet = LoggingConfig::new(LogFormat::Text, "warn".to_string(), false);
        assert_eq!(quiet.directives(), "warn");

        let verbose = LoggingConfig::new(LogFormat::Text, "warn".to_string(), true);
        assert_eq!(verbose.directives(), "warn,libmicro=debug");
        assert!(EnvFilter::try_new(verbose.directives()).is_ok());
    }
}
