//! Logging infrastructure - structured tracing for the marshaller
//!
//! Design: Uses `tracing` for structured, contextual logging with:
//! - Configurable level, overridable through `RUST_LOG`
//! - Zero-cost when disabled (hot-path events are `trace!`)
//! - Optional JSON output and span events
//! - Optional file sink through `tracing-appender`

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use tracing::{debug, info, trace, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Global logging state (holds the file writer guard, if any)
static LOGGER: OnceCell<Option<WorkerGuard>> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse a level name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_level(self) -> Level {
        match self {
            Self::Trace => Level::TRACE,
            Self::Debug => Level::DEBUG,
            Self::Info => Level::INFO,
            Self::Warn => Level::WARN,
            Self::Error => Level::ERROR,
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default log level
    #[serde(default)]
    pub level: LogLevel,
    /// Enable JSON format (vs human-readable)
    #[serde(default)]
    pub json: bool,
    /// Show span events (enter/exit)
    #[serde(default)]
    pub show_spans: bool,
    /// Also write logs to this file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            json: false,
            show_spans: false,
            file: None,
        }
    }
}

impl LogConfig {
    /// Create high-performance config (minimal logging)
    pub fn performance() -> Self {
        Self {
            level: LogLevel::Error,
            ..Self::default()
        }
    }

    /// Create debug config (verbose logging)
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Trace,
            show_spans: true,
            ..Self::default()
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "argbridge={}",
                self.level.as_level().as_str().to_lowercase()
            ))
        })
    }
}

/// Initialize logging with configuration from the environment
pub fn init() {
    init_with_config(&crate::config::BridgeConfig::from_env().logging);
}

/// Initialize logging with custom configuration
///
/// Only the first call installs a subscriber; later calls are no-ops.
pub fn init_with_config(config: &LogConfig) {
    LOGGER.get_or_init(|| {
        let span_events = if config.show_spans {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let console = if config.json {
            fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_span_events(span_events)
                .boxed()
        } else {
            fmt::layer()
                .with_writer(io::stderr)
                .with_span_events(span_events)
                .with_target(true)
                .with_thread_ids(cfg!(debug_assertions))
                .with_line_number(cfg!(debug_assertions))
                .boxed()
        };

        let (file_layer, guard) = match &config.file {
            Some(path) => {
                let dir = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("."));
                let name = path
                    .file_name()
                    .map(|n| n.to_os_string())
                    .unwrap_or_else(|| "argbridge.log".into());
                let (writer, guard) =
                    tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
                let layer = fmt::layer().with_writer(writer).with_ansi(false).boxed();
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        // Another subscriber may already be installed (e.g. by the embedder)
        let installed = tracing_subscriber::registry()
            .with(config.filter())
            .with(console)
            .with(file_layer)
            .try_init()
            .is_ok();

        if !installed {
            return None;
        }
        guard
    });
}

/// Check if logging is initialized
pub fn is_initialized() -> bool {
    LOGGER.get().is_some()
}

// ============================================================================
// Marshalling events
// ============================================================================

/// Log converter construction
pub fn log_converter_init(buffer_capacity: usize) {
    info!(
        target: "argbridge::init",
        buffer_capacity,
        "argument converter initialized"
    );
}

/// Log start of an argument list decode
#[inline]
pub fn log_decode_start(arg_count: usize) {
    trace!(
        target: "argbridge::decode",
        args = arg_count,
        "decoding argument list"
    );
}

/// Log a completed argument list decode
#[inline]
pub fn log_decode_complete(arg_count: usize) {
    trace!(
        target: "argbridge::decode",
        args = arg_count,
        "argument list decoded"
    );
}

/// Log which string path was taken
#[inline]
pub fn log_string_path(fast: bool, utf8_len: usize) {
    trace!(
        target: "argbridge::string",
        fast,
        utf8_len,
        "string transcoded"
    );
}

/// Log creation of an emulated long
#[inline]
pub fn log_emulated_long(value: i64) {
    trace!(
        target: "argbridge::long",
        value,
        "long exceeds exact number range, emulating"
    );
}

/// Log creation of a new wrapper by the registry
pub fn log_wrapper_created(object_id: i32, class_name: &str) {
    debug!(
        target: "argbridge::registry",
        object_id,
        class_name,
        "wrapper created"
    );
}

/// Log the managed type of an argument about to be converted
pub fn log_argument_decoded(index: usize, managed_type: &str) {
    trace!(
        target: "argbridge::decode",
        index,
        managed_type,
        "decoding argument"
    );
}

/// Log a failed argument conversion
pub fn log_marshal_error(index: usize, error: &dyn std::fmt::Display) {
    warn!(
        target: "argbridge::decode",
        index,
        error = %error,
        "argument conversion failed, call aborted"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = LogConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert!(config.file.is_none());

        let perf_config = LogConfig::performance();
        assert_eq!(perf_config.level, LogLevel::Error);

        let debug_config = LogConfig::debug();
        assert_eq!(debug_config.level, LogLevel::Trace);
        assert!(debug_config.show_spans);
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!(LogLevel::parse("WARN"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse(" debug "), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("loud"), None);
        assert_eq!(LogLevel::Error.as_level(), Level::ERROR);
    }

    #[test]
    fn test_init_idempotent() {
        init_with_config(&LogConfig::performance());
        init_with_config(&LogConfig::debug()); // Should not panic
        assert!(is_initialized());
    }

    #[test]
    fn test_logging_functions() {
        // These should not panic
        log_converter_init(4096);
        log_decode_start(3);
        log_decode_complete(3);
        log_string_path(true, 5);
        log_emulated_long(i64::MAX);
        log_argument_decoded(0, "long");
        log_wrapper_created(1, "java/lang/Object");
        log_marshal_error(0, &"boom");
    }
}
