//! Logging setup using tracing.
//!
//! This module provides consistent logging configuration across snapvault.

use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parse a log level from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Logging configuration.
pub struct LogConfig {
    /// Whether to print logs to stderr.
    pub print: bool,
    /// Log level.
    pub level: LogLevel,
    /// Whether to include file/line info in logs.
    pub include_location: bool,
    /// Log file path (if any). Takes precedence over `print`.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            print: true,
            level: LogLevel::Warn,
            include_location: false,
            file: None,
        }
    }
}

impl LogConfig {
    /// Build the filter directive for this configuration.
    ///
    /// `RUST_LOG` wins over the configured level when set.
    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
    }
}

/// Initialize logging with the given configuration.
///
/// This should be called once at application startup. A second call is a
/// no-op; only opening the log file can fail.
pub fn init(config: LogConfig) -> std::io::Result<()> {
    let subscriber = tracing_subscriber::registry().with(config.filter());

    if let Some(path) = &config.file {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let fmt_layer = fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(file);
        let _ = subscriber.with(fmt_layer).try_init();
    } else if config.print {
        let fmt_layer = fmt::layer()
            .with_target(false)
            .with_level(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(std::io::stderr);
        let _ = subscriber.with(fmt_layer).try_init();
    } else {
        // Spans still work, output goes nowhere
        let _ = subscriber.try_init();
    }

    Ok(())
}
