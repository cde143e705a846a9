//! Tracing setup for the service and the CLI.
//!
//! `MATCHDAY_LOG` takes an `EnvFilter` directive (`debug`,
//! `matchday::core=trace,info`, ...) and wins over `--log-level`.
//! `MATCHDAY_LOG_FORMAT` picks the output format and `MATCHDAY_LOG_FILE`
//! appends to a file instead of stderr.

use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

pub const LOG_FILTER_ENV: &str = "MATCHDAY_LOG";
pub const LOG_FORMAT_ENV: &str = "MATCHDAY_LOG_FORMAT";
pub const LOG_FILE_ENV: &str = "MATCHDAY_LOG_FILE";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per event.
    Json,
    Compact,
}

impl LogFormat {
    /// Parse case-insensitively.
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "human" | "pretty" => Some(Self::Human),
            "json" | "jsonl" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" | "verbose" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LogLevel,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
}

impl LogSettings {
    /// Combine CLI flags with the environment.
    ///
    /// `--json-output` forces JSON; otherwise `MATCHDAY_LOG_FORMAT` applies.
    /// `-v` lifts the level to at least debug.
    #[must_use]
    pub fn resolve(level: Option<LogLevel>, json_output: bool, verbose: bool) -> Self {
        let mut level = level.unwrap_or_default();
        if verbose && matches!(level, LogLevel::Info | LogLevel::Warn | LogLevel::Error) {
            level = LogLevel::Debug;
        }
        let format = if json_output {
            LogFormat::Json
        } else {
            env_value(LOG_FORMAT_ENV)
                .and_then(|v| LogFormat::from_arg(&v))
                .unwrap_or_default()
        };
        Self {
            level,
            format,
            file: env_value(LOG_FILE_ENV).map(PathBuf::from),
        }
    }

    /// `MATCHDAY_LOG` if it parses, else `matchday=<level>`.
    #[must_use]
    pub fn filter(&self) -> EnvFilter {
        env_value(LOG_FILTER_ENV)
            .and_then(|directive| EnvFilter::try_new(directive).ok())
            .unwrap_or_else(|| EnvFilter::new(format!("matchday={}", self.level.as_filter())))
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn make_writer(file: Option<&PathBuf>) -> BoxMakeWriter {
    let opened = file.and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });
    match opened {
        Some(file) => BoxMakeWriter::new(file),
        None => BoxMakeWriter::new(std::io::stderr),
    }
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(settings: &LogSettings) {
    let filter = settings.filter();
    let writer = make_writer(settings.file.as_ref());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer);

    let installed = match settings.format {
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
        LogFormat::Compact => builder.compact().with_target(true).try_init(),
        LogFormat::Human => builder.with_target(false).try_init(),
    };
    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
