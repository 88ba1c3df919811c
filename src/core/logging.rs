//! Diagnostic logging to stderr (or a file).
//!
//! Stdout is reserved for the report itself; every log event goes to stderr
//! unless `OPENCODEBAR_LOG_FILE` redirects it. Credential values are never
//! passed to a log macro, only key names, paths and counts.

use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

pub const LOG_LEVEL_ENV: &str = "OPENCODEBAR_LOG";
pub const LOG_FORMAT_ENV: &str = "OPENCODEBAR_LOG_FORMAT";
pub const LOG_FILE_ENV: &str = "OPENCODEBAR_LOG_FILE";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable logs.
    #[default]
    Human,
    /// JSON logs (one event per line).
    Json,
    /// Compact logs (single line, terse).
    Compact,
}

impl LogFormat {
    /// Parse from string (case-insensitive).
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// Minimum level that reaches the log sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    #[default]
    Error,
}

impl LogLevel {
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "verbose" | "debug" => Some(Self::Debug),
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

/// Resolved logging setup for one process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LogLevel,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
}

impl LogSettings {
    /// Combine command-line flags with the process environment.
    #[must_use]
    pub fn from_flags(log_level: Option<&str>, json_output: bool, verbose: bool) -> Self {
        Self::resolve(log_level, json_output, verbose, |key| std::env::var(key).ok())
    }

    /// Flag beats environment beats default. `--verbose` lifts the default
    /// `error` level to `debug` but never lowers an explicit choice.
    #[must_use]
    pub fn resolve<F>(log_level: Option<&str>, json_output: bool, verbose: bool, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let explicit = log_level
            .and_then(LogLevel::from_arg)
            .or_else(|| lookup(LOG_LEVEL_ENV).as_deref().and_then(LogLevel::from_arg));
        let level = match explicit {
            Some(level) => level,
            None if verbose => LogLevel::Debug,
            None => LogLevel::default(),
        };

        let format = if json_output {
            LogFormat::Json
        } else {
            lookup(LOG_FORMAT_ENV)
                .as_deref()
                .and_then(LogFormat::from_arg)
                .unwrap_or_default()
        };

        Self {
            level,
            format,
            file: lookup(LOG_FILE_ENV).map(PathBuf::from),
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("opencodebar={}", self.level.as_filter())))
    }

    fn writer(&self) -> BoxMakeWriter {
        let file = self
            .file
            .as_ref()
            .and_then(|path| OpenOptions::new().create(true).append(true).open(path).ok());
        match file {
            Some(file) => BoxMakeWriter::new(file),
            None => BoxMakeWriter::new(std::io::stderr),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the level when set.
/// Later calls are ignored.
pub fn init(settings: &LogSettings) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(settings.filter())
        .with_writer(settings.writer());

    let installed = match settings.format {
        LogFormat::Json => builder.json().with_span_events(FmtSpan::CLOSE).try_init(),
        LogFormat::Compact => builder.compact().with_target(true).try_init(),
        LogFormat::Human => builder.with_target(false).without_time().try_init(),
    };
    if installed.is_err() {
        tracing::debug!("logging already initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn flag_beats_environment() {
        let s = LogSettings::resolve(Some("info"), false, false, env_of(&[(LOG_LEVEL_ENV, "trace")]));
        assert_eq!(s.level, LogLevel::Info);
    }

    #[test]
    fn environment_level_and_format() {
        let s = LogSettings::resolve(
            None,
            false,
            false,
            env_of(&[(LOG_LEVEL_ENV, " trace "), (LOG_FORMAT_ENV, "JSON")]),
        );
        assert_eq!(s.level, LogLevel::Trace);
        assert_eq!(s.format, LogFormat::Json);
    }

    #[test]
    fn blank_or_unknown_values_fall_back() {
        let s = LogSettings::resolve(
            None,
            false,
            false,
            env_of(&[(LOG_LEVEL_ENV, "  "), (LOG_FORMAT_ENV, "xml"), (LOG_FILE_ENV, "")]),
        );
        assert_eq!(s, LogSettings::default());
    }

    #[test]
    fn verbose_lifts_default_level_only() {
        let none = env_of(&[]);
        assert_eq!(LogSettings::resolve(None, false, true, &none).level, LogLevel::Debug);
        assert_eq!(
            LogSettings::resolve(Some("warn"), false, true, &none).level,
            LogLevel::Warn
        );
        assert_eq!(LogSettings::resolve(None, false, false, &none).level, LogLevel::Error);
    }

    #[test]
    fn json_output_flag_forces_json() {
        let s = LogSettings::resolve(None, true, false, env_of(&[(LOG_FORMAT_ENV, "compact")]));
        assert_eq!(s.format, LogFormat::Json);
    }

    #[test]
    fn log_file_from_environment() {
        let s = LogSettings::resolve(None, false, false, env_of(&[(LOG_FILE_ENV, "/tmp/ocb.log")]));
        assert_eq!(s.file, Some(PathBuf::from("/tmp/ocb.log")));
    }
}
