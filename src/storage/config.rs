//! Configuration file loading and management.
//!
//! Loads configuration from:
//! - Linux: `~/.config/opencodebar/config.toml`
//! - macOS: `~/Library/Application Support/com.opencodebar.opencodebar/config.toml`
//! - Windows: `%APPDATA%/opencodebar/config/config.toml`
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. CLI flags
//! 2. Environment variables
//! 3. Config file
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `OPENCODEBAR_CONFIG`: Override config file path
//! - `OPENCODEBAR_TIMEOUT`: Per-provider deadline in seconds
//! - `OPENCODEBAR_FORMAT`: Output format (human, json)
//! - `OPENCODEBAR_PRETTY`: Pretty-print JSON output (1, true, yes, on)

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::cli::args::{Cli, OutputFormat, UsageArgs};
use crate::core::forecast::DEFAULT_OVERAGE_RATE;
use crate::core::provider::ProviderId;
use crate::error::{BarError, Result};

// =============================================================================
// Environment Variable Names
// =============================================================================

/// Environment variable to override config file path.
pub const ENV_CONFIG: &str = "OPENCODEBAR_CONFIG";
/// Environment variable for the per-provider timeout in seconds.
pub const ENV_TIMEOUT: &str = "OPENCODEBAR_TIMEOUT";
/// Environment variable for output format.
pub const ENV_FORMAT: &str = "OPENCODEBAR_FORMAT";
/// Environment variable for pretty JSON output.
pub const ENV_PRETTY: &str = "OPENCODEBAR_PRETTY";

/// Accepted range for `timeout_seconds`.
const TIMEOUT_RANGE: std::ops::RangeInclusive<u64> = 1..=300;

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Fully resolved configuration after merging CLI, env vars, and config file.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Per-provider deadline override. `None` keeps each provider's default.
    pub timeout: Option<Duration>,
    /// Output format.
    pub format: OutputFormat,
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
    /// Whether to attach forecasts.
    pub predict: bool,
    /// USD per unit beyond entitlement, for providers that bill overage.
    pub overage_rate: f64,
    /// Provider names never queried.
    pub disabled: Vec<String>,
    /// Source of each setting for debugging.
    pub sources: ConfigSources,
}

/// Tracks the source of each configuration value.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub timeout: ConfigSource,
    pub format: ConfigSource,
    pub pretty: ConfigSource,
    pub predict: ConfigSource,
}

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value from CLI flag.
    Cli,
    /// Value from environment variable.
    Env,
    /// Value from config file.
    ConfigFile,
    /// Built-in default.
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI flag"),
            Self::Env => write!(f, "environment variable"),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

impl ResolvedConfig {
    /// Resolve final configuration from CLI args, the process environment,
    /// and the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file exists but is invalid
    /// - Any resolved value is out of range
    pub fn resolve(cli: &Cli, usage_args: Option<&UsageArgs>) -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok();
        let config = match env(ENV_CONFIG) {
            Some(path) => Config::load_from(Path::new(&path))?,
            None => Config::load()?,
        };
        Self::resolve_with(cli, usage_args, &config, env)
    }

    /// Resolve against an explicit config and environment lookup.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the file or an override is invalid.
    pub fn resolve_with<F>(
        cli: &Cli,
        usage_args: Option<&UsageArgs>,
        config: &Config,
        env: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        config.validate()?;

        let mut sources = ConfigSources::default();
        let timeout = Self::resolve_timeout(usage_args, config, &env, &mut sources.timeout)?;
        let format = Self::resolve_format(cli, config, &env, &mut sources.format)?;
        let pretty = Self::resolve_pretty(cli, config, &env, &mut sources.pretty);
        let predict = Self::resolve_predict(usage_args, config, &mut sources.predict);

        Ok(Self {
            timeout,
            format,
            pretty,
            predict,
            overage_rate: config.forecast.overage_rate,
            disabled: config.providers.disabled.clone(),
            sources,
        })
    }

    /// Resolve timeout setting.
    fn resolve_timeout<F>(
        usage_args: Option<&UsageArgs>,
        config: &Config,
        env: &F,
        source: &mut ConfigSource,
    ) -> Result<Option<Duration>>
    where
        F: Fn(&str) -> Option<String>,
    {
        // 1. CLI --timeout
        if let Some(secs) = usage_args.and_then(|a| a.timeout) {
            *source = ConfigSource::Cli;
            return Self::checked_timeout("--timeout", secs).map(Some);
        }

        // 2. Environment variable
        if let Some(raw) = env(ENV_TIMEOUT) {
            let secs = raw.trim().parse::<u64>().map_err(|_| BarError::ConfigInvalid {
                key: ENV_TIMEOUT.to_string(),
                message: format!("expected whole seconds, got '{raw}'"),
            })?;
            *source = ConfigSource::Env;
            return Self::checked_timeout(ENV_TIMEOUT, secs).map(Some);
        }

        // 3. Config file
        if let Some(secs) = config.general.timeout_seconds {
            *source = ConfigSource::ConfigFile;
            return Ok(Some(Duration::from_secs(secs)));
        }

        // 4. Per-provider defaults
        *source = ConfigSource::Default;
        Ok(None)
    }

    fn checked_timeout(key: &str, secs: u64) -> Result<Duration> {
        if TIMEOUT_RANGE.contains(&secs) {
            Ok(Duration::from_secs(secs))
        } else {
            Err(BarError::ConfigInvalid {
                key: key.to_string(),
                message: "timeout must be between 1 and 300 seconds".to_string(),
            })
        }
    }

    /// Resolve output format setting.
    fn resolve_format<F>(
        cli: &Cli,
        config: &Config,
        env: &F,
        source: &mut ConfigSource,
    ) -> Result<OutputFormat>
    where
        F: Fn(&str) -> Option<String>,
    {
        // 1. CLI --json / --format
        if let Some(format) = cli.requested_format() {
            *source = ConfigSource::Cli;
            return Ok(format);
        }

        // 2. Environment variable
        if let Some(raw) = env(ENV_FORMAT) {
            *source = ConfigSource::Env;
            return Self::parse_format(ENV_FORMAT, &raw);
        }

        // 3. Config file
        if let Some(ref raw) = config.output.format {
            *source = ConfigSource::ConfigFile;
            return Self::parse_format("output.format", raw);
        }

        // 4. Default
        *source = ConfigSource::Default;
        Ok(OutputFormat::Human)
    }

    fn parse_format(key: &str, raw: &str) -> Result<OutputFormat> {
        OutputFormat::from_name(raw).ok_or_else(|| BarError::ConfigInvalid {
            key: key.to_string(),
            message: format!("invalid format '{raw}'. Valid formats: human, json"),
        })
    }

    /// Resolve pretty setting.
    fn resolve_pretty<F>(cli: &Cli, config: &Config, env: &F, source: &mut ConfigSource) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        if cli.pretty {
            *source = ConfigSource::Cli;
            return true;
        }

        if let Some(raw) = env(ENV_PRETTY) {
            *source = ConfigSource::Env;
            return is_truthy(&raw);
        }

        if config.output.pretty {
            *source = ConfigSource::ConfigFile;
            return true;
        }

        *source = ConfigSource::Default;
        false
    }

    /// Resolve forecast setting.
    fn resolve_predict(
        usage_args: Option<&UsageArgs>,
        config: &Config,
        source: &mut ConfigSource,
    ) -> bool {
        if usage_args.is_some_and(|a| a.predict) {
            *source = ConfigSource::Cli;
            return true;
        }

        if config.forecast.enabled {
            *source = ConfigSource::ConfigFile;
            return true;
        }

        *source = ConfigSource::Default;
        false
    }
}

/// Whether a flag-like value is set to a truthy value.
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// =============================================================================
// Config File
// =============================================================================

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings.
    pub general: GeneralConfig,
    /// Forecast settings.
    pub forecast: ForecastConfig,
    /// Provider selection.
    pub providers: ProvidersConfig,
    /// Output settings.
    pub output: OutputConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Per-provider deadline in seconds. Unset keeps each provider's default.
    pub timeout_seconds: Option<u64>,
}

/// Forecast settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Attach forecasts without `--predict`.
    pub enabled: bool,
    /// USD per unit beyond entitlement, for providers that bill overage.
    pub overage_rate: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            overage_rate: DEFAULT_OVERAGE_RATE,
        }
    }
}

/// Provider selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Providers never queried, by CLI or display name.
    pub disabled: Vec<String>,
}

/// Output formatting configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format (human, json).
    pub format: Option<String>,
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
}

impl Config {
    /// Load configuration from the default config file path.
    ///
    /// Returns default config if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error only if the file exists but is invalid.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().config_file())
    }

    /// Load configuration from a specific path.
    ///
    /// Returns default config if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error only if the file exists but is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "Loading config file");
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| BarError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Validate configuration values.
    ///
    /// Checks that:
    /// - Timeout is within 1-300 seconds
    /// - The overage rate is finite and not negative
    /// - Output format is valid (human, json)
    /// - Disabled provider names are known
    ///
    /// # Errors
    ///
    /// Returns [`BarError::ConfigInvalid`] for the first bad value.
    pub fn validate(&self) -> Result<()> {
        if let Some(secs) = self.general.timeout_seconds
            && !TIMEOUT_RANGE.contains(&secs)
        {
            return Err(BarError::ConfigInvalid {
                key: "general.timeout_seconds".to_string(),
                message: "timeout must be between 1 and 300 seconds".to_string(),
            });
        }

        let rate = self.forecast.overage_rate;
        if !rate.is_finite() || rate < 0.0 {
            return Err(BarError::ConfigInvalid {
                key: "forecast.overage_rate".to_string(),
                message: format!("must be a non-negative number, got {rate}"),
            });
        }

        if let Some(format) = &self.output.format
            && OutputFormat::from_name(format).is_none()
        {
            return Err(BarError::ConfigInvalid {
                key: "output.format".to_string(),
                message: format!("invalid format \"{format}\". Valid formats: human, json"),
            });
        }

        for name in &self.providers.disabled {
            if ProviderId::from_name(name).is_err() {
                let valid = ProviderId::ALL
                    .iter()
                    .map(|p| p.cli_name())
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(BarError::ConfigInvalid {
                    key: "providers.disabled".to_string(),
                    message: format!("unknown provider \"{name}\". Valid providers: {valid}"),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn cli(args: &[&str]) -> Cli {
        use clap::Parser;
        let mut argv = vec!["opencodebar"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn no_env() -> impl Fn(&str) -> Option<String> {
        env_of(&[])
    }

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.general.timeout_seconds.is_none());
        assert!((config.forecast.overage_rate - DEFAULT_OVERAGE_RATE).abs() < f64::EPSILON);
        assert!(config.providers.disabled.is_empty());
    }

    #[test]
    fn load_missing_file_returns_default() {
        let config = Config::load_from(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert!(config.general.timeout_seconds.is_none());
    }

    #[test]
    fn load_valid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[general]
timeout_seconds = 15

[forecast]
enabled = true
overage_rate = 0.05

[providers]
disabled = ["vertex", "Google AI Studio"]

[output]
format = "json"
pretty = true
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.general.timeout_seconds, Some(15));
        assert!(config.forecast.enabled);
        assert!((config.forecast.overage_rate - 0.05).abs() < f64::EPSILON);
        assert_eq!(config.providers.disabled.len(), 2);
        assert_eq!(config.output.format.as_deref(), Some("json"));
        assert!(config.output.pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_invalid_toml_returns_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not valid toml {{{{").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, BarError::ConfigParse { .. }));
    }

    #[test]
    fn partial_config_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[output]\npretty = true").unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert!(config.output.pretty);
        assert!(!config.forecast.enabled);
        assert!((config.forecast.overage_rate - DEFAULT_OVERAGE_RATE).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[general]\ntimeout_seconds = 20\nfuture_flag = true").unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.general.timeout_seconds, Some(20));
    }

    #[test]
    fn validate_timeout_bounds() {
        let mut config = Config::default();
        config.general.timeout_seconds = Some(0);
        assert!(config.validate().is_err());
        config.general.timeout_seconds = Some(301);
        assert!(config.validate().is_err());
        config.general.timeout_seconds = Some(1);
        assert!(config.validate().is_ok());
        config.general.timeout_seconds = Some(300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_negative_overage_rate() {
        let mut config = Config::default();
        config.forecast.overage_rate = -0.01;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("forecast.overage_rate"));
    }

    #[test]
    fn validate_unknown_disabled_provider() {
        let mut config = Config::default();
        config.providers.disabled = vec!["codex".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unknown provider"));
    }

    #[test]
    fn validate_invalid_format() {
        let mut config = Config::default();
        config.output.format = Some("md".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_source_display() {
        assert_eq!(ConfigSource::Cli.to_string(), "CLI flag");
        assert_eq!(ConfigSource::Env.to_string(), "environment variable");
        assert_eq!(ConfigSource::ConfigFile.to_string(), "config file");
        assert_eq!(ConfigSource::Default.to_string(), "default");
    }

    #[test]
    fn resolved_defaults() {
        let resolved =
            ResolvedConfig::resolve_with(&cli(&[]), None, &Config::default(), no_env()).unwrap();
        assert!(resolved.timeout.is_none());
        assert_eq!(resolved.format, OutputFormat::Human);
        assert!(!resolved.pretty);
        assert!(!resolved.predict);
        assert_eq!(resolved.sources.timeout, ConfigSource::Default);
        assert_eq!(resolved.sources.format, ConfigSource::Default);
    }

    #[test]
    fn cli_beats_env_beats_file() {
        let mut config = Config::default();
        config.general.timeout_seconds = Some(40);
        config.output.format = Some("human".to_string());

        let args = UsageArgs {
            timeout: Some(5),
            ..UsageArgs::default()
        };
        let env = env_of(&[(ENV_TIMEOUT, "9"), (ENV_FORMAT, "json")]);

        let resolved =
            ResolvedConfig::resolve_with(&cli(&[]), Some(&args), &config, &env).unwrap();
        assert_eq!(resolved.timeout, Some(Duration::from_secs(5)));
        assert_eq!(resolved.sources.timeout, ConfigSource::Cli);
        assert_eq!(resolved.format, OutputFormat::Json);
        assert_eq!(resolved.sources.format, ConfigSource::Env);

        let resolved = ResolvedConfig::resolve_with(&cli(&[]), None, &config, &env).unwrap();
        assert_eq!(resolved.timeout, Some(Duration::from_secs(9)));
        assert_eq!(resolved.sources.timeout, ConfigSource::Env);

        let resolved = ResolvedConfig::resolve_with(&cli(&[]), None, &config, no_env()).unwrap();
        assert_eq!(resolved.timeout, Some(Duration::from_secs(40)));
        assert_eq!(resolved.sources.timeout, ConfigSource::ConfigFile);
        assert_eq!(resolved.format, OutputFormat::Human);
        assert_eq!(resolved.sources.format, ConfigSource::ConfigFile);
    }

    #[test]
    fn json_flag_overrides_env_format() {
        let env = env_of(&[(ENV_FORMAT, "human")]);
        let resolved =
            ResolvedConfig::resolve_with(&cli(&["--json"]), None, &Config::default(), env)
                .unwrap();
        assert_eq!(resolved.format, OutputFormat::Json);
        assert_eq!(resolved.sources.format, ConfigSource::Cli);
    }

    #[test]
    fn invalid_env_overrides_are_errors() {
        let env = env_of(&[(ENV_TIMEOUT, "soon")]);
        assert!(ResolvedConfig::resolve_with(&cli(&[]), None, &Config::default(), env).is_err());

        let env = env_of(&[(ENV_TIMEOUT, "0")]);
        assert!(ResolvedConfig::resolve_with(&cli(&[]), None, &Config::default(), env).is_err());

        let env = env_of(&[(ENV_FORMAT, "xml")]);
        assert!(ResolvedConfig::resolve_with(&cli(&[]), None, &Config::default(), env).is_err());
    }

    #[test]
    fn cli_timeout_out_of_range() {
        let args = UsageArgs {
            timeout: Some(0),
            ..UsageArgs::default()
        };
        let err = ResolvedConfig::resolve_with(&cli(&[]), Some(&args), &Config::default(), no_env())
            .unwrap_err();
        assert!(matches!(err, BarError::ConfigInvalid { .. }));
    }

    #[test]
    fn pretty_from_env_and_file() {
        let env = env_of(&[(ENV_PRETTY, "yes")]);
        let resolved =
            ResolvedConfig::resolve_with(&cli(&[]), None, &Config::default(), env).unwrap();
        assert!(resolved.pretty);
        assert_eq!(resolved.sources.pretty, ConfigSource::Env);

        let mut config = Config::default();
        config.output.pretty = true;
        let resolved = ResolvedConfig::resolve_with(&cli(&[]), None, &config, no_env()).unwrap();
        assert!(resolved.pretty);
        assert_eq!(resolved.sources.pretty, ConfigSource::ConfigFile);
    }

    #[test]
    fn predict_from_flag_or_file() {
        let args = UsageArgs {
            predict: true,
            ..UsageArgs::default()
        };
        let resolved =
            ResolvedConfig::resolve_with(&cli(&[]), Some(&args), &Config::default(), no_env())
                .unwrap();
        assert!(resolved.predict);
        assert_eq!(resolved.sources.predict, ConfigSource::Cli);

        let mut config = Config::default();
        config.forecast.enabled = true;
        let resolved = ResolvedConfig::resolve_with(&cli(&[]), None, &config, no_env()).unwrap();
        assert!(resolved.predict);
        assert_eq!(resolved.sources.predict, ConfigSource::ConfigFile);
    }

    #[test]
    fn truthy_values() {
        for v in ["1", "true", "TRUE", "yes", "on", " on "] {
            assert!(is_truthy(v), "{v}");
        }
        for v in ["0", "false", "no", "off", ""] {
            assert!(!is_truthy(v), "{v}");
        }
    }
}
