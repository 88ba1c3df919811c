//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};

/// opencodebar - AI provider usage at a glance.
#[derive(Parser, Debug)]
#[command(name = "opencodebar")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    // === Global flags ===
    /// Output format
    #[arg(long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log level
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit JSONL logs to stderr
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Output format requested on the command line, if any.
    #[must_use]
    pub const fn requested_format(&self) -> Option<OutputFormat> {
        if self.json {
            Some(OutputFormat::Json)
        } else {
            self.format
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show usage for every available provider (default command)
    Usage(UsageArgs),

    /// List known providers and whether credentials were found for them
    Providers,
}

/// Arguments for the `usage` command.
#[derive(Parser, Debug, Default, Clone)]
pub struct UsageArgs {
    /// Only query this provider (CLI or display name)
    #[arg(long, value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Attach end-of-month forecasts to providers with history
    #[arg(long)]
    pub predict: bool,

    /// Per-provider deadline in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Human,
    /// JSON output
    Json,
}

impl OutputFormat {
    /// Parse a format name as used in config and environment.
    #[must_use]
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "human" | "text" => Some(Self::Human),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}
