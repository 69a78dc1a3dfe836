//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use fieldlift_promoter::RecordFormat;
use fieldlift_promoter::fluentbit::{DEFAULT_FUNCTION_NAME, DEFAULT_SCRIPT_PATH};

/// Default configuration file, used only when it exists.
pub const DEFAULT_CONFIG_PATH: &str = "fieldlift.toml";

/// fieldlift -- copy a nested log field to a top-level routing key.
///
/// Use `fieldlift <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "fieldlift", version, about, long_about = None)]
pub struct Cli {
    /// Path to the fieldlift.toml configuration file [default: fieldlift.toml].
    ///
    /// When omitted and ./fieldlift.toml does not exist, built-in defaults are used.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format for reports.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Promote the configured field on a stream of JSON records.
    Promote(PromoteArgs),

    /// Promote records and summarise which topic each would be routed to.
    Route(RouteArgs),

    /// Render collector-side configuration for the same rule.
    Export(ExportArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- shared ----

/// Options that change how records are promoted.
#[derive(Args, Debug, Default)]
pub struct PromotionOverrides {
    /// Source field path (`parent.child` or `$parent['child']`).
    #[arg(long)]
    pub source: Option<String>,

    /// Top-level key to write.
    #[arg(long)]
    pub target: Option<String>,

    /// Value written when the source field is absent.
    #[arg(long)]
    pub fallback: Option<String>,

    /// Copy empty strings, arrays and objects instead of using the fallback.
    #[arg(long)]
    pub keep_empty: bool,

    /// Input record format.
    #[arg(long)]
    pub format: Option<FormatArg>,
}

/// Input record format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Detect per line.
    Auto,
    /// One JSON object per line.
    Object,
    /// `[timestamp, record]` arrays.
    Event,
}

impl From<FormatArg> for RecordFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Auto => RecordFormat::Auto,
            FormatArg::Object => RecordFormat::Object,
            FormatArg::Event => RecordFormat::Event,
        }
    }
}

// ---- promote ----

/// Stream records from a file or stdin and write promoted records.
#[derive(Args, Debug)]
pub struct PromoteArgs {
    /// Input file (default: stdin).
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(short = 'O', long)]
    pub output_file: Option<PathBuf>,

    /// Abort on the first undecodable line instead of skipping it.
    #[arg(long)]
    pub fail_on_error: bool,

    #[command(flatten)]
    pub overrides: PromotionOverrides,
}

// ---- route ----

/// Report the per-topic record count for an input stream.
#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Input file (default: stdin).
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: PromotionOverrides,
}

// ---- export ----

/// Render collector configuration.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// What to render.
    #[arg(value_enum, value_name = "WHAT")]
    pub what: ExportTarget,

    /// Path the collector loads the Lua script from.
    #[arg(long, default_value = DEFAULT_SCRIPT_PATH)]
    pub script_path: String,

    /// Lua function name.
    #[arg(long, default_value = DEFAULT_FUNCTION_NAME)]
    pub function: String,

    /// Kafka brokers for the output section.
    #[arg(long, default_value = "kafka:9092")]
    pub brokers: String,

    /// Tag match pattern (default: processor.tag from the configuration).
    #[arg(long = "match")]
    pub match_pattern: Option<String>,

    #[command(flatten)]
    pub overrides: PromotionOverrides,
}

/// Export targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportTarget {
    /// Lua filter script.
    Lua,
    /// `[FILTER]` section.
    Filter,
    /// `[OUTPUT]` kafka section.
    Output,
    /// All of the above.
    All,
}

// ---- config ----

/// Manage fieldlift configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, promoter, routing, processor).
        #[arg(long)]
        section: Option<String>,
    },
}
