use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub const FILTER_PREFIX: &str = "filtered_";
pub const REFACTOR_PREFIX: &str = "refactored_";

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Extract configured columns and device codes from floor-plan metering CSV exports",
    long_about = None
)]
pub struct Cli {
    /// Run configuration (log level, log file, input/output directories).
    /// Defaults to `config.yaml` when present
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Override the configured log level (DEBUG, INFO, WARNING, ERROR, CRITICAL)
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,
    /// Override the configured log file
    #[arg(long = "log-file", global = true)]
    pub log_file: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Keep only the columns mapped to each file's name keyword
    Filter(FilterArgs),
    /// Extract rows whose content is a recognized device code.
    ///
    /// Record ids are SHA-256 digests of content, x, y, z and layer. They do
    /// not match MD5-based ids from earlier extraction scripts.
    Refactor(RefactorArgs),
    /// Show which column mapping each file name resolves to
    Resolve(ResolveArgs),
    /// List the configured column mappings
    Mappings(MappingsArgs),
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Filter(_) => "filter",
            Commands::Refactor(_) => "refactor",
            Commands::Resolve(_) => "resolve",
            Commands::Mappings(_) => "mappings",
        }
    }

    /// Whether the command runs a batch over the configured directories.
    pub fn is_batch(&self) -> bool {
        matches!(self, Commands::Filter(_) | Commands::Refactor(_))
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct DirArgs {
    /// Directory holding the input CSV files (overrides paths.input_dir)
    #[arg(short = 'i', long = "input-dir")]
    pub input_dir: Option<PathBuf>,
    /// Directory receiving the output CSV files (overrides paths.output_dir)
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct FilterArgs {
    #[command(flatten)]
    pub dirs: DirArgs,
    /// Column mapping file with a `csv_columns_mapping` section
    #[arg(short, long)]
    pub mapping: Option<PathBuf>,
    /// Prefix prepended to each output file name
    #[arg(long, default_value = FILTER_PREFIX)]
    pub prefix: String,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct RefactorArgs {
    #[command(flatten)]
    pub dirs: DirArgs,
    /// Device pattern file with a `pattern_mapping` section
    #[arg(short, long)]
    pub patterns: Option<PathBuf>,
    /// Prefix prepended to each output file name
    #[arg(long, default_value = REFACTOR_PREFIX)]
    pub prefix: String,
    /// Leave CSV files already in the output directory in place
    #[arg(long = "keep-existing")]
    pub keep_existing: bool,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ResolveArgs {
    /// Column mapping file with a `csv_columns_mapping` section
    #[arg(short, long)]
    pub mapping: Option<PathBuf>,
    /// File names to resolve
    #[arg(required = true)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct MappingsArgs {
    /// Column mapping file with a `csv_columns_mapping` section
    #[arg(short, long)]
    pub mapping: Option<PathBuf>,
}
