pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod inspect;
pub mod io_utils;
pub mod patterns;
pub mod projector;
pub mod refactor;
pub mod resolver;
pub mod table;
pub mod yaml_provider;

use std::{
    env,
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::OnceLock,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands},
    config::{AppConfig, DEFAULT_CONFIG_FILE, parse_log_level},
};

static LOGGER: OnceLock<()> = OnceLock::new();

const LOG_DIR: &str = "logs";

/// Writes every log line to stderr and, when configured, appends it to a file.
struct TeeWriter {
    console: io::Stderr,
    file: Option<File>,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.console.write_all(buf)?;
        if let Some(file) = self.file.as_mut() {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.console.flush()?;
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Creating log directory {parent:?}"))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Opening log file {path:?}"))
}

/// Installs the process-wide logger once. `RUST_LOG`, when set, takes
/// precedence over `level`. Later calls are no-ops.
pub fn init_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<()> {
    let file = log_file.map(open_log_file).transpose()?;
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("metering_csv", level);
        }
        builder
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{} - {} - {} - {}",
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                    record.level(),
                    record.target(),
                    record.args()
                )
            })
            .target(env_logger::Target::Pipe(Box::new(TeeWriter {
                console: io::stderr(),
                file,
            })));
        let _ = builder.try_init();
    });
    Ok(())
}

/// Loads the run configuration. An explicit `--config` must exist; the
/// implicit `config.yaml` may be absent, since batch commands can still run
/// when both directories are passed on the command line.
fn load_config(explicit: Option<&Path>) -> Result<(AppConfig, Option<PathBuf>)> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !fallback.exists() {
                return Ok((AppConfig::default(), None));
            }
            fallback
        }
    };
    let config =
        AppConfig::load(&path).with_context(|| format!("Loading configuration from {path:?}"))?;
    Ok((config, Some(path)))
}

fn log_destination(cli: &Cli, config: &AppConfig) -> Option<PathBuf> {
    cli.log_file
        .clone()
        .or_else(|| config.log_file.clone())
        .or_else(|| {
            cli.command
                .is_batch()
                .then(|| Path::new(".").join(LOG_DIR).join(format!("{}.log", cli.command.name())))
        })
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let (config, config_path) = load_config(cli.config.as_deref())?;
    let level = match cli.log_level.as_deref() {
        Some(raw) => parse_log_level(raw)?,
        None => config.level_filter()?,
    };
    let log_file = log_destination(&cli, &config);
    init_logging(level, log_file.as_deref())?;
    match &config_path {
        Some(path) => debug!("Configuration loaded from {path:?}"),
        None => debug!("No {DEFAULT_CONFIG_FILE} found, using defaults"),
    }

    info!("Starting {}", cli.command.name());
    let outcome = match &cli.command {
        Commands::Filter(args) => filter::execute(args, &config),
        Commands::Refactor(args) => refactor::execute(args, &config),
        Commands::Resolve(args) => inspect::execute_resolve(args),
        Commands::Mappings(args) => inspect::execute_mappings(args),
    };
    if outcome.is_ok() {
        info!("Finished {}", cli.command.name());
    }
    outcome
}
