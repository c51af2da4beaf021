//! Keyword-driven column filtering over an input directory.
//!
//! Each CSV file is resolved to a column mapping by name, projected onto the
//! mapping's columns, and written as `<prefix><file name>` in the output
//! directory. Missing columns are warnings; an unreadable input aborts the
//! batch.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::{debug, error, info, warn};

use crate::{
    cli::FilterArgs,
    config::{AppConfig, ColumnMappings, DEFAULT_MAPPING_FILE, RunSettings},
    io_utils,
    projector::Projection,
    resolver,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Written {
        output: PathBuf,
        columns: usize,
        rows: usize,
    },
    /// The resolved mapping lists no columns.
    NoColumnsConfigured,
    /// None of the requested columns exist in the source.
    NoColumnsPresent,
}

pub fn execute(args: &FilterArgs, config: &AppConfig) -> Result<()> {
    let settings = RunSettings::resolve(
        args.dirs.input_dir.as_deref(),
        args.dirs.output_dir.as_deref(),
        config,
    )?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let mapping_path = args
        .mapping
        .clone()
        .unwrap_or_else(|| DEFAULT_MAPPING_FILE.into());
    let mappings = ColumnMappings::load(&mapping_path)
        .with_context(|| format!("Loading column mappings from {mapping_path:?}"))?;
    info!("Loaded column mappings for {} keyword(s)", mappings.len());

    io_utils::ensure_dir(&settings.output_dir)?;
    let files = io_utils::list_csv_files(&settings.input_dir)?;
    if files.is_empty() {
        warn!("No CSV files found in {:?}", settings.input_dir);
        return Ok(());
    }
    info!("Found {} CSV file(s)", files.len());

    let mut written = 0usize;
    for input in &files {
        let outcome = filter_file(input, &settings.output_dir, &args.prefix, &mappings, encoding)?;
        if matches!(outcome, FileOutcome::Written { .. }) {
            written += 1;
        }
    }
    info!(
        "Filtering finished: {written} of {} file(s) written to {:?}",
        files.len(),
        settings.output_dir
    );
    Ok(())
}

pub fn filter_file(
    input: &Path,
    output_dir: &Path,
    prefix: &str,
    mappings: &ColumnMappings,
    encoding: &'static Encoding,
) -> Result<FileOutcome> {
    let file_name = input
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    let resolution = resolver::resolve(&file_name, mappings)?;
    if resolution.is_default() {
        info!("Processing {file_name} (no keyword matched, using default mapping)");
    } else {
        info!("Processing {file_name} (keyword: {})", resolution.keyword);
    }
    if !resolution.mapping.description.is_empty() {
        info!("Mapping: {}", resolution.mapping.description);
    }

    let requested = &resolution.mapping.columns;
    if requested.is_empty() {
        warn!("No columns configured for {file_name}; skipping");
        return Ok(FileOutcome::NoColumnsConfigured);
    }
    debug!("Requested columns: {}", requested.join(", "));

    let table = io_utils::read_table(input, encoding)?;
    let projection = Projection::plan(&table.headers, requested);
    for column in projection.duplicates() {
        debug!("Column '{column}' requested more than once for {file_name}; keeping the first");
    }
    for warning in projection.warnings() {
        warn!("{file_name}: {warning}");
    }
    if projection.is_empty() {
        error!("{file_name} contains none of the requested columns; skipping");
        return Ok(FileOutcome::NoColumnsPresent);
    }

    let projected = projection.apply(&table);
    let output = output_dir.join(format!("{prefix}{file_name}"));
    io_utils::write_table(&output, &projected.headers, &projected.rows)?;
    info!(
        "Saved {output:?} ({} column(s), {} row(s))",
        projected.column_count(),
        projected.row_count()
    );
    Ok(FileOutcome::Written {
        output,
        columns: projected.column_count(),
        rows: projected.row_count(),
    })
}
