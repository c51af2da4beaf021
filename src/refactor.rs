//! Device-record extraction: keeps only rows whose `content` is a recognized
//! device code and tags each with a content-derived id.

use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::{debug, info, warn};
use sha2::{Digest, Sha256};

use crate::{
    cli::RefactorArgs,
    config::{AppConfig, DEFAULT_PATTERN_FILE, RunSettings},
    io_utils,
    patterns::PatternSet,
    projector::SourceTable,
};

pub const OUTPUT_COLUMNS: [&str; 7] = ["id", "content", "x", "y", "z", "layer", "style"];
const CONTENT_COLUMN: &str = "content";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRecord {
    pub id: String,
    pub content: String,
    pub x: String,
    pub y: String,
    pub z: String,
    pub layer: String,
    pub style: String,
}

impl ExtractedRecord {
    pub fn new(content: &str, x: &str, y: &str, z: &str, layer: &str, style: &str) -> Self {
        Self {
            id: record_id(content, x, y, z, layer),
            content: content.to_string(),
            x: x.to_string(),
            y: y.to_string(),
            z: z.to_string(),
            layer: layer.to_string(),
            style: style.to_string(),
        }
    }

    fn into_row(self) -> Vec<String> {
        vec![
            self.id,
            self.content,
            self.x,
            self.y,
            self.z,
            self.layer,
            self.style,
        ]
    }
}

/// Lowercase hex SHA-256 of `content + x + y + z + layer`.
pub fn record_id(content: &str, x: &str, y: &str, z: &str, layer: &str) -> String {
    let mut hasher = Sha256::new();
    for part in [content, x, y, z, layer] {
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// `None` when the table has no `content` column.
pub fn extract_records(table: &SourceTable, patterns: &PatternSet) -> Option<Vec<ExtractedRecord>> {
    let column = |name: &str| table.headers.iter().position(|h| h == name);
    let content_idx = column(CONTENT_COLUMN)?;
    let [x_idx, y_idx, z_idx, layer_idx, style_idx] =
        ["x", "y", "z", "layer", "style"].map(column);
    let cell = |row: &[String], idx: Option<usize>| -> String {
        idx.and_then(|i| row.get(i)).cloned().unwrap_or_default()
    };

    let mut records = Vec::new();
    for row in &table.rows {
        let content = row.get(content_idx).map(|c| c.trim()).unwrap_or("");
        let Some(pattern) = patterns.classify(content) else {
            continue;
        };
        debug!("'{content}' recognized as {}", pattern.name);
        records.push(ExtractedRecord::new(
            content,
            &cell(row, x_idx),
            &cell(row, y_idx),
            &cell(row, z_idx),
            &cell(row, layer_idx),
            &cell(row, style_idx),
        ));
    }
    Some(records)
}

pub fn execute(args: &RefactorArgs, config: &AppConfig) -> Result<()> {
    let settings = RunSettings::resolve(
        args.dirs.input_dir.as_deref(),
        args.dirs.output_dir.as_deref(),
        config,
    )?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let pattern_path = args
        .patterns
        .clone()
        .unwrap_or_else(|| DEFAULT_PATTERN_FILE.into());
    let patterns = PatternSet::load(&pattern_path)
        .with_context(|| format!("Loading device patterns from {pattern_path:?}"))?;
    info!("Loaded {} device pattern(s)", patterns.len());

    // The input listing must succeed before any earlier output is removed.
    let files = io_utils::list_csv_files(&settings.input_dir)?;
    io_utils::ensure_dir(&settings.output_dir)?;
    if !args.keep_existing {
        info!("Clearing CSV files from {:?}", settings.output_dir);
        let removed = io_utils::clear_csv_files(&settings.output_dir);
        debug!("Removed {removed} existing file(s)");
    }

    if files.is_empty() {
        warn!("No CSV files found in {:?}", settings.input_dir);
        return Ok(());
    }

    for input in &files {
        refactor_file(input, &settings.output_dir, &args.prefix, &patterns, encoding)?;
    }
    info!("Extraction finished for {} file(s)", files.len());
    Ok(())
}

pub fn refactor_file(
    input: &Path,
    output_dir: &Path,
    prefix: &str,
    patterns: &PatternSet,
    encoding: &'static Encoding,
) -> Result<Option<usize>> {
    info!("Reading {input:?}");
    let table = io_utils::read_table(input, encoding)?;
    let Some(records) = extract_records(&table, patterns) else {
        warn!("{input:?} has no '{CONTENT_COLUMN}' column; skipping");
        return Ok(None);
    };
    if records.is_empty() {
        info!("No device codes found in {input:?}");
        return Ok(Some(0));
    }

    let file_name = input.file_name().unwrap_or_default().to_string_lossy();
    let output = output_dir.join(format!("{prefix}{file_name}"));
    let count = records.len();
    let headers = OUTPUT_COLUMNS.map(String::from);
    let rows = records
        .into_iter()
        .map(ExtractedRecord::into_row)
        .collect::<Vec<_>>();
    io_utils::write_table(&output, &headers, &rows)?;
    info!("Saved {count} record(s) to {output:?}");
    Ok(Some(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> SourceTable {
        SourceTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|v| v.to_string()).collect())
                .collect(),
        }
    }

    fn patterns() -> PatternSet {
        PatternSet::from_yaml_str(
            Path::new("pattern.yaml"),
            "pattern_mapping:\n  box:\n    code: \"AL\\\\d+\"\n    abbreviation: \"AL\"\n",
        )
        .unwrap()
    }

    #[test]
    fn record_id_is_stable_hex() {
        let id = record_id("AL1", "1.0", "2.0", "0", "E-POWR");
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(id, record_id("AL1", "1.0", "2.0", "0", "E-POWR"));
        assert_ne!(id, record_id("AL1", "1.0", "2.0", "0", "E-LITE"));
    }

    #[test]
    fn record_id_of_empty_input_is_sha256_of_nothing() {
        assert_eq!(
            record_id("", "", "", "", ""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn extracts_only_matching_rows_and_fills_missing_style() {
        let source = table(
            &["type", "content", "x", "y", "z", "layer"],
            &[
                &["TEXT", " AL3 ", "1", "2", "0", "E"],
                &["TEXT", "lobby", "3", "4", "0", "A"],
                &["TEXT", "", "5", "6", "0", "A"],
                &["TEXT", "AL", "7", "8", "0", "E"],
            ],
        );
        let records = extract_records(&source, &patterns()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].content, "AL3");
        assert_eq!(records[0].style, "");
        assert_eq!(records[0].id, record_id("AL3", "1", "2", "0", "E"));
        assert_eq!(records[1].x, "7");
    }

    #[test]
    fn missing_content_column_returns_none() {
        let source = table(&["type", "x"], &[&["TEXT", "1"]]);
        assert!(extract_records(&source, &patterns()).is_none());
    }
}
