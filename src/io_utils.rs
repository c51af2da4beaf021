//! File-system and CSV plumbing for the batch commands.
//!
//! - **Scanning**: `*.csv` files directly under a directory, sorted by name.
//! - **Reading**: whole-file reads into a [`SourceTable`], decoding through
//!   `encoding_rs_io` so a UTF-8 byte-order mark is dropped and other
//!   encodings can be transcoded.
//! - **Writing**: UTF-8 with a leading byte-order mark and minimal quoting,
//!   which is what spreadsheet tools on the consuming side expect.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};
use encoding_rs_io::DecodeReaderBytesBuilder;
use log::{debug, error};

use crate::{error::InputError, projector::SourceTable};

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const CSV_EXTENSION: &str = "csv";

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding, InputError> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| InputError::UnknownEncoding(value.to_string()))
    } else {
        Ok(UTF_8)
    }
}

fn is_csv(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(CSV_EXTENSION))
}

/// CSV files directly inside `dir`, sorted by file name.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>, InputError> {
    if !dir.is_dir() {
        return Err(InputError::MissingDirectory(dir.to_path_buf()));
    }
    let entries = fs::read_dir(dir).map_err(|source| InputError::Unreadable {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| InputError::Unreadable {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if is_csv(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Removes existing CSV files from `dir`. Failures are logged and skipped.
/// Returns the number of files removed.
pub fn clear_csv_files(dir: &Path) -> usize {
    let files = match list_csv_files(dir) {
        Ok(files) => files,
        Err(err) => {
            debug!("Nothing to clear in {dir:?}: {err}");
            return 0;
        }
    };
    let mut removed = 0usize;
    for path in files {
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed {:?}", path.file_name().unwrap_or_default());
                removed += 1;
            }
            Err(err) => error!("Failed to remove {path:?}: {err}"),
        }
    }
    removed
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Creating directory {dir:?}"))
}

fn open_decoded(path: &Path, encoding: &'static Encoding) -> Result<Box<dyn Read>, InputError> {
    let file = File::open(path).map_err(|source| InputError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    // UTF-8 is passed through unchanged so invalid bytes surface as csv
    // decode errors instead of replacement characters.
    let decoded = DecodeReaderBytesBuilder::new()
        .encoding(Some(encoding))
        .utf8_passthru(encoding == UTF_8)
        .strip_bom(true)
        .bom_override(true)
        .build(BufReader::new(file));
    Ok(Box::new(decoded))
}

pub fn open_csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .double_quote(true)
        .from_reader(reader)
}

/// Reads a whole CSV file. Rows keep their raw cell count; shorter rows are
/// padded by whoever indexes into them.
pub fn read_table(path: &Path, encoding: &'static Encoding) -> Result<SourceTable, InputError> {
    let mut reader = open_csv_reader(open_decoded(path, encoding)?);
    let malformed = |row: usize, source: csv::Error| InputError::Malformed {
        path: path.to_path_buf(),
        row,
        source,
    };
    let mut headers = reader
        .headers()
        .map_err(|err| malformed(1, err))?
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    if let Some(first) = headers.first_mut() {
        if let Some(stripped) = first.strip_prefix('\u{feff}') {
            *first = stripped.to_string();
        }
    }
    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|err| malformed(idx + 2, err))?;
        rows.push(record.iter().map(|v| v.to_string()).collect());
    }
    Ok(SourceTable { headers, rows })
}

pub fn open_csv_writer(path: &Path) -> Result<csv::Writer<BufWriter<File>>> {
    let mut file = BufWriter::new(
        File::create(path).with_context(|| format!("Creating output file {path:?}"))?,
    );
    file.write_all(UTF8_BOM)
        .with_context(|| format!("Writing byte-order mark to {path:?}"))?;
    Ok(csv::WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true)
        .from_writer(file))
}

pub fn write_table(path: &Path, headers: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut writer = open_csv_writer(path)?;
    writer
        .write_record(headers)
        .with_context(|| format!("Writing header to {path:?}"))?;
    for (idx, row) in rows.iter().enumerate() {
        writer
            .write_record(row)
            .with_context(|| format!("Writing row {} to {path:?}", idx + 2))?;
    }
    writer
        .flush()
        .with_context(|| format!("Flushing {path:?}"))?;
    Ok(())
}
