//! Error taxonomy shared by the resolver, the loaders and the batch drivers.
//!
//! Configuration problems are detected while loading YAML, before any input
//! file is touched. Input problems come from directory scanning and CSV
//! decoding. A requested column missing from a source file is not an error;
//! it is reported through [`crate::projector::Projection::missing`].

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed YAML in {path:?}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("no 'default' column mapping configured and no keyword matched '{file_name}'")]
    NoDefaultMapping { file_name: String },

    #[error("column mapping file {path:?} does not define a 'default' entry")]
    MissingDefault { path: PathBuf },

    #[error("pattern '{name}' has an invalid regular expression: {reason}")]
    InvalidPattern { name: String, reason: String },

    #[error("no usable device patterns defined in {path:?}")]
    NoPatterns { path: PathBuf },

    #[error("unknown log level '{0}'")]
    UnknownLogLevel(String),

    #[error("missing setting '{0}' (set it in config.yaml or pass it on the command line)")]
    MissingSetting(&'static str),
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("input directory {0:?} does not exist")]
    MissingDirectory(PathBuf),

    #[error("cannot read {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path:?} at row {row}: {source}")]
    Malformed {
        path: PathBuf,
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("unknown encoding '{0}'")]
    UnknownEncoding(String),
}
