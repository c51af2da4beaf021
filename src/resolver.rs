//! Keyword resolution: picks the column mapping for a file from its name.
//!
//! Every configured keyword found in the file stem is a candidate. The
//! longest keyword (in characters) wins; equal lengths fall back to
//! declaration order. With no candidate the `default` mapping applies.

use std::path::Path;

use crate::{
    config::{ColumnMapping, ColumnMappings, DEFAULT_KEYWORD},
    error::ConfigError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub keyword: &'a str,
    pub mapping: &'a ColumnMapping,
}

impl Resolution<'_> {
    pub fn is_default(&self) -> bool {
        self.keyword == DEFAULT_KEYWORD
    }
}

/// File name without directory and extension. Falls back to the input when
/// the name has no usable stem.
pub fn file_stem(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file_name)
}

/// Keyword that would claim `file_name`, if any, without consulting the
/// default entry.
pub fn match_keyword<'a>(
    file_name: &str,
    mappings: &'a ColumnMappings,
) -> Option<(&'a str, &'a ColumnMapping)> {
    let stem = file_stem(file_name);
    let mut best: Option<(&'a str, &'a ColumnMapping, usize)> = None;
    for (keyword, mapping) in mappings.keywords() {
        if keyword.is_empty() || !stem.contains(keyword) {
            continue;
        }
        let length = keyword.chars().count();
        if best.is_none_or(|(_, _, best_length)| length > best_length) {
            best = Some((keyword, mapping, length));
        }
    }
    best.map(|(keyword, mapping, _)| (keyword, mapping))
}

pub fn resolve<'a>(
    file_name: &str,
    mappings: &'a ColumnMappings,
) -> Result<Resolution<'a>, ConfigError> {
    if let Some((keyword, mapping)) = match_keyword(file_name, mappings) {
        return Ok(Resolution { keyword, mapping });
    }
    mappings
        .default_mapping()
        .map(|mapping| Resolution {
            keyword: DEFAULT_KEYWORD,
            mapping,
        })
        .ok_or_else(|| ConfigError::NoDefaultMapping {
            file_name: file_name.to_string(),
        })
}
