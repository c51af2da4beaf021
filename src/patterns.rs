//! Device-code recognition for `content` cells.
//!
//! `pattern.yaml` declares named patterns under `pattern_mapping`:
//!
//! ```yaml
//! pattern_mapping:
//!   electric_meter:
//!     code: "AL\\d+-\\d+"
//!     abbreviation: "AL"
//! ```
//!
//! A `code` matches when the regex matches at the start of the trimmed
//! content. An `abbreviation` matches only on exact equality. Patterns are
//! tried in declaration order and the first hit wins.

use std::path::Path;

use log::warn;
use regex::Regex;
use serde::Deserialize;

use crate::{config::OrderedEntries, error::ConfigError, yaml_provider};

#[derive(Debug, Clone, Default, Deserialize)]
struct PatternEntry {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    abbreviation: Option<String>,
}

#[derive(Deserialize)]
struct PatternFile {
    #[serde(default)]
    pattern_mapping: OrderedEntries<PatternEntry>,
}

#[derive(Debug, Clone)]
pub struct DevicePattern {
    pub name: String,
    code: Option<Regex>,
    abbreviation: Option<String>,
}

impl DevicePattern {
    pub fn new(
        name: &str,
        code: Option<&str>,
        abbreviation: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let code = code
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                // Anchor at the start only; trailing text after a code is allowed.
                Regex::new(&format!("^(?:{raw})")).map_err(|err| ConfigError::InvalidPattern {
                    name: name.to_string(),
                    reason: err.to_string(),
                })
            })
            .transpose()?;
        let abbreviation = abbreviation
            .filter(|value| !value.is_empty())
            .map(|value| value.to_string());
        Ok(Self {
            name: name.to_string(),
            code,
            abbreviation,
        })
    }

    pub fn is_usable(&self) -> bool {
        self.code.is_some() || self.abbreviation.is_some()
    }

    pub fn matches(&self, content: &str) -> bool {
        if self.code.as_ref().is_some_and(|re| re.is_match(content)) {
            return true;
        }
        self.abbreviation
            .as_deref()
            .is_some_and(|abbreviation| abbreviation == content)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<DevicePattern>,
}

impl PatternSet {
    pub fn new(patterns: Vec<DevicePattern>) -> Self {
        Self { patterns }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file: PatternFile = yaml_provider::load_from_path(path)?;
        Self::from_entries(path, file.pattern_mapping)
    }

    pub fn from_yaml_str(origin: &Path, raw: &str) -> Result<Self, ConfigError> {
        let file: PatternFile = yaml_provider::from_str(origin, raw)?;
        Self::from_entries(origin, file.pattern_mapping)
    }

    fn from_entries(
        origin: &Path,
        entries: OrderedEntries<PatternEntry>,
    ) -> Result<Self, ConfigError> {
        let mut patterns = Vec::with_capacity(entries.0.len());
        for (name, entry) in entries.0 {
            let pattern =
                DevicePattern::new(&name, entry.code.as_deref(), entry.abbreviation.as_deref())?;
            if pattern.is_usable() {
                patterns.push(pattern);
            } else {
                warn!("Pattern '{name}' defines neither code nor abbreviation; ignoring it");
            }
        }
        if patterns.is_empty() {
            return Err(ConfigError::NoPatterns {
                path: origin.to_path_buf(),
            });
        }
        Ok(Self::new(patterns))
    }

    /// First pattern matching the trimmed `content`, if any.
    pub fn classify(&self, content: &str) -> Option<&DevicePattern> {
        let content = content.trim();
        if content.is_empty() {
            return None;
        }
        self.patterns.iter().find(|pattern| pattern.matches(content))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
