//! Typed configuration loaded from YAML.
//!
//! Three files drive a run:
//!
//! - `config.yaml` ([`AppConfig`]): log level, optional log file, and the
//!   input/output directories.
//! - `private.yaml` ([`ColumnMappings`]): `csv_columns_mapping`, keyword to
//!   column list. A `default` entry is mandatory and checked at load time.
//! - `pattern.yaml`: device patterns, see [`crate::patterns`].
//!
//! Mapping order is preserved as declared in the file because it breaks ties
//! between equally long keywords.

use std::{fmt, marker::PhantomData, path::Path, path::PathBuf};

use log::LevelFilter;
use serde::{
    Deserialize, Deserializer,
    de::{MapAccess, Visitor},
};

use crate::{error::ConfigError, yaml_provider};

pub const DEFAULT_KEYWORD: &str = "default";
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
pub const DEFAULT_MAPPING_FILE: &str = "private.yaml";
pub const DEFAULT_PATTERN_FILE: &str = "pattern.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    #[serde(default)]
    pub input_dir: Option<PathBuf>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        yaml_provider::load_from_path(path)
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        match self.log_level.as_deref() {
            Some(raw) => parse_log_level(raw),
            None => Ok(LevelFilter::Info),
        }
    }
}

/// Directories for one batch run, after command-line overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl RunSettings {
    pub fn resolve(
        input_dir: Option<&Path>,
        output_dir: Option<&Path>,
        config: &AppConfig,
    ) -> Result<Self, ConfigError> {
        let input_dir = input_dir
            .map(Path::to_path_buf)
            .or_else(|| config.paths.input_dir.clone())
            .ok_or(ConfigError::MissingSetting("paths.input_dir"))?;
        let output_dir = output_dir
            .map(Path::to_path_buf)
            .or_else(|| config.paths.output_dir.clone())
            .ok_or(ConfigError::MissingSetting("paths.output_dir"))?;
        Ok(Self {
            input_dir,
            output_dir,
        })
    }
}

/// Accepts the level names used by the export tooling (`WARNING`, `CRITICAL`)
/// alongside the `log` crate's own spellings.
pub fn parse_log_level(raw: &str) -> Result<LevelFilter, ConfigError> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Ok(LevelFilter::Trace),
        "DEBUG" => Ok(LevelFilter::Debug),
        "INFO" => Ok(LevelFilter::Info),
        "WARN" | "WARNING" => Ok(LevelFilter::Warn),
        "ERROR" | "CRITICAL" | "FATAL" => Ok(LevelFilter::Error),
        "OFF" | "NONE" => Ok(LevelFilter::Off),
        _ => Err(ConfigError::UnknownLogLevel(raw.to_string())),
    }
}

/// Columns to keep for files matching one keyword.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ColumnMapping {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct ColumnMappings {
    entries: Vec<(String, ColumnMapping)>,
}

#[derive(Deserialize)]
struct MappingFile {
    #[serde(default)]
    csv_columns_mapping: OrderedEntries<ColumnMapping>,
}

impl ColumnMappings {
    /// Builds mappings without validation; [`ColumnMappings::load`] is the
    /// checked entry point.
    pub fn new(entries: Vec<(String, ColumnMapping)>) -> Self {
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(path, &raw)
    }

    pub fn from_yaml_str(origin: &Path, raw: &str) -> Result<Self, ConfigError> {
        let file: MappingFile = yaml_provider::from_str(origin, raw)?;
        let mappings = Self::new(file.csv_columns_mapping.0);
        if mappings.default_mapping().is_none() {
            return Err(ConfigError::MissingDefault {
                path: origin.to_path_buf(),
            });
        }
        Ok(mappings)
    }

    pub fn default_mapping(&self) -> Option<&ColumnMapping> {
        self.get(DEFAULT_KEYWORD)
    }

    pub fn get(&self, keyword: &str) -> Option<&ColumnMapping> {
        self.entries
            .iter()
            .find(|(key, _)| key == keyword)
            .map(|(_, mapping)| mapping)
    }

    /// Keyword entries in declaration order, excluding `default`.
    pub fn keywords(&self) -> impl Iterator<Item = (&str, &ColumnMapping)> {
        self.entries
            .iter()
            .filter(|(key, _)| key != DEFAULT_KEYWORD)
            .map(|(key, mapping)| (key.as_str(), mapping))
    }

    /// All entries in declaration order, `default` included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnMapping)> {
        self.entries
            .iter()
            .map(|(key, mapping)| (key.as_str(), mapping))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A YAML mapping read as a list of entries, keeping file order. Later
/// duplicates of a key are dropped.
#[derive(Debug, Clone)]
pub(crate) struct OrderedEntries<T>(pub(crate) Vec<(String, T)>);

impl<T> Default for OrderedEntries<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OrderedEntries<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = OrderedEntries<T>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a mapping of names to entries")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(OrderedEntries::default())
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries: Vec<(String, T)> =
                    Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, T>()? {
                    if entries.iter().any(|(existing, _)| *existing == key) {
                        continue;
                    }
                    entries.push((key, value));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_any(EntriesVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPPING_YAML: &str = r#"
csv_columns_mapping:
  B2能耗计量:
    columns: [type, content, x, y]
    description: basement level 2 meters
  L1能耗计量:
    columns: [content, layer]
  default:
    columns: [type, color, content, layer, x, y, z]
    description: fallback
"#;

    #[test]
    fn mappings_keep_declaration_order() {
        let mappings =
            ColumnMappings::from_yaml_str(Path::new("private.yaml"), MAPPING_YAML).unwrap();
        let keys = mappings.iter().map(|(key, _)| key).collect::<Vec<_>>();
        assert_eq!(keys, vec!["B2能耗计量", "L1能耗计量", "default"]);
        let keywords = mappings.keywords().map(|(key, _)| key).collect::<Vec<_>>();
        assert_eq!(keywords, vec!["B2能耗计量", "L1能耗计量"]);
        assert_eq!(mappings.get("L1能耗计量").unwrap().description, "");
    }

    #[test]
    fn mappings_without_default_are_rejected() {
        let raw = "csv_columns_mapping:\n  B1能耗计量:\n    columns: [x]\n";
        let err = ColumnMappings::from_yaml_str(Path::new("private.yaml"), raw).unwrap_err();
        assert!(matches!(err, ConfigError::MissingDefault { .. }));
    }

    #[test]
    fn empty_mapping_section_is_rejected() {
        let err = ColumnMappings::from_yaml_str(Path::new("private.yaml"), "csv_columns_mapping:\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingDefault { .. }));
    }

    #[test]
    fn malformed_columns_surface_as_config_error() {
        let raw = "csv_columns_mapping:\n  default:\n    columns: 12\n";
        let err = ColumnMappings::from_yaml_str(Path::new("private.yaml"), raw).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn log_levels_accept_python_style_names() {
        assert_eq!(parse_log_level("WARNING").unwrap(), LevelFilter::Warn);
        assert_eq!(parse_log_level("critical").unwrap(), LevelFilter::Error);
        assert_eq!(parse_log_level(" debug ").unwrap(), LevelFilter::Debug);
        assert!(matches!(
            parse_log_level("LOUD"),
            Err(ConfigError::UnknownLogLevel(_))
        ));
    }

    #[test]
    fn app_config_paths_are_optional() {
        let config: AppConfig =
            yaml_provider::from_str(Path::new("config.yaml"), "log_level: DEBUG\n").unwrap();
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Debug);
        assert!(config.paths.input_dir.is_none());
        assert!(config.log_file.is_none());
    }

    #[test]
    fn run_settings_prefer_command_line_directories() {
        let config: AppConfig = yaml_provider::from_str(
            Path::new("config.yaml"),
            "paths:\n  input_dir: ./input\n  output_dir: ./output\n",
        )
        .unwrap();
        let settings = RunSettings::resolve(Some(Path::new("/data/in")), None, &config).unwrap();
        assert_eq!(settings.input_dir, PathBuf::from("/data/in"));
        assert_eq!(settings.output_dir, PathBuf::from("./output"));

        let err = RunSettings::resolve(None, None, &AppConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSetting("paths.input_dir")));
    }
}
