use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use serde::de::DeserializeOwned;

use crate::error::ConfigError;

pub use serde_yaml::Value as YamlValue;

pub trait YamlProvider: Send + Sync {
    fn parse_str(&self, input: &str) -> Result<YamlValue, String>;
}

struct SerdeYamlProvider;

impl YamlProvider for SerdeYamlProvider {
    fn parse_str(&self, input: &str) -> Result<YamlValue, String> {
        serde_yaml::from_str(input).map_err(|err| err.to_string())
    }
}

static YAML_PROVIDER: OnceLock<Box<dyn YamlProvider>> = OnceLock::new();

pub fn provider() -> &'static dyn YamlProvider {
    YAML_PROVIDER
        .get_or_init(|| Box::new(SerdeYamlProvider))
        .as_ref()
}

/// Install a custom YAML provider. Only the first installation takes effect.
pub fn set_provider(provider: Box<dyn YamlProvider>) -> std::result::Result<(), &'static str> {
    YAML_PROVIDER
        .set(provider)
        .map_err(|_| "YAML provider already set")
}

/// Parses YAML text into `T`, attributing failures to `origin`.
pub fn from_str<T: DeserializeOwned>(origin: &Path, raw: &str) -> Result<T, ConfigError> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let value = provider()
        .parse_str(raw)
        .map_err(|reason| ConfigError::Malformed {
            path: origin.to_path_buf(),
            reason,
        })?;
    serde_yaml::from_value(value).map_err(|err| ConfigError::Malformed {
        path: origin.to_path_buf(),
        reason: err.to_string(),
    })
}

pub fn load_from_path<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    from_str(path, &raw)
}
