use crate::logging::{LogConfig, LogLevel};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default capacity of the reusable transcoding buffer, in bytes
pub const DEFAULT_BUFFER_CAPACITY: usize = 4096;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub transcoder: TranscoderConfig,

    #[serde(default)]
    pub logging: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Strings whose UTF-8 form fits are transcoded without allocating; 0
    /// disables the fast path
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            transcoder: TranscoderConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

fn default_buffer_capacity() -> usize {
    DEFAULT_BUFFER_CAPACITY
}

impl BridgeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Defaults with `ARGBRIDGE_*` environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Apply `ARGBRIDGE_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup
    ///
    /// Keys: `ARGBRIDGE_BUFFER_CAPACITY`, `ARGBRIDGE_LOG_LEVEL`,
    /// `ARGBRIDGE_LOG_FILE`, `ARGBRIDGE_LOG_JSON`, `ARGBRIDGE_LOG_SPANS`.
    /// Unparsable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(capacity) = lookup("ARGBRIDGE_BUFFER_CAPACITY")
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            self.transcoder.buffer_capacity = capacity;
        }

        if let Some(level) = lookup("ARGBRIDGE_LOG_LEVEL").and_then(|v| LogLevel::parse(&v)) {
            self.logging.level = level;
        }

        if let Some(path) = lookup("ARGBRIDGE_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(path));
        }

        if let Some(val) = lookup("ARGBRIDGE_LOG_JSON") {
            self.logging.json = is_truthy(&val);
        }

        if let Some(val) = lookup("ARGBRIDGE_LOG_SPANS") {
            self.logging.show_spans = is_truthy(&val);
        }
    }

    /// Generate default configuration file content
    pub fn generate_default() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate config"))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn is_truthy(val: &str) -> bool {
    matches!(val.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.transcoder.buffer_capacity, DEFAULT_BUFFER_CAPACITY);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[transcoder]
buffer_capacity = 64

[logging]
level = "debug"
json = true
"#;

        let config = BridgeConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.transcoder.buffer_capacity, 64);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(config.logging.json);
        assert!(!config.logging.show_spans);
    }

    #[test]
    fn test_missing_sections_take_defaults() {
        let config = BridgeConfig::from_toml_str("").unwrap();
        assert_eq!(config, BridgeConfig::default());

        let config = BridgeConfig::from_toml_str("[transcoder]\n").unwrap();
        assert_eq!(config.transcoder.buffer_capacity, DEFAULT_BUFFER_CAPACITY);
    }

    #[test]
    fn test_generate_default_parses_back() {
        let content = BridgeConfig::generate_default();
        assert!(content.contains("buffer_capacity = 4096"));

        let config = BridgeConfig::from_toml_str(&content).unwrap();
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn test_parse_error() {
        let err =
            BridgeConfig::from_toml_str("[transcoder]\nbuffer_capacity = \"big\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ARGBRIDGE_BUFFER_CAPACITY", "128"),
            ("ARGBRIDGE_LOG_LEVEL", "TRACE"),
            ("ARGBRIDGE_LOG_JSON", "1"),
            ("ARGBRIDGE_LOG_SPANS", "no"),
        ]
        .into_iter()
        .collect();

        let mut config = BridgeConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.transcoder.buffer_capacity, 128);
        assert_eq!(config.logging.level, LogLevel::Trace);
        assert!(config.logging.json);
        assert!(!config.logging.show_spans);
    }

    #[test]
    fn test_bad_override_is_ignored() {
        let mut config = BridgeConfig::default();
        config.apply_overrides(|key| {
            (key == "ARGBRIDGE_BUFFER_CAPACITY").then(|| "lots".to_string())
        });
        assert_eq!(config.transcoder.buffer_capacity, DEFAULT_BUFFER_CAPACITY);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("argbridge.toml");

        let mut config = BridgeConfig::default();
        config.transcoder.buffer_capacity = 16;
        config.save(&path).unwrap();

        let loaded = BridgeConfig::load(&path).unwrap();
        assert_eq!(loaded, config);

        let missing = BridgeConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
