//! Extension Configuration
//!
//! Handles parsing and management of vunit_ext.toml configuration files.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::codec::DecodeOptions;

/// File name searched for by [`ExtConfig::find_and_load`]
pub const CONFIG_FILE_NAME: &str = "vunit_ext.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "VUNIT_EXT_CONFIG";

/// Reading or writing `vunit_ext.toml` failed
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no configuration file at {0}")]
    NotFound(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Root configuration structure matching vunit_ext.toml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExtConfig {
    /// Handle table settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Codec settings
    #[serde(default)]
    pub codec: CodecConfig,
}

impl ExtConfig {
    /// Parse the file at `path`, which must exist
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// [`find_and_load`](Self::find_and_load) from the working directory
    pub fn load_from_cwd() -> ConfigResult<Self> {
        let cwd = std::env::current_dir().map_err(ConfigError::Io)?;
        Self::find_and_load(&cwd)
    }

    /// Nearest `vunit_ext.toml` in `start_dir` or an ancestor; defaults if none
    pub fn find_and_load(start_dir: &Path) -> ConfigResult<Self> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Self::load(&config_path);
            }
            if !dir.pop() {
                return Ok(Self::default());
            }
        }
    }

    /// Configuration for the process-wide table: the file named by
    /// `VUNIT_EXT_CONFIG`, else a search from the working directory.
    /// Problems are logged and the defaults used instead.
    pub fn load_for_process() -> Self {
        let result = match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(Path::new(&path)),
            None => Self::load_from_cwd(),
        };
        result.unwrap_or_else(|e| {
            log::warn!("ignoring vunit-ext configuration: {}", e);
            Self::default()
        })
    }

    /// Write as pretty TOML, replacing any existing file
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Decoder options derived from the codec section
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            pad_short_bit_vectors: self.codec.pad_short_bit_vectors,
        }
    }
}

/// Handle table settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Slots reserved on first allocation; doubled whenever the table is full
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,

    /// Prefix of the names given to handles allocated without one
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
}

fn default_initial_capacity() -> usize {
    256
}

fn default_name_prefix() -> String {
    "<+/->".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            initial_capacity: default_initial_capacity(),
            name_prefix: default_name_prefix(),
        }
    }
}

/// Codec settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CodecConfig {
    /// Zero-pad decoded boolean/bit vector elements to 8 bytes
    #[serde(default)]
    pub pad_short_bit_vectors: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExtConfig::default();
        assert_eq!(config.storage.initial_capacity, 256);
        assert_eq!(config.storage.name_prefix, "<+/->");
        assert!(!config.codec.pad_short_bit_vectors);
        assert_eq!(config.decode_options(), DecodeOptions::default());
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
[storage]
initial_capacity = 4

[codec]
pad_short_bit_vectors = true
"#;
        let config: ExtConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.storage.initial_capacity, 4);
        assert_eq!(config.storage.name_prefix, "<+/->");
        assert!(config.decode_options().pad_short_bit_vectors);
    }

    #[test]
    fn test_empty_config() {
        let config: ExtConfig = toml::from_str("").unwrap();
        assert_eq!(config, ExtConfig::default());
    }

    #[test]
    fn test_missing_file() {
        let err = ExtConfig::load(Path::new("/nonexistent/vunit_ext.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("vunit_ext_cfg_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE_NAME);

        let mut config = ExtConfig::default();
        config.storage.name_prefix = "ptr_".to_string();
        config.save(&path).unwrap();

        let nested = dir.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        let found = ExtConfig::find_and_load(&nested).unwrap();
        assert_eq!(found, config);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
