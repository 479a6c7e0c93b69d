//! Daemon configuration with TOML file support.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use vreg_types::{Address, RegistryParams};
use vreg_utils::LogFormat;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for the `vreg` command.
///
/// Loaded from a TOML file via [`DaemonConfig::from_toml_file`]; command-line
/// flags override individual fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// Identity of the logic instance that owns the store.
    #[serde(default)]
    pub registry_address: Address,

    /// Registry administrator.
    #[serde(default)]
    pub admin: Address,

    /// Parameters a fresh store is created with.
    #[serde(default)]
    pub params: RegistryParams,

    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./vreg_data")
}

fn default_map_size() -> usize {
    64 << 20
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl DaemonConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size: default_map_size(),
            registry_address: Address::ZERO,
            admin: Address::ZERO,
            params: RegistryParams::default(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config = DaemonConfig::from_toml_str("").unwrap();
        assert_eq!(config.data_dir, PathBuf::from("./vreg_data"));
        assert_eq!(config.map_size, 64 << 20);
        assert_eq!(config.params.verifiers_per_shard, 3);
        assert_eq!(config.log_format, LogFormat::Human);
        assert!(config.admin.is_zero());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            data_dir = "/var/lib/vreg"
            registry_address = "0x1010101010101010101010101010101010101010"
            log_format = "json"

            [params]
            verifiers_per_shard = 7
        "#;
        let config = DaemonConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/vreg"));
        assert_eq!(config.registry_address, Address::repeat_byte(0x10));
        assert_eq!(config.params.verifiers_per_shard, 7);
        assert!(config.params.token_address.is_zero());
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn malformed_address_is_a_parse_error() {
        let err = DaemonConfig::from_toml_str(r#"admin = "0x12""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vreg.toml");
        let config = DaemonConfig {
            admin: Address::repeat_byte(0xad),
            ..DaemonConfig::default()
        };
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = DaemonConfig::from_toml_file(&path).unwrap();
        assert_eq!(loaded.admin, config.admin);
        assert_eq!(loaded.map_size, config.map_size);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = DaemonConfig::from_toml_file(Path::new("/nonexistent/vreg.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
