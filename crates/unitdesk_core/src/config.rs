//! Runtime configuration.
//!
//! # Responsibility
//! - Load `CoreConfig` from an optional TOML file.
//! - Layer `UNITDESK_*` environment overrides on top.
//! - Persist configuration atomically.
//!
//! # Invariants
//! - A missing file yields defaults, never an error.
//! - Invalid environment values are ignored with a warning.

use crate::service::unit_service::CreateStatusPolicy;
use log::warn;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const ENV_STORE_BACKEND: &str = "UNITDESK_STORE_BACKEND";
pub const ENV_STORE_PATH: &str = "UNITDESK_STORE_PATH";
pub const ENV_CREATE_STATUS: &str = "UNITDESK_CREATE_STATUS";
pub const ENV_LOG_LEVEL: &str = "UNITDESK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "UNITDESK_LOG_DIR";

const DEFAULT_JSON_PATH: &str = "units.json";
const DEFAULT_SQLITE_PATH: &str = "units.sqlite3";

/// Which `UnitStore` implementation to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Memory,
    #[default]
    JsonFile,
    Sqlite,
}

impl StoreBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "json_file" | "json" => Some(Self::JsonFile),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// Configured path, or the backend's default file name.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        match self.backend {
            StoreBackend::Memory => None,
            StoreBackend::JsonFile => Some(
                self.path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_JSON_PATH)),
            ),
            StoreBackend::Sqlite => Some(
                self.path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH)),
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitsConfig {
    pub create_status: CreateStatusPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace|debug|info|warn|error`; build-mode default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Absolute directory for rolling log files; logging stays off when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub store: StoreConfig,
    pub units: UnitsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Render(toml::ser::Error),
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => write!(f, "failed to read {}: {source}", path.display()),
            Self::Parse { path, source } => {
                write!(f, "failed to parse {}: {source}", path.display())
            }
            Self::Render(err) => write!(f, "failed to render config: {err}"),
            Self::Write { path, source } => {
                write!(f, "failed to write {}: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } | Self::Write { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Render(err) => Some(err),
        }
    }
}

/// Reads one TOML file. `Ok(None)` when it does not exist.
pub fn load_file(path: &Path) -> Result<Option<CoreConfig>, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    toml::from_str(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Loads file config (if any) and applies process environment overrides.
pub fn load(path: Option<&Path>) -> Result<CoreConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_file(path)?.unwrap_or_default(),
        None => CoreConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

pub fn apply_env_overrides(config: &mut CoreConfig) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

/// Applies overrides from any key lookup; blank values are skipped.
pub fn apply_overrides(config: &mut CoreConfig, lookup: impl Fn(&str) -> Option<String>) {
    let value_of = |key: &str| {
        lookup(key)
            .map(|raw| raw.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    if let Some(raw) = value_of(ENV_STORE_BACKEND) {
        match StoreBackend::parse(&raw) {
            Some(backend) => config.store.backend = backend,
            None => warn!("invalid {ENV_STORE_BACKEND} `{raw}`, ignoring"),
        }
    }

    if let Some(raw) = value_of(ENV_STORE_PATH) {
        config.store.path = Some(PathBuf::from(raw));
    }

    if let Some(raw) = value_of(ENV_CREATE_STATUS) {
        match CreateStatusPolicy::parse(&raw) {
            Some(policy) => config.units.create_status = policy,
            None => warn!("invalid {ENV_CREATE_STATUS} `{raw}`, ignoring"),
        }
    }

    if let Some(raw) = value_of(ENV_LOG_LEVEL) {
        config.logging.level = Some(raw);
    }

    if let Some(raw) = value_of(ENV_LOG_DIR) {
        config.logging.dir = Some(PathBuf::from(raw));
    }
}

/// Writes `config` as TOML via a temp file and rename.
pub fn write_config(path: &Path, config: &CoreConfig) -> Result<(), ConfigError> {
    let write_error = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    let contents = toml::to_string_pretty(config).map_err(ConfigError::Render)?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(write_error)?;

    let mut temp = tempfile::NamedTempFile::new_in(&dir).map_err(write_error)?;
    temp.write_all(contents.as_bytes()).map_err(write_error)?;
    temp.persist(path).map_err(|err| write_error(err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        apply_overrides, load_file, write_config, ConfigError, CoreConfig, StoreBackend,
        ENV_CREATE_STATUS, ENV_STORE_BACKEND, ENV_STORE_PATH,
    };
    use crate::service::unit_service::CreateStatusPolicy;
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn defaults_use_json_file_and_force_available() {
        let config = CoreConfig::default();
        assert_eq!(config.store.backend, StoreBackend::JsonFile);
        assert_eq!(config.store.resolved_path(), Some(PathBuf::from("units.json")));
        assert_eq!(config.units.create_status, CreateStatusPolicy::ForceAvailable);
    }

    #[test]
    fn parses_partial_toml() {
        let config: CoreConfig = toml::from_str(
            r#"
            [store]
            backend = "sqlite"

            [units]
            create_status = "honor_requested"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.store.resolved_path(), Some(PathBuf::from("units.sqlite3")));
        assert_eq!(config.units.create_status, CreateStatusPolicy::HonorRequested);
        assert_eq!(config.logging.dir, None);
    }

    #[test]
    fn overrides_apply_valid_values_and_skip_invalid_ones() {
        let vars = HashMap::from([
            (ENV_STORE_BACKEND, "memory"),
            (ENV_STORE_PATH, "   "),
            (ENV_CREATE_STATUS, "whenever"),
        ]);
        let mut config = CoreConfig::default();
        apply_overrides(&mut config, |key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.path, None);
        assert_eq!(config.units.create_status, CreateStatusPolicy::ForceAvailable);
    }

    #[test]
    fn write_then_load_round_trips_and_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("unitdesk.toml");
        assert!(load_file(&path).unwrap().is_none());

        let mut config = CoreConfig::default();
        config.store.backend = StoreBackend::Sqlite;
        config.store.path = Some(dir.path().join("units.sqlite3"));
        config.units.create_status = CreateStatusPolicy::HonorRequested;
        write_config(&path, &config).unwrap();

        assert_eq!(load_file(&path).unwrap(), Some(config));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unitdesk.toml");
        std::fs::write(&path, "[store]\nbackend = \"floppy\"\n").unwrap();

        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "unexpected: {err}");
    }
}
