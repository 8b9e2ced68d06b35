//! Load — config loading from file and environment variables, and write-back.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use super::model::AppConfig;

pub const CONFIG_FILE_ENV: &str = "STATSOURCE_CONFIG_FILE";
pub const DEFAULT_CONFIG_FILE: &str = "statsource.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("{0}")]
    Invalid(String),
}

impl AppConfig {
    /// Path of the config file, from the environment or the default.
    pub fn config_path() -> PathBuf {
        std::env::var(CONFIG_FILE_ENV)
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string())
            .into()
    }

    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            tracing::info!("Loading configuration from: {}", config_path.display());
            Self::from_file(&config_path)?
        } else {
            tracing::info!(
                "Config file not found at {}, using environment variables",
                config_path.display()
            );
            Self::from_env()
        };

        if let Ok(catalog) = std::env::var("STATSOURCE_CATALOG") {
            config.catalog_path = catalog;
        }
        if let Ok(output) = std::env::var("STATSOURCE_OUTPUT_DIR") {
            config.output_dir = output;
        }
        if let Some(poll) = std::env::var("STATSOURCE_POLL_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.poll_interval_ms = poll;
        }

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Defaults, with the environment overrides applied. Servers can only
    /// be declared in the file.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            catalog_path: std::env::var("STATSOURCE_CATALOG").unwrap_or(defaults.catalog_path),
            output_dir: std::env::var("STATSOURCE_OUTPUT_DIR").unwrap_or(defaults.output_dir),
            poll_interval_ms: std::env::var("STATSOURCE_POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.poll_interval_ms),
            ..defaults
        }
    }

    /// Atomically replace the file at `path` with this configuration.
    pub fn write_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        let contents = toml::to_string(self)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(contents.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be > 0".to_string());
        }
        if self.output_dir.is_empty() {
            return Err("output_dir must not be empty".to_string());
        }
        if self.live_log_name.is_empty() || self.backup_prefix.is_empty() {
            return Err("live_log_name and backup_prefix must not be empty".to_string());
        }
        if self.servers.is_empty() {
            return Err("no servers configured".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        for server in &self.servers {
            if !seen.insert(server.id) {
                return Err(format!("duplicate server id {}", server.id));
            }
            if server.path.is_empty() {
                return Err(format!("server {} has an empty path", server.id));
            }
            if !server.last_timestamp.is_empty() && server.checkpoint().is_none() {
                return Err(format!(
                    "server {} has a malformed last_timestamp: {}",
                    server.id, server.last_timestamp
                ));
            }
        }

        if !Path::new(&self.catalog_path).exists() {
            return Err(format!("catalog not found at: {}", self.catalog_path));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::ServerConfig;

    fn valid(dir: &Path) -> AppConfig {
        let catalog = dir.join("squad.json");
        std::fs::write(&catalog, "{}").unwrap();
        AppConfig {
            catalog_path: catalog.display().to_string(),
            servers: vec![ServerConfig::new(1, "/srv/squad1")],
            ..AppConfig::default()
        }
    }

    // ── Validation ──────────────────────────────────────────────

    #[test]
    fn test_validate_accepts_sane_config() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(valid(dir.path()).validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig { poll_interval_ms: 0, ..valid(dir.path()) };
        assert!(cfg.validate().unwrap_err().contains("poll_interval_ms"));
    }

    #[test]
    fn test_validate_rejects_duplicate_servers() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = valid(dir.path());
        cfg.servers.push(ServerConfig::new(1, "/srv/other"));
        assert!(cfg.validate().unwrap_err().contains("duplicate"));
    }

    #[test]
    fn test_validate_rejects_malformed_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = valid(dir.path());
        cfg.servers[0].last_timestamp = "not a stamp".into();
        assert!(cfg.validate().unwrap_err().contains("last_timestamp"));
    }

    #[test]
    fn test_validate_requires_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig {
            catalog_path: dir.path().join("missing.json").display().to_string(),
            ..valid(dir.path())
        };
        assert!(cfg.validate().unwrap_err().contains("catalog"));
    }

    // ── File round trip ─────────────────────────────────────────

    #[test]
    fn test_write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statsource.toml");
        let mut cfg = valid(dir.path());
        cfg.servers[0].last_timestamp = "2019.08.01-12.00.00:000".into();
        cfg.write_to(&path).unwrap();
        assert_eq!(AppConfig::from_file(&path).unwrap(), cfg);
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "servers = 3").unwrap();
        assert!(matches!(AppConfig::from_file(&path), Err(ConfigError::Parse(_))));
    }
}
