//! Service configuration
//!
//! Loaded through `common::config_loader`: compiled-in defaults, then an
//! optional YAML/TOML/JSON file, then `LEDSRV_*` environment variables
//! (`__` separates nested keys, e.g. `LEDSRV_API__PORT=5001`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LedSrvError, Result};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "LEDSRV_";
/// Configuration file looked up when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "config/ledsrv.yaml";

/// What "no value" from the data source becomes before change detection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum EmptyValuePolicy {
    /// Keep `None`; transmitted as an all-space frame, committed as null
    #[default]
    Blank,
    /// Substitute a literal text, handled like any other value
    Placeholder { text: String },
}

impl EmptyValuePolicy {
    /// Apply the policy to a fetched value
    pub fn resolve(&self, value: Option<String>) -> Option<String> {
        match (value, self) {
            (Some(value), _) => Some(value),
            (None, EmptyValuePolicy::Blank) => None,
            (None, EmptyValuePolicy::Placeholder { text }) => Some(text.clone()),
        }
    }
}

/// Admin API listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    5000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
        }
    }
}

impl ApiConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for daily-rolling log files; console only when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
            json: false,
        }
    }
}

/// Top-level service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedSrvConfig {
    /// Display registry document
    #[serde(default = "default_registry_path")]
    pub registry_path: PathBuf,
    /// Data source URL (sqlite://, postgres://, mysql://)
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Bound on connect, write and response read per send
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    #[serde(default)]
    pub empty_value: EmptyValuePolicy,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub log: LogSettings,
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("config.json")
}

fn default_database_url() -> String {
    "sqlite://scada.db".to_string()
}

fn default_send_timeout_ms() -> u64 {
    3000
}

impl Default for LedSrvConfig {
    fn default() -> Self {
        Self {
            registry_path: default_registry_path(),
            database_url: default_database_url(),
            send_timeout_ms: default_send_timeout_ms(),
            empty_value: EmptyValuePolicy::default(),
            api: ApiConfig::default(),
            log: LogSettings::default(),
        }
    }
}

impl LedSrvConfig {
    /// Load from defaults, an optional file and the environment
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let config: Self = common::config_loader::load_layered(file, ENV_PREFIX)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(LedSrvError::Config("database_url must not be empty".to_string()));
        }
        if self.send_timeout_ms == 0 {
            return Err(LedSrvError::Config("send_timeout_ms must be > 0".to_string()));
        }
        if let EmptyValuePolicy::Placeholder { text } = &self.empty_value {
            if text.is_empty() {
                return Err(LedSrvError::Config(
                    "empty_value placeholder text must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = LedSrvConfig::default();
        assert_eq!(config.registry_path, PathBuf::from("config.json"));
        assert_eq!(config.api.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.send_timeout(), Duration::from_secs(3));
        assert_eq!(config.empty_value, EmptyValuePolicy::Blank);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "registry_path: /var/lib/ledsrv/displays.json\n\
             database_url: postgres://scada@db/plant\n\
             empty_value:\n  policy: placeholder\n  text: '---'\n\
             api:\n  port: 5100\n"
        )
        .unwrap();

        let config = LedSrvConfig::load(Some(file.path())).unwrap();
        assert_eq!(
            config.registry_path,
            PathBuf::from("/var/lib/ledsrv/displays.json")
        );
        assert_eq!(config.database_url, "postgres://scada@db/plant");
        assert_eq!(config.api.port, 5100);
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(
            config.empty_value,
            EmptyValuePolicy::Placeholder {
                text: "---".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_empty_placeholder() {
        let config = LedSrvConfig {
            empty_value: EmptyValuePolicy::Placeholder {
                text: String::new(),
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_value_policy_resolve() {
        assert_eq!(EmptyValuePolicy::Blank.resolve(None), None);
        assert_eq!(
            EmptyValuePolicy::Blank.resolve(Some("A1".to_string())),
            Some("A1".to_string())
        );

        let placeholder = EmptyValuePolicy::Placeholder {
            text: "---".to_string(),
        };
        assert_eq!(placeholder.resolve(None), Some("---".to_string()));
        assert_eq!(
            placeholder.resolve(Some("A1".to_string())),
            Some("A1".to_string())
        );
    }
}
