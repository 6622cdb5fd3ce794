//! Configuration loading helper functions
//!
//! Layering (lowest to highest priority):
//! 1. Compiled-in defaults (the `Default` value of the config type)
//! 2. Configuration file (YAML, TOML or JSON, chosen by extension)
//! 3. Environment variables with the service prefix, `__` separating nested keys

use std::path::Path;

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// Build the layered figment without extracting it
pub fn layered_figment<T>(file: Option<&Path>, env_prefix: &str) -> Result<Figment>
where
    T: Serialize + Default,
{
    let mut figment = Figment::from(Serialized::defaults(T::default()));

    if let Some(path) = file {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Configuration file {} not found",
                path.display()
            )));
        }

        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::Config("Config file must have an extension".to_string()))?;

        figment = match extension {
            "toml" => figment.merge(Toml::file(path)),
            "yaml" | "yml" => figment.merge(Yaml::file(path)),
            "json" => figment.merge(Json::file(path)),
            _ => {
                return Err(Error::Config(format!(
                    "Unsupported config file format: {}",
                    extension
                )))
            },
        };

        info!("Using configuration file {}", path.display());
    }

    Ok(figment.merge(Env::prefixed(env_prefix).split("__")))
}

/// Load a configuration value from defaults, file and environment
pub fn load_layered<T>(file: Option<&Path>, env_prefix: &str) -> Result<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    layered_figment::<T>(file, env_prefix)?
        .extract()
        .map_err(|e| Error::Config(format!("Failed to load configuration: {}", e)))
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        port: u16,
        nested: Nested,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Nested {
        enabled: bool,
    }

    impl Default for Sample {
        fn default() -> Self {
            Self {
                name: "default".to_string(),
                port: 5000,
                nested: Nested { enabled: false },
            }
        }
    }

    #[test]
    fn test_defaults_only() {
        let value: Sample = load_layered(None, "COMMON_TEST_DEFAULTS_").unwrap();
        assert_eq!(value, Sample::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "port: 6001\nnested:\n  enabled: true").unwrap();

        let value: Sample = load_layered(Some(file.path()), "COMMON_TEST_FILE_").unwrap();
        assert_eq!(value.name, "default");
        assert_eq!(value.port, 6001);
        assert!(value.nested.enabled);
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = load_layered::<Sample>(
            Some(Path::new("/nonexistent/ledsrv-test.yaml")),
            "COMMON_TEST_MISSING_",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let err = load_layered::<Sample>(Some(file.path()), "COMMON_TEST_INI_").unwrap_err();
        assert!(err.to_string().contains("Unsupported config file format"));
    }

    #[test]
    fn test_env_overrides_file() {
        std::env::set_var("COMMON_TEST_ENV_PORT", "7002");
        std::env::set_var("COMMON_TEST_ENV_NESTED__ENABLED", "true");

        let value: Sample = load_layered(None, "COMMON_TEST_ENV_").unwrap();
        assert_eq!(value.port, 7002);
        assert!(value.nested.enabled);

        std::env::remove_var("COMMON_TEST_ENV_PORT");
        std::env::remove_var("COMMON_TEST_ENV_NESTED__ENABLED");
    }
}
