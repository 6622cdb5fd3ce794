//! Common command-line arguments for all services
//!
//! Provides a unified argument structure that individual services flatten
//! into their own `Args`.

use std::path::PathBuf;

#[cfg(feature = "cli")]
use clap::Args;

use crate::error::{Error, Result};

/// Common service startup arguments
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "cli", derive(Args))]
pub struct ServiceArgs {
    /// Log level or filter directive (e.g. "debug"); RUST_LOG takes precedence
    #[cfg_attr(feature = "cli", arg(short = 'l', long))]
    pub log_level: Option<String>,

    /// Configuration file (YAML, TOML or JSON)
    #[cfg_attr(feature = "cli", arg(short = 'c', long, env = "LEDSRV_CONFIG"))]
    pub config: Option<String>,

    /// Disable colored output (useful for log files)
    #[cfg_attr(feature = "cli", arg(long))]
    pub no_color: bool,

    /// Only validate configuration without starting service
    #[cfg_attr(feature = "cli", arg(long))]
    pub validate: bool,
}

impl ServiceArgs {
    /// Configuration file path, falling back to `default_path` when it exists
    ///
    /// An explicitly named file must exist.
    pub fn config_path(&self, default_path: &str) -> Result<Option<PathBuf>> {
        match &self.config {
            Some(path) => {
                let path = PathBuf::from(path);
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Configuration file {} not found",
                        path.display()
                    )));
                }
                Ok(Some(path))
            },
            None => {
                let path = PathBuf::from(default_path);
                Ok(path.exists().then_some(path))
            },
        }
    }
}
