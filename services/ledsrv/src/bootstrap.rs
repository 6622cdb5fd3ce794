//! Service bootstrap: command line, logging and configuration validation

use std::path::PathBuf;

use clap::Parser;
use common::bootstrap_args::ServiceArgs;
use common::logging::{LogConfig, LogGuard};
use tracing::{info, warn};

use crate::config::{LedSrvConfig, DEFAULT_CONFIG_PATH};
use crate::error::Result;
use crate::registry::DisplayRegistry;

pub const SERVICE_NAME: &str = "ledsrv";

/// Command line arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "ledsrv", version, about = "SCADA to LED display bridge")]
pub struct Args {
    #[command(flatten)]
    pub service: ServiceArgs,

    /// Display registry file, overrides `registry_path`
    #[arg(short = 'r', long)]
    pub registry: Option<PathBuf>,

    /// Run display workers without the admin API
    #[arg(long)]
    pub no_api: bool,
}

impl Args {
    /// Load configuration and apply command line overrides
    pub fn load_config(&self) -> Result<LedSrvConfig> {
        let file = self.service.config_path(DEFAULT_CONFIG_PATH)?;
        let mut config = LedSrvConfig::load(file.as_deref())?;
        if let Some(path) = &self.registry {
            config.registry_path = path.clone();
        }
        if let Some(level) = &self.service.log_level {
            config.log.level = level.clone();
        }
        Ok(config)
    }
}

/// Initialize logging from the loaded configuration
pub fn initialize_logging(args: &Args, config: &LedSrvConfig) -> Result<LogGuard> {
    let guard = common::logging::init_with_config(LogConfig {
        service_name: SERVICE_NAME.to_string(),
        log_dir: config.log.dir.clone(),
        level: config.log.level.clone(),
        enable_json: config.log.json,
        ansi: !args.service.no_color,
    })?;
    Ok(guard)
}

/// Summary of a `--validate` run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: Vec<String>,
    pub invalid: Vec<String>,
}

/// Check every registry record without starting anything
pub async fn validate_registry(registry: &DisplayRegistry) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();
    for (index, record) in registry.load_displays().await?.into_iter().enumerate() {
        match record {
            Ok(config) => {
                info!(
                    "Display '{}': {} -> {} every {}s",
                    config.name,
                    config.protocol,
                    config.target(),
                    config.poll_interval_secs
                );
                report.valid.push(config.name);
            },
            Err(e) => {
                warn!("Record #{}: {}", index, e);
                report.invalid.push(e.to_string());
            },
        }
    }
    Ok(report)
}
