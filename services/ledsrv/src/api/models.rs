//! API request and response models

use serde::Serialize;

use crate::display::DisplayConfig;

/// Service name reported by the health endpoint
pub const SERVICE_NAME: &str = "ledsrv";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

/// Display list with the registry capacity
#[derive(Debug, Serialize)]
pub struct DisplayListResponse {
    pub displays: Vec<DisplayConfig>,
    pub total: usize,
    pub capacity: usize,
}

/// Record returned by create and edit
///
/// Monitors read the registry only at startup, hence `restart_required`.
#[derive(Debug, Serialize)]
pub struct DisplayMutationResponse {
    #[serde(flatten)]
    pub display: DisplayConfig,
    pub restart_required: bool,
}

impl From<DisplayConfig> for DisplayMutationResponse {
    fn from(display: DisplayConfig) -> Self {
        Self {
            display,
            restart_required: true,
        }
    }
}
