//! Admin API
//!
//! Thin CRUD over the display registry. Running monitors are not touched;
//! edits apply after a service restart.

pub mod handlers;
pub mod models;
pub mod routes;

use std::sync::Arc;

use crate::registry::DisplayRegistry;

pub use routes::create_router;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<DisplayRegistry>,
}

impl AppState {
    pub fn new(registry: Arc<DisplayRegistry>) -> Self {
        Self { registry }
    }
}
