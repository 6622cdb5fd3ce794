//! API routes configuration

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::api::handlers::*;
use crate::api::AppState;

/// Create API routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/v1/displays",
            get(list_displays).post(create_display),
        )
        .route(
            "/api/v1/displays/{name}",
            get(get_display).put(update_display).delete(delete_display),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
