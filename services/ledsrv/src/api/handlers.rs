//! API handlers for the display registry

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::info;

use crate::api::models::*;
use crate::api::AppState;
use crate::display::{DisplayConfig, DisplayUpdate, MAX_DISPLAYS};
use crate::error::ApiError;

type ApiResult<T> = Result<T, ApiError>;

/// Malformed or incomplete bodies are client errors like any failed check
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
    })
}

pub async fn list_displays(State(state): State<AppState>) -> ApiResult<Json<DisplayListResponse>> {
    let displays = state.registry.list().await?;
    Ok(Json(DisplayListResponse {
        total: displays.len(),
        displays,
        capacity: MAX_DISPLAYS,
    }))
}

pub async fn get_display(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<DisplayConfig>> {
    Ok(Json(state.registry.get(&name).await?))
}

pub async fn create_display(
    State(state): State<AppState>,
    payload: Result<Json<DisplayConfig>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DisplayMutationResponse>)> {
    let created = state.registry.create(body(payload)?).await?;
    info!("Admin created display '{}' (restart required)", created.name);
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn update_display(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<DisplayUpdate>, JsonRejection>,
) -> ApiResult<Json<DisplayMutationResponse>> {
    let updated = state.registry.update(&name, &body(payload)?).await?;
    info!("Admin updated display '{}' (restart required)", name);
    Ok(Json(updated.into()))
}

pub async fn delete_display(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    state.registry.delete(&name).await?;
    info!("Admin deleted display '{}' (restart required)", name);
    Ok(StatusCode::NO_CONTENT)
}
