use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub staging_dir: String,
    pub staged_files: Option<usize>,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let staging = state.pipeline.staging();

    // An unreadable staging directory is reported, not fatal
    let staged_files = match staging.list().await {
        Ok(entries) => Some(entries.len()),
        Err(e) => {
            tracing::warn!("Health check could not list staging directory: {}", e);
            None
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        staging_dir: staging.root().display().to_string(),
        staged_files,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
