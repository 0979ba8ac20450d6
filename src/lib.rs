pub mod api;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;
pub mod view;

use crate::config::PreviewConfig;
use crate::services::pipeline::PreviewPipeline;
use crate::services::staging::{LocalStagingStore, StagingStore};
use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::upload::preview_upload,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::upload::PreviewResponse,
            api::handlers::upload::PreviewStatus,
            api::handlers::upload::StagedFileResponse,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "preview", description = "Spreadsheet upload and preview"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PreviewPipeline>,
    pub config: PreviewConfig,
}

impl AppState {
    /// State backed by a local staging directory taken from `config`
    pub fn new(config: PreviewConfig) -> Self {
        let staging: Arc<dyn StagingStore> =
            Arc::new(LocalStagingStore::new(config.staging_dir.clone()));
        Self::with_staging(config, staging)
    }

    pub fn with_staging(config: PreviewConfig, staging: Arc<dyn StagingStore>) -> Self {
        Self {
            pipeline: Arc::new(PreviewPipeline::new(staging)),
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route(
            "/",
            get(api::handlers::page::index).post(api::handlers::page::submit),
        )
        .route("/api/preview", post(api::handlers::upload::preview_upload))
        .route("/health", get(api::handlers::health::health_check))
        .layer(from_fn(api::middleware::security::security_headers))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(axum::extract::DefaultBodyLimit::max(
            state.config.max_upload_size.saturating_add(1024 * 1024), // 1MB buffer for multipart overhead
        ))
        .with_state(state)
}
