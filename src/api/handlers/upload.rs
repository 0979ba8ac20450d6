use crate::AppState;
use crate::api::error::AppError;
use crate::models::{ParsedTable, StagedFile, UploadedPayload};
use crate::services::pipeline::Interaction;
use axum::{
    Json,
    extract::{Multipart, State},
};
use serde::Serialize;
use utoipa::ToSchema;

/// Name of the multipart field carrying the spreadsheet
pub const FILE_FIELD: &str = "file";

#[derive(Serialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PreviewStatus {
    Prompt,
    Parsed,
    Failed,
}

#[derive(Serialize, ToSchema)]
pub struct StagedFileResponse {
    pub name: String,
    pub path: String,
    pub size: u64,
}

impl From<StagedFile> for StagedFileResponse {
    fn from(file: StagedFile) -> Self {
        Self {
            name: file.name,
            path: file.path.display().to_string(),
            size: file.size,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PreviewResponse {
    pub status: PreviewStatus,
    pub message: Option<String>,
    pub file: Option<StagedFileResponse>,
    #[schema(value_type = Option<Object>)]
    pub table: Option<ParsedTable>,
}

impl From<Interaction> for PreviewResponse {
    fn from(interaction: Interaction) -> Self {
        let message = interaction.notification();
        match interaction {
            Interaction::Prompt => Self {
                status: PreviewStatus::Prompt,
                message,
                file: None,
                table: None,
            },
            Interaction::Parsed { file, table } => Self {
                status: PreviewStatus::Parsed,
                message,
                file: Some(file.into()),
                table: Some(table),
            },
            Interaction::Failed { file, .. } => Self {
                status: PreviewStatus::Failed,
                message,
                file: Some(file.into()),
                table: None,
            },
        }
    }
}

/// Pulls the uploaded file out of a multipart body.
///
/// A `file` part without a file name is what browsers send when nothing was
/// selected, so it counts as no payload at all.
pub async fn extract_payload(mut multipart: Multipart) -> Result<Option<UploadedPayload>, AppError> {
    let mut payload = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;

        if file_name.is_empty() {
            tracing::debug!("Ignoring '{}' part without a file name", FILE_FIELD);
            continue;
        }

        payload = Some(UploadedPayload::new(file_name, bytes));
    }

    Ok(payload)
}

#[utoipa::path(
    post,
    path = "/api/preview",
    request_body(content = Multipart, description = "Spreadsheet upload in the `file` field"),
    responses(
        (status = 200, description = "Upload handled; see `status` for the outcome", body = PreviewResponse),
        (status = 400, description = "Invalid file name or malformed multipart body"),
        (status = 413, description = "Request body too large")
    ),
    tag = "preview"
)]
pub async fn preview_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PreviewResponse>, AppError> {
    let payload = extract_payload(multipart).await?;
    let interaction = state.pipeline.handle_interaction(payload).await?;

    Ok(Json(interaction.into()))
}
