use crate::models::{ParsedTable, StagedFile, UploadedPayload};
use crate::services::spreadsheet::{ParseError, parse_spreadsheet_bytes};
use crate::services::staging::StagingStore;
use crate::utils::validation::{is_container_mismatch, validate_filename};
use std::io;
use std::sync::Arc;
use thiserror::Error;

pub const SUCCESS_MESSAGE: &str = "File uploaded and read successfully!";
pub const ERROR_PREFIX: &str = "Error reading the Excel file";

/// Result of one upload/preview cycle
#[derive(Debug)]
pub enum Interaction {
    /// Nothing uploaded yet; only the prompt is shown
    Prompt,
    Parsed {
        file: StagedFile,
        table: ParsedTable,
    },
    /// The file was staged but could not be read as a spreadsheet
    Failed {
        file: StagedFile,
        error: ParseError,
    },
}

impl Interaction {
    /// User-facing notification text, if this interaction produces one
    pub fn notification(&self) -> Option<String> {
        match self {
            Interaction::Prompt => None,
            Interaction::Parsed { .. } => Some(SUCCESS_MESSAGE.to_string()),
            Interaction::Failed { error, .. } => Some(format!("{}: {}", ERROR_PREFIX, error)),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    #[error("Staging I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Receives an upload, stages it, and parses it back into a table
pub struct PreviewPipeline {
    staging: Arc<dyn StagingStore>,
}

impl PreviewPipeline {
    pub fn new(staging: Arc<dyn StagingStore>) -> Self {
        Self { staging }
    }

    pub fn staging(&self) -> &Arc<dyn StagingStore> {
        &self.staging
    }

    pub async fn handle_interaction(
        &self,
        payload: Option<UploadedPayload>,
    ) -> Result<Interaction, PipelineError> {
        let Some(payload) = payload else {
            return Ok(Interaction::Prompt);
        };

        let name = validate_filename(&payload.file_name)
            .map_err(|e| PipelineError::InvalidFileName(e.to_string()))?;

        if is_container_mismatch(&name, &payload.bytes) {
            tracing::warn!(
                "'{}' has an extension that does not match its contents; parsing by content",
                name
            );
        }

        // 1. Staging directory
        self.staging.ensure_dir().await?;

        // 2. Persist, overwriting any previous upload with the same name
        let file = self.staging.persist(&name, payload.bytes).await?;
        tracing::info!("📦 Staged {} ({} bytes)", file.name, file.size);

        // 3. Parse what is on disk now
        let contents = self.staging.read(&name).await?;
        let parsed = tokio::task::spawn_blocking(move || parse_spreadsheet_bytes(&contents))
            .await
            .map_err(io::Error::other)?;

        match parsed {
            Ok(table) => {
                tracing::info!(
                    "✅ Parsed {}: sheet '{}', {} columns, {} rows",
                    file.name,
                    table.sheet_name,
                    table.column_count(),
                    table.row_count()
                );
                Ok(Interaction::Parsed { file, table })
            }
            Err(error) => {
                tracing::warn!("Could not parse {}: {}", file.name, error);
                Ok(Interaction::Failed { file, error })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::staging::LocalStagingStore;

    fn pipeline_in(dir: &std::path::Path) -> PreviewPipeline {
        PreviewPipeline::new(Arc::new(LocalStagingStore::new(dir.join("temp"))))
    }

    #[tokio::test]
    async fn test_absent_payload_touches_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = pipeline_in(tmp.path());

        let outcome = pipeline.handle_interaction(None).await.unwrap();
        assert!(matches!(outcome, Interaction::Prompt));
        assert!(outcome.notification().is_none());
        assert!(!tmp.path().join("temp").exists());
    }

    #[tokio::test]
    async fn test_invalid_name_is_rejected_before_writing() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = pipeline_in(tmp.path());

        let payload = UploadedPayload::new("../escape.xlsx", b"data".to_vec());
        let err = pipeline.handle_interaction(Some(payload)).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidFileName(_)));
        assert!(!tmp.path().join("escape.xlsx").exists());
        assert!(!tmp.path().join("temp").exists());
    }

    #[tokio::test]
    async fn test_zero_byte_upload_is_staged_and_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = pipeline_in(tmp.path());

        let payload = UploadedPayload::new("empty.xlsx", Vec::new());
        let outcome = pipeline.handle_interaction(Some(payload)).await.unwrap();

        match &outcome {
            Interaction::Failed { file, error } => {
                assert_eq!(file.size, 0);
                assert_eq!(*error, ParseError::Empty);
            }
            other => panic!("expected a parse failure, got {:?}", other),
        }
        assert_eq!(
            outcome.notification().unwrap(),
            "Error reading the Excel file: file is empty"
        );
        assert!(tmp.path().join("temp/empty.xlsx").exists());
    }
}
