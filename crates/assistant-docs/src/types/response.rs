//! Request and response types for the HTTP API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::{DocumentRecord, UploadState};

/// Document listing entry (extracted text omitted)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub filename: String,
    pub storage_path: String,
    pub file_size: u64,
    pub mime_type: String,
    /// Whether usable text was extracted
    pub has_extracted_text: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&DocumentRecord> for DocumentSummary {
    fn from(record: &DocumentRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id.clone(),
            filename: record.filename.clone(),
            storage_path: record.storage_path.clone(),
            file_size: record.file_size,
            mime_type: record.mime_type.clone(),
            has_extracted_text: record.extracted_text.is_some(),
            created_at: record.created_at,
        }
    }
}

/// Response for document listing
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentSummary>,
    pub total_count: usize,
}

/// Per-file outcome of a batch upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadStatus {
    /// Identifier assigned when the file entered the pipeline
    pub file_id: Uuid,
    pub filename: String,
    pub state: UploadState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentSummary>,
}

impl UploadStatus {
    /// A file that has entered the pipeline
    pub fn uploading(file_id: Uuid, filename: impl Into<String>) -> Self {
        Self {
            file_id,
            filename: filename.into(),
            state: UploadState::Uploading,
            error: None,
            document: None,
        }
    }

    /// Mark complete with the written record
    pub fn complete(mut self, record: &DocumentRecord) -> Self {
        self.state = UploadState::Complete;
        self.document = Some(DocumentSummary::from(record));
        self
    }

    /// Mark failed
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.state = UploadState::Error;
        self.error = Some(error.into());
        self
    }
}

/// Response for a batch upload
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadBatchResponse {
    pub files: Vec<UploadStatus>,
    pub succeeded: usize,
    pub failed: usize,
}

impl From<Vec<UploadStatus>> for UploadBatchResponse {
    fn from(files: Vec<UploadStatus>) -> Self {
        let succeeded = files
            .iter()
            .filter(|f| f.state == UploadState::Complete)
            .count();
        let failed = files.iter().filter(|f| f.state == UploadState::Error).count();
        Self {
            files,
            succeeded,
            failed,
        }
    }
}

/// Body of the edge-function style extraction call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractPdfRequest {
    pub file_path: String,
    pub bucket: String,
}

/// Result of the edge-function style extraction call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractPdfResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractPdfResponse {
    pub fn ok(content: String, file_size: u64) -> Self {
        Self {
            success: true,
            content: Some(content),
            file_size: Some(file_size),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            content: None,
            file_size: None,
            error: Some(error.into()),
        }
    }
}

/// Result of the multipart extract-text call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractTextResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Prompt context block for a user
#[derive(Debug, Serialize, Deserialize)]
pub struct ContextResponse {
    pub context: String,
    pub user_documents: usize,
    pub company_documents: usize,
}
