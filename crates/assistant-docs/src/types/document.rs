//! Document record and upload types

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// MIME type that triggers text extraction
pub const PDF_MIME: &str = "application/pdf";

/// Owner path segment used for company-wide documents
pub const COMPANY_OWNER: &str = "company";

/// Who a document belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "user_id")]
pub enum DocumentScope {
    /// Owned by a single user
    User(String),
    /// Shared across the company (no owning user)
    Company,
}

impl DocumentScope {
    /// Scope from a nullable owning user id
    pub fn from_owner(user_id: Option<&str>) -> Self {
        match user_id {
            Some(id) => Self::User(id.to_string()),
            None => Self::Company,
        }
    }

    /// Owning user id, `None` for company documents
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::User(id) => Some(id),
            Self::Company => None,
        }
    }

    /// First segment of the storage path
    pub fn owner_segment(&self) -> &str {
        self.user_id().unwrap_or(COMPANY_OWNER)
    }
}

/// Persisted metadata row describing an uploaded file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Document ID
    pub id: Uuid,
    /// Owning user, `None` for company documents
    pub user_id: Option<String>,
    /// Original filename as uploaded
    pub filename: String,
    /// Object path inside the scope's bucket
    pub storage_path: String,
    /// Size in bytes
    pub file_size: u64,
    /// Declared or guessed MIME type
    pub mime_type: String,
    /// Text pulled from the file, only when it passed the quality check
    pub extracted_text: Option<String>,
    /// Upload time
    pub created_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Create a new record stamped with the current time
    pub fn new(
        id: Uuid,
        scope: &DocumentScope,
        filename: impl Into<String>,
        storage_path: impl Into<String>,
        file_size: u64,
        mime_type: impl Into<String>,
        extracted_text: Option<String>,
    ) -> Self {
        Self {
            id,
            user_id: scope.user_id().map(str::to_string),
            filename: filename.into(),
            storage_path: storage_path.into(),
            file_size,
            mime_type: mime_type.into(),
            extracted_text,
            created_at: Utc::now(),
        }
    }

    /// Scope derived from the owning user
    pub fn scope(&self) -> DocumentScope {
        DocumentScope::from_owner(self.user_id.as_deref())
    }

    /// Whether this record is a PDF
    pub fn is_pdf(&self) -> bool {
        self.mime_type.eq_ignore_ascii_case(PDF_MIME)
    }
}

/// Filter for listing document records
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    /// Restrict to one scope, `None` for every document
    pub scope: Option<DocumentScope>,
    /// Restrict to one MIME type
    pub mime_type: Option<String>,
    /// Maximum rows returned
    pub limit: Option<usize>,
}

impl DocumentFilter {
    /// Filter matching one scope
    pub fn scope(scope: DocumentScope) -> Self {
        Self {
            scope: Some(scope),
            ..Default::default()
        }
    }
}

/// A file handed to the upload pipeline
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Original filename
    pub filename: String,
    /// MIME type declared by the client
    pub content_type: Option<String>,
    /// Raw bytes
    pub data: Bytes,
}

impl UploadFile {
    /// Create an upload from raw parts
    pub fn new(
        filename: impl Into<String>,
        content_type: Option<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            data: data.into(),
        }
    }

    /// Declared MIME type, falling back to a guess from the extension
    pub fn mime_type(&self) -> String {
        match self.content_type.as_deref().map(str::trim) {
            Some(declared) if !declared.is_empty() => declared.to_string(),
            _ => mime_guess::from_path(&self.filename)
                .first_or_octet_stream()
                .to_string(),
        }
    }
}

/// Progress state of one file in a batch upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadState {
    /// Upload started
    Uploading,
    /// Record written
    Complete,
    /// Upload or record write failed
    Error,
}
