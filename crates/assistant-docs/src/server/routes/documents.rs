//! Document management endpoints

use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{
    DocumentFilter, DocumentListResponse, DocumentScope, DocumentSummary, UploadBatchResponse,
    UploadFile, UploadStatus,
};

/// Query parameters for listing
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// List this user's documents
    pub user_id: Option<String>,
    /// `user` or `company`
    pub scope: Option<String>,
    pub mime_type: Option<String>,
    pub limit: Option<usize>,
}

impl ListParams {
    fn filter(self) -> Result<DocumentFilter> {
        let user_id = self.user_id.filter(|id| !id.trim().is_empty());
        let scope = match (self.scope.as_deref(), user_id) {
            (Some("company"), _) => Some(DocumentScope::Company),
            (Some("user"), Some(id)) | (None, Some(id)) => Some(DocumentScope::User(id)),
            (Some("user"), None) => {
                return Err(Error::InvalidRequest(
                    "scope=user requires a user_id".to_string(),
                ));
            }
            (None, None) => None,
            (Some(other), _) => {
                return Err(Error::InvalidRequest(format!("Unknown scope: {}", other)));
            }
        };

        Ok(DocumentFilter {
            scope,
            mime_type: self.mime_type,
            limit: self.limit,
        })
    }
}

/// GET /api/documents - List documents, newest first
pub async fn list_documents(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<DocumentListResponse>> {
    let filter = params.filter()?;
    let documents: Vec<DocumentSummary> = state
        .documents()
        .list(&filter)
        .await?
        .iter()
        .map(DocumentSummary::from)
        .collect();

    let total_count = documents.len();

    Ok(Json(DocumentListResponse {
        documents,
        total_count,
    }))
}

/// POST /api/documents - Upload one or more files
///
/// Multipart fields: optional `user_id` (company document when absent),
/// then one `file` part per document. A file part that cannot be read gets
/// an error status; the parts read before it are still uploaded.
pub async fn upload_documents(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadBatchResponse>> {
    let mut user_id: Option<String> = None;
    // Readable files, or the status of an unreadable part, in arrival order
    let mut entries: Vec<std::result::Result<UploadFile, UploadStatus>> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) if entries.is_empty() => {
                return Err(Error::InvalidRequest(format!(
                    "Failed to read multipart field: {}",
                    e
                )));
            }
            Err(e) => {
                tracing::warn!(
                    "Multipart stream ended early after {} file(s): {}",
                    entries.len(),
                    e
                );
                break;
            }
        };
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "user_id" => {
                let value = field.text().await.map_err(|e| {
                    Error::InvalidRequest(format!("Failed to read user_id: {}", e))
                })?;
                let value = value.trim().to_string();
                user_id = (!value.is_empty()).then_some(value);
            }
            "file" => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("file_{}.bin", Uuid::new_v4()));
                let content_type = field.content_type().map(|s| s.to_string());
                match field.bytes().await {
                    Ok(data) => entries.push(Ok(UploadFile::new(filename, content_type, data))),
                    Err(e) => {
                        tracing::warn!("Could not read file '{}': {}", filename, e);
                        entries.push(Err(UploadStatus::uploading(Uuid::new_v4(), filename)
                            .failed(format!("Failed to read file: {}", e))));
                    }
                }
            }
            other => {
                tracing::debug!("Ignoring multipart field '{}'", other);
            }
        }
    }

    if entries.is_empty() {
        return Err(Error::InvalidRequest("No files in upload".to_string()));
    }

    let scope = DocumentScope::from_owner(user_id.as_deref());
    tracing::info!("Received {} file(s) for {:?}", entries.len(), scope);

    let mut files = Vec::new();
    let mut unreadable = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            Ok(file) => {
                files.push(file);
                unreadable.push(None);
            }
            Err(status) => unreadable.push(Some(status)),
        }
    }

    // One status per uploaded file, slotted back between the unreadable parts
    let mut uploaded = state.pipeline().upload_batch(&scope, files).await.into_iter();
    let statuses: Vec<UploadStatus> = unreadable
        .into_iter()
        .filter_map(|slot| slot.or_else(|| uploaded.next()))
        .collect();

    Ok(Json(UploadBatchResponse::from(statuses)))
}

/// GET /api/documents/:id - Get a specific document
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentSummary>> {
    let doc = state.documents().get(&id).await?;
    Ok(Json(DocumentSummary::from(&doc)))
}

/// GET /api/documents/:id/download - Stored bytes
pub async fn download_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let (doc, data) = state.documents().download(&id).await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        doc.filename.replace(['"', '\\'], "_")
    );

    Ok((
        [
            (header::CONTENT_TYPE, doc.mime_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    )
        .into_response())
}

/// DELETE /api/documents/:id - Delete a document and its stored object
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let doc = state.documents().delete(&id).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "document_id": id,
        "filename": doc.filename,
    })))
}
