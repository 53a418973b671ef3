//! Text extraction endpoints

use axum::{
    extract::{rejection::JsonRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::extraction::extract_blocking;
use crate::server::state::AppState;
use crate::types::{ExtractPdfRequest, ExtractPdfResponse, ExtractTextResponse};

/// POST /functions/extract-pdf-text - Extract text from a stored PDF
///
/// Body `{filePath, bucket}`. Always answers with the `success` envelope.
pub async fn extract_pdf_text(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ExtractPdfRequest>, JsonRejection>,
) -> (StatusCode, Json<ExtractPdfResponse>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ExtractPdfResponse::err(rejection.body_text())),
            );
        }
    };

    let file_path = request.file_path.trim();
    let bucket = request.bucket.trim();
    if file_path.is_empty() || bucket.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ExtractPdfResponse::err("filePath and bucket are required")),
        );
    }
    if !state.config().storage.is_known_bucket(bucket) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ExtractPdfResponse::err(format!("Unknown bucket: {}", bucket))),
        );
    }

    let data = match state.store().download(bucket, file_path).await {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!("Download of {}/{} failed: {}", bucket, file_path, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ExtractPdfResponse::err(e.to_string())),
            );
        }
    };
    let file_size = data.len() as u64;

    match extract_blocking(Arc::clone(state.extractor()), data).await {
        Ok(result) => {
            let content = result.sanitized_text();
            tracing::info!(
                "Extracted {} chars from {}/{} ({} pages)",
                content.chars().count(),
                bucket,
                file_path,
                result.page_count
            );
            (StatusCode::OK, Json(ExtractPdfResponse::ok(content, file_size)))
        }
        Err(e) => {
            tracing::warn!("Extraction of {}/{} failed: {}", bucket, file_path, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ExtractPdfResponse::err(e.to_string())),
            )
        }
    }
}

/// POST /extract-text - Extract text from an uploaded PDF
///
/// Multipart field `file`. A PDF without a text layer gets a descriptive
/// placeholder instead of empty text.
pub async fn extract_text(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractTextResponse>> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        Error::InvalidRequest(format!("Failed to read multipart field: {}", e))
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("document.pdf").to_string();
        let data = field.bytes().await.map_err(|e| {
            Error::InvalidRequest(format!("Failed to read file '{}': {}", filename, e))
        })?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) =
        upload.ok_or_else(|| Error::InvalidRequest("Missing multipart field 'file'".to_string()))?;
    tracing::info!("Processing PDF: {}", filename);

    let size = data.len();
    let response = match extract_blocking(Arc::clone(state.extractor()), data.to_vec()).await {
        Ok(result) => {
            let text = result.sanitized_text();
            if text.trim().is_empty() {
                tracing::warn!("No text extracted from {} - possibly image-based PDF", filename);
                ExtractTextResponse {
                    success: true,
                    text: Some(image_only_placeholder(&filename, size)),
                    error: None,
                }
            } else {
                tracing::info!("Successfully extracted text from {}", filename);
                ExtractTextResponse {
                    success: true,
                    text: Some(text),
                    error: None,
                }
            }
        }
        Err(e) => {
            tracing::error!("Error processing PDF {}: {}", filename, e);
            ExtractTextResponse {
                success: false,
                text: None,
                error: Some(e.to_string()),
            }
        }
    };

    Ok(Json(response))
}

/// Placeholder text for PDFs with no embedded text layer
pub fn image_only_placeholder(filename: &str, size_bytes: usize) -> String {
    format!(
        "PDF Document: {}\n\nFile Size: {:.2}KB\n\nThis PDF appears to be image-based. Text extraction requires OCR processing.",
        filename,
        size_bytes as f64 / 1024.0
    )
}
