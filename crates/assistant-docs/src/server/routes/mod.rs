//! API routes for the document server

pub mod context;
pub mod documents;
pub mod extract;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use crate::server::state::AppState;

/// Build all `/api` routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Document management, with larger body limit for file uploads
        .route(
            "/documents",
            get(documents::list_documents)
                .post(documents::upload_documents)
                .layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route(
            "/documents/:id",
            get(documents::get_document).delete(documents::delete_document),
        )
        .route("/documents/:id/download", get(documents::download_document))
        // Prompt context
        .route("/context", get(context::get_context))
        // Info
        .route("/info", get(info))
}

/// Extraction routes served outside `/api`
pub fn extraction_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/functions/extract-pdf-text", post(extract::extract_pdf_text))
        .route(
            "/extract-text",
            post(extract::extract_text).layer(DefaultBodyLimit::max(max_upload_size)),
        )
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "assistant-docs",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Document storage, PDF text extraction and prompt context for the business assistant",
        "endpoints": {
            "POST /functions/extract-pdf-text": "Extract text from a stored PDF ({filePath, bucket})",
            "POST /extract-text": "Extract text from an uploaded PDF (multipart 'file')",
            "GET /api/documents": "List documents (user_id, scope, mime_type, limit)",
            "POST /api/documents": "Upload documents (multipart 'user_id', 'file')",
            "GET /api/documents/:id": "Get document details",
            "GET /api/documents/:id/download": "Download the stored file",
            "DELETE /api/documents/:id": "Delete a document and its stored file",
            "GET /api/context": "Prompt context block (user_id)"
        }
    }))
}
