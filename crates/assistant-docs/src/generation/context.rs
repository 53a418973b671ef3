//! Document context block for AI prompts

use std::sync::Arc;

use crate::config::{AppConfig, StorageConfig};
use crate::error::Result;
use crate::extraction::{extract_blocking, is_usable_extraction, preview, PdfExtractor};
use crate::providers::{DocumentTable, ObjectStore};
use crate::types::{ContextResponse, DocumentFilter, DocumentRecord, DocumentScope};

/// Returned when neither list holds a document
pub const NO_DOCUMENTS_CONTEXT: &str =
    "No documents have been uploaded yet, so there is no document context available for this conversation.";

/// First line of a non-empty context block
pub const CONTEXT_HEADER: &str = "The following documents are available for reference:";

/// Stands in for PDF text that could not be read
pub const CONTENT_UNAVAILABLE: &str = "[PDF content unavailable]";

/// Builds the context block from user and company documents
pub struct ContextBuilder {
    store: Arc<dyn ObjectStore>,
    table: Arc<dyn DocumentTable>,
    extractor: Arc<PdfExtractor>,
    storage: StorageConfig,
    preview_chars: usize,
    min_text_chars: usize,
}

impl ContextBuilder {
    /// Create a new context builder
    pub fn new(
        store: Arc<dyn ObjectStore>,
        table: Arc<dyn DocumentTable>,
        extractor: Arc<PdfExtractor>,
        config: &AppConfig,
    ) -> Self {
        Self {
            store,
            table,
            extractor,
            storage: config.storage.clone(),
            preview_chars: config.extraction.preview_chars,
            min_text_chars: config.extraction.min_text_chars,
        }
    }

    /// Load the user's documents and the company documents, then build
    ///
    /// Without a user only company documents are included.
    pub async fn build_for_user(&self, user_id: Option<&str>) -> Result<ContextResponse> {
        let user_docs = match user_id {
            Some(id) => {
                self.table
                    .list(&DocumentFilter::scope(DocumentScope::User(id.to_string())))
                    .await?
            }
            None => Vec::new(),
        };
        let company_docs = self
            .table
            .list(&DocumentFilter::scope(DocumentScope::Company))
            .await?;

        let context = self.build(&user_docs, &company_docs).await;

        Ok(ContextResponse {
            context,
            user_documents: user_docs.len(),
            company_documents: company_docs.len(),
        })
    }

    /// Build the context block
    ///
    /// Never fails: a PDF whose text cannot be produced is listed with
    /// [`CONTENT_UNAVAILABLE`].
    pub async fn build(&self, user_docs: &[DocumentRecord], company_docs: &[DocumentRecord]) -> String {
        if user_docs.is_empty() && company_docs.is_empty() {
            return NO_DOCUMENTS_CONTEXT.to_string();
        }

        let mut context = String::from(CONTEXT_HEADER);
        for (title, docs) in [("User documents", user_docs), ("Company documents", company_docs)] {
            if docs.is_empty() {
                continue;
            }
            context.push_str(&format!("\n\n{}:", title));
            for doc in docs {
                context.push_str(&format!("\n- {} ({})", doc.filename, doc.mime_type));
                if doc.is_pdf() {
                    let content = self.pdf_content(doc).await;
                    context.push_str(&format!("\n  Content: {}", content));
                }
            }
        }

        context
    }

    /// Preview of a PDF's text, cached if present, else read live
    async fn pdf_content(&self, doc: &DocumentRecord) -> String {
        if let Some(text) = doc.extracted_text.as_deref() {
            return preview(text, self.preview_chars);
        }

        match self.extract_live(doc).await {
            Some(text) => preview(&text, self.preview_chars),
            None => CONTENT_UNAVAILABLE.to_string(),
        }
    }

    async fn extract_live(&self, doc: &DocumentRecord) -> Option<String> {
        let bucket = self.storage.bucket_for(&doc.scope());
        let data = match self.store.download(bucket, &doc.storage_path).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Could not download '{}' for context: {}", doc.filename, e);
                return None;
            }
        };

        let text = match extract_blocking(Arc::clone(&self.extractor), data).await {
            Ok(result) => result.sanitized_text(),
            Err(e) => {
                tracing::warn!("Could not extract '{}' for context: {}", doc.filename, e);
                return None;
            }
        };

        if !is_usable_extraction(&text, self.min_text_chars) {
            tracing::warn!("Live extraction of '{}' too poor to use", doc.filename);
            return None;
        }

        // Cache for the next build; only the first successful write sticks
        match self.table.set_extracted_text(&doc.id, &text).await {
            Ok(true) => tracing::debug!("Cached extracted text for {}", doc.id),
            Ok(false) => {}
            Err(e) => tracing::warn!("Failed to cache extracted text for {}: {}", doc.id, e),
        }

        Some(text)
    }
}
