//! Upload pipeline: store bytes, extract PDF text, write the record

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{AppConfig, StorageConfig};
use crate::error::{Error, Result};
use crate::extraction::{extract_blocking, is_usable_extraction, PdfExtractor};
use crate::providers::{DocumentTable, ObjectStore};
use crate::types::{DocumentRecord, DocumentScope, UploadFile, UploadStatus, PDF_MIME};

/// Upload pipeline shared by the HTTP handlers
pub struct UploadPipeline {
    store: Arc<dyn ObjectStore>,
    table: Arc<dyn DocumentTable>,
    extractor: Arc<PdfExtractor>,
    storage: StorageConfig,
    min_text_chars: usize,
}

impl UploadPipeline {
    /// Create a new upload pipeline
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
            min_text_chars: config.extraction.min_text_chars,
        }
    }

    /// Upload one file and write its record
    ///
    /// Storage and table failures are errors; when the table write fails the
    /// stored object is removed again. A PDF whose text cannot be
    /// read, or reads too poorly, still gets a record with no extracted text.
    pub async fn upload(&self, scope: &DocumentScope, file: UploadFile) -> Result<DocumentRecord> {
        self.upload_with_id(Uuid::new_v4(), scope, file).await
    }

    /// Upload files one after another
    ///
    /// Every file gets a status; a failure never stops the files after it.
    pub async fn upload_batch(
        &self,
        scope: &DocumentScope,
        files: Vec<UploadFile>,
    ) -> Vec<UploadStatus> {
        let mut statuses = Vec::with_capacity(files.len());

        for file in files {
            let status = UploadStatus::uploading(Uuid::new_v4(), file.filename.clone());
            let status = match self.upload_with_id(status.file_id, scope, file).await {
                Ok(record) => status.complete(&record),
                Err(e) => {
                    tracing::warn!("Upload of '{}' failed: {}", status.filename, e);
                    status.failed(e.to_string())
                }
            };
            statuses.push(status);
        }

        let failed = statuses.iter().filter(|s| s.error.is_some()).count();
        tracing::info!(
            "Batch upload finished: {} stored, {} failed",
            statuses.len() - failed,
            failed
        );

        statuses
    }

    async fn upload_with_id(
        &self,
        id: Uuid,
        scope: &DocumentScope,
        file: UploadFile,
    ) -> Result<DocumentRecord> {
        if file.filename.trim().is_empty() {
            return Err(Error::InvalidRequest("Filename is empty".to_string()));
        }

        let mime_type = file.mime_type();
        let bucket = self.storage.bucket_for(scope);
        let storage_path = storage_path(scope, &file.filename, Utc::now().timestamp_millis());

        tracing::info!(
            "Uploading '{}' ({} bytes, {}) to {}/{}",
            file.filename,
            file.data.len(),
            mime_type,
            bucket,
            storage_path
        );

        self.store
            .upload(bucket, &storage_path, &file.data, &mime_type)
            .await?;

        let extracted_text = if mime_type.eq_ignore_ascii_case(PDF_MIME) {
            self.extract_text(&file).await
        } else {
            None
        };

        let record = DocumentRecord::new(
            id,
            scope,
            file.filename,
            storage_path,
            file.data.len() as u64,
            mime_type,
            extracted_text,
        );
        if let Err(e) = self.table.insert(&record).await {
            // No record will ever point at the object, so take it back out
            let paths = [record.storage_path.clone()];
            if let Err(remove_err) = self.store.remove(bucket, &paths).await {
                tracing::warn!(
                    "Could not remove orphaned object {}/{}: {}",
                    bucket,
                    record.storage_path,
                    remove_err
                );
            }
            return Err(e);
        }

        Ok(record)
    }

    /// Sanitized text worth keeping, or `None`
    async fn extract_text(&self, file: &UploadFile) -> Option<String> {
        let result = match extract_blocking(Arc::clone(&self.extractor), file.data.to_vec()).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Text extraction failed for '{}': {}", file.filename, e);
                return None;
            }
        };

        let text = result.sanitized_text();
        if is_usable_extraction(&text, self.min_text_chars) {
            tracing::debug!(
                "Extracted {} chars from {} pages of '{}'",
                text.chars().count(),
                result.page_count,
                file.filename
            );
            Some(text)
        } else {
            tracing::warn!(
                "Discarding low-quality extraction for '{}' ({} chars)",
                file.filename,
                text.chars().count()
            );
            None
        }
    }
}

/// `{owner}/{unix_millis}_{filename}` with path separators in the name replaced
pub fn storage_path(scope: &DocumentScope, filename: &str, unix_millis: i64) -> String {
    let name = filename.trim().replace(['/', '\\'], "_");
    format!("{}/{}_{}", scope.owner_segment(), unix_millis, name)
}
