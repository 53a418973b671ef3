//! Listing, download and deletion of stored documents

use std::sync::Arc;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{Error, Result};
use crate::providers::{DocumentTable, ObjectStore};
use crate::types::{DocumentFilter, DocumentRecord};

/// Document management over the object store and table
pub struct DocumentService {
    store: Arc<dyn ObjectStore>,
    table: Arc<dyn DocumentTable>,
    storage: StorageConfig,
}

impl DocumentService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        table: Arc<dyn DocumentTable>,
        storage: StorageConfig,
    ) -> Self {
        Self {
            store,
            table,
            storage,
        }
    }

    /// Records matching the filter, newest first
    pub async fn list(&self, filter: &DocumentFilter) -> Result<Vec<DocumentRecord>> {
        self.table.list(filter).await
    }

    /// A record by ID, or [`Error::DocumentNotFound`]
    pub async fn get(&self, id: &Uuid) -> Result<DocumentRecord> {
        self.table
            .get(id)
            .await?
            .ok_or_else(|| Error::DocumentNotFound(id.to_string()))
    }

    /// A record with its stored bytes
    pub async fn download(&self, id: &Uuid) -> Result<(DocumentRecord, Vec<u8>)> {
        let record = self.get(id).await?;
        let bucket = self.storage.bucket_for(&record.scope());
        let data = self.store.download(bucket, &record.storage_path).await?;
        Ok((record, data))
    }

    /// Remove the stored object, then the record
    ///
    /// A storage failure is logged and the record is removed anyway.
    pub async fn delete(&self, id: &Uuid) -> Result<DocumentRecord> {
        let record = self.get(id).await?;
        let bucket = self.storage.bucket_for(&record.scope());

        if let Err(e) = self
            .store
            .remove(bucket, std::slice::from_ref(&record.storage_path))
            .await
        {
            tracing::warn!(
                "Failed to remove {}/{} for document {}: {}",
                bucket,
                record.storage_path,
                id,
                e
            );
        }

        if !self.table.delete(id).await? {
            return Err(Error::DocumentNotFound(id.to_string()));
        }

        tracing::info!("Deleted document '{}' ({})", record.filename, id);
        Ok(record)
    }
}
