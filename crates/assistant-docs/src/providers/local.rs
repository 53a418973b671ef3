//! Local provider implementations using the filesystem and SQLite

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::storage::DocumentDb;
use crate::types::{DocumentFilter, DocumentRecord};

use super::document_table::DocumentTable;
use super::object_store::ObjectStore;

/// Local object store: `{root}/{bucket}/{path}`
pub struct LocalObjectStore {
    /// Directory holding one subdirectory per bucket
    root: PathBuf,
}

impl LocalObjectStore {
    /// Create a new local object store
    pub fn new(root: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Resolve an object path, refusing anything that escapes the bucket
    fn object_path(&self, bucket: &str, path: &str) -> Result<PathBuf> {
        if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket == ".." || bucket == "." {
            return Err(Error::InvalidRequest(format!("Invalid bucket name: {}", bucket)));
        }

        let relative = Path::new(path);
        let is_plain = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(Error::InvalidRequest(format!("Invalid object path: {}", path)));
        }

        Ok(self.root.join(bucket).join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: &[u8],
        _content_type: &str,
    ) -> Result<()> {
        let target = self.object_path(bucket, path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::storage(format!("Failed to create {}: {}", parent.display(), e)))?;
        }

        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            return Err(Error::storage(format!("Object already exists: {}/{}", bucket, path)));
        }

        tokio::fs::write(&target, data)
            .await
            .map_err(|e| Error::storage(format!("Failed to write {}/{}: {}", bucket, path, e)))
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>> {
        let target = self.object_path(bucket, path)?;
        tokio::fs::read(&target)
            .await
            .map_err(|e| Error::storage(format!("Failed to read {}/{}: {}", bucket, path, e)))
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        for path in paths {
            let target = self.object_path(bucket, path)?;
            match tokio::fs::remove_file(&target).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(Error::storage(format!(
                        "Failed to remove {}/{}: {}",
                        bucket, path, e
                    )));
                }
            }
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.root.is_dir())
    }

    fn name(&self) -> &str {
        "local-fs"
    }
}

/// Document table backed by a SQLite file
pub struct SqliteDocumentTable {
    db: Arc<DocumentDb>,
}

impl SqliteDocumentTable {
    /// Wrap an existing database
    pub fn new(db: Arc<DocumentDb>) -> Self {
        Self { db }
    }

    /// Open the database named in the config
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let db = DocumentDb::new(&config.database.path)?;
        Ok(Self::new(Arc::new(db)))
    }

    /// In-memory table
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Arc::new(DocumentDb::in_memory()?)))
    }
}

#[async_trait]
impl DocumentTable for SqliteDocumentTable {
    async fn insert(&self, record: &DocumentRecord) -> Result<()> {
        // DocumentDb is sync, wrap in blocking task
        let db = Arc::clone(&self.db);
        let record = record.clone();
        tokio::task::spawn_blocking(move || db.insert(&record)).await?
    }

    async fn get(&self, id: &Uuid) -> Result<Option<DocumentRecord>> {
        let db = Arc::clone(&self.db);
        let id = *id;
        tokio::task::spawn_blocking(move || db.get(&id)).await?
    }

    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<DocumentRecord>> {
        let db = Arc::clone(&self.db);
        let filter = filter.clone();
        tokio::task::spawn_blocking(move || db.list(&filter)).await?
    }

    async fn set_extracted_text(&self, id: &Uuid, text: &str) -> Result<bool> {
        let db = Arc::clone(&self.db);
        let id = *id;
        let text = text.to_string();
        tokio::task::spawn_blocking(move || db.set_extracted_text(&id, &text)).await?
    }

    async fn delete(&self, id: &Uuid) -> Result<bool> {
        let db = Arc::clone(&self.db);
        let id = *id;
        tokio::task::spawn_blocking(move || db.delete(&id)).await?
    }

    async fn health_check(&self) -> Result<bool> {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || db.count().map(|_| true)).await?
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}
