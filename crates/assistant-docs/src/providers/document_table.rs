//! Document table provider trait for record metadata

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{DocumentFilter, DocumentRecord};

/// Trait for the document metadata table
///
/// Implementations:
/// - `SqliteDocumentTable`: Local SQLite file
/// - `SupabaseTable`: Supabase PostgREST
#[async_trait]
pub trait DocumentTable: Send + Sync {
    /// Insert a new record
    async fn insert(&self, record: &DocumentRecord) -> Result<()>;

    /// Get a record by ID
    async fn get(&self, id: &Uuid) -> Result<Option<DocumentRecord>>;

    /// List records, newest first
    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<DocumentRecord>>;

    /// Store extracted text unless the record already has some
    ///
    /// Returns true if the text was written.
    async fn set_extracted_text(&self, id: &Uuid, text: &str) -> Result<bool>;

    /// Delete a record, returning whether it existed
    async fn delete(&self, id: &Uuid) -> Result<bool>;

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
