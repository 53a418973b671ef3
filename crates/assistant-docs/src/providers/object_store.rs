//! Object store provider trait for raw document bytes

use async_trait::async_trait;

use crate::error::Result;

/// Trait for bucket-scoped object storage
///
/// Implementations:
/// - `LocalObjectStore`: Local filesystem
/// - `SupabaseStorage`: Supabase storage API
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under `path` in `bucket`
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<()>;

    /// Fetch the bytes stored under `path`
    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>>;

    /// Remove objects; missing paths are not an error
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()>;

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
