//! Supabase providers over the storage API and PostgREST

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response, Url};
use serde::de::IgnoredAny;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::SupabaseConfig;
use crate::error::{Error, Result};
use crate::types::{DocumentFilter, DocumentRecord, DocumentScope};

use super::document_table::DocumentTable;
use super::object_store::ObjectStore;

/// Shared HTTP client carrying the project URL and service key
pub struct SupabaseClient {
    client: Client,
    base_url: Url,
}

impl SupabaseClient {
    /// Create a client for the configured project
    pub fn new(config: &SupabaseConfig) -> Result<Self> {
        let base_url = Url::parse(config.url.trim_end_matches('/'))
            .map_err(|e| Error::Config(format!("Invalid Supabase URL {}: {}", config.url, e)))?;

        let key = HeaderValue::from_str(&config.service_key)
            .map_err(|_| Error::Config("Supabase service key is not a valid header".to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.service_key))
            .map_err(|_| Error::Config("Supabase service key is not a valid header".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// URL with the given path segments appended; segments are percent-encoded
    fn url<'a, I>(&self, segments: I) -> Result<Url>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Supabase URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `{url}/storage/v1/object/{bucket}/{path}`
    fn object_url(&self, bucket: &str, path: &str) -> Result<Url> {
        let segments = ["storage", "v1", "object", bucket]
            .into_iter()
            .chain(path.split('/').filter(|s| !s.is_empty()));
        self.url(segments)
    }

    /// `{url}/rest/v1/{table}`
    fn table_url(&self, table: &str) -> Result<Url> {
        self.url(["rest", "v1", table])
    }
}

/// Turn a non-success response into an error built by `make`
async fn check_status(response: Response, make: fn(String) -> Error) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(make(format!("HTTP {}: {}", status, body.trim())))
}

/// Supabase storage buckets
pub struct SupabaseStorage {
    client: Arc<SupabaseClient>,
}

impl SupabaseStorage {
    pub fn new(client: Arc<SupabaseClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<()> {
        let url = self.client.object_url(bucket, path)?;
        let response = self
            .client
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| Error::storage(format!("Upload of {}/{} failed: {}", bucket, path, e)))?;

        check_status(response, Error::Storage).await?;
        tracing::debug!("Uploaded {} bytes to {}/{}", data.len(), bucket, path);
        Ok(())
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>> {
        let url = self.client.object_url(bucket, path)?;
        let response = self
            .client
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::storage(format!("Download of {}/{} failed: {}", bucket, path, e)))?;

        let response = check_status(response, Error::Storage).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::storage(format!("Download of {}/{} failed: {}", bucket, path, e)))?;
        Ok(bytes.to_vec())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }

        let url = self.client.url(["storage", "v1", "object", bucket])?;
        let response = self
            .client
            .client
            .delete(url)
            .json(&json!({ "prefixes": paths }))
            .send()
            .await
            .map_err(|e| Error::storage(format!("Remove from {} failed: {}", bucket, e)))?;

        check_status(response, Error::Storage).await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        let url = self.client.url(["storage", "v1", "bucket"])?;
        match self.client.client.get(url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "supabase-storage"
    }
}

/// Document table exposed through PostgREST
pub struct SupabaseTable {
    client: Arc<SupabaseClient>,
    table: String,
}

/// Number of rows in a `return=representation` body
fn count_rows(body: &str) -> serde_json::Result<usize> {
    serde_json::from_str::<Vec<IgnoredAny>>(body).map(|rows| rows.len())
}

impl SupabaseTable {
    pub fn new(client: Arc<SupabaseClient>, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    /// Table URL with PostgREST query parameters
    fn query_url(&self, params: &[(&str, String)]) -> Result<Url> {
        let mut url = self.client.table_url(&self.table)?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn filter_params(filter: &DocumentFilter) -> Vec<(&'static str, String)> {
        let mut params = vec![("select", "*".to_string())];
        match &filter.scope {
            Some(DocumentScope::User(user_id)) => params.push(("user_id", format!("eq.{}", user_id))),
            Some(DocumentScope::Company) => params.push(("user_id", "is.null".to_string())),
            None => {}
        }
        if let Some(mime_type) = &filter.mime_type {
            params.push(("mime_type", format!("eq.{}", mime_type)));
        }
        params.push(("order", "created_at.desc".to_string()));
        if let Some(limit) = filter.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }
}

#[async_trait]
impl DocumentTable for SupabaseTable {
    async fn insert(&self, record: &DocumentRecord) -> Result<()> {
        let url = self.client.table_url(&self.table)?;
        let response = self
            .client
            .client
            .post(url)
            .header("Prefer", "return=representation")
            .json(record)
            .send()
            .await
            .map_err(|e| Error::database(format!("Insert failed: {}", e)))?;

        check_status(response, Error::Database).await?;
        Ok(())
    }

    async fn get(&self, id: &Uuid) -> Result<Option<DocumentRecord>> {
        let url = self.query_url(&[
            ("select", "*".to_string()),
            ("id", format!("eq.{}", id)),
            ("limit", "1".to_string()),
        ])?;
        let response = self
            .client
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::database(format!("Select failed: {}", e)))?;

        let rows: Vec<DocumentRecord> = check_status(response, Error::Database)
            .await?
            .json()
            .await
            .map_err(|e| Error::database(format!("Invalid document row: {}", e)))?;
        Ok(rows.into_iter().next())
    }

    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<DocumentRecord>> {
        let url = self.query_url(&Self::filter_params(filter))?;
        let response = self
            .client
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::database(format!("Select failed: {}", e)))?;

        check_status(response, Error::Database)
            .await?
            .json()
            .await
            .map_err(|e| Error::database(format!("Invalid document rows: {}", e)))
    }

    async fn set_extracted_text(&self, id: &Uuid, text: &str) -> Result<bool> {
        let url = self.query_url(&[
            ("id", format!("eq.{}", id)),
            ("extracted_text", "is.null".to_string()),
            ("select", "id".to_string()),
        ])?;
        let response = self
            .client
            .client
            .patch(url)
            .header("Prefer", "return=representation")
            .json(&json!({ "extracted_text": text }))
            .send()
            .await
            .map_err(|e| Error::database(format!("Update failed: {}", e)))?;

        let body = check_status(response, Error::Database)
            .await?
            .text()
            .await
            .map_err(|e| Error::database(format!("Invalid update response: {}", e)))?;
        let updated = count_rows(&body)
            .map_err(|e| Error::database(format!("Invalid update response: {}", e)))?;
        Ok(updated > 0)
    }

    async fn delete(&self, id: &Uuid) -> Result<bool> {
        let url = self.query_url(&[("id", format!("eq.{}", id)), ("select", "id".to_string())])?;
        let response = self
            .client
            .client
            .delete(url)
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(|e| Error::database(format!("Delete failed: {}", e)))?;

        let body = check_status(response, Error::Database)
            .await?
            .text()
            .await
            .map_err(|e| Error::database(format!("Invalid delete response: {}", e)))?;
        let deleted = count_rows(&body)
            .map_err(|e| Error::database(format!("Invalid delete response: {}", e)))?;
        Ok(deleted > 0)
    }

    async fn health_check(&self) -> Result<bool> {
        let url = self.query_url(&[("select", "id".to_string()), ("limit", "1".to_string())])?;
        match self.client.client.get(url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "supabase-postgrest"
    }
}
