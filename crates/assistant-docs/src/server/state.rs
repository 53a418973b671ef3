//! Application state for the document server

use std::sync::Arc;

use crate::config::{AppConfig, BackendProvider};
use crate::error::{Error, Result};
use crate::extraction::PdfExtractor;
use crate::generation::ContextBuilder;
use crate::pipeline::{DocumentService, UploadPipeline};
use crate::providers::{
    local::{LocalObjectStore, SqliteDocumentTable},
    supabase::{SupabaseClient, SupabaseStorage, SupabaseTable},
    DocumentTable, ObjectStore,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: AppConfig,
    /// Object store for raw bytes (local filesystem or Supabase storage)
    store: Arc<dyn ObjectStore>,
    /// Document table (SQLite or PostgREST)
    table: Arc<dyn DocumentTable>,
    /// PDF extractor, built once per process
    extractor: Arc<PdfExtractor>,
    /// Upload pipeline
    pipeline: UploadPipeline,
    /// Listing, download, deletion
    documents: DocumentService,
    /// Prompt context assembly
    context: ContextBuilder,
}

impl AppState {
    /// Create state with the backend named in the config
    pub async fn new(config: AppConfig) -> Result<Self> {
        tracing::info!("Initializing document service state (backend: {:?})...", config.backend);

        let (store, table): (Arc<dyn ObjectStore>, Arc<dyn DocumentTable>) = match config.backend {
            BackendProvider::Local => {
                tracing::info!(
                    "Using local backend (objects: {}, database: {})",
                    config.storage.local_root.display(),
                    config.database.path.display()
                );
                let store = Arc::new(LocalObjectStore::new(config.storage.local_root.clone())?);
                let table = Arc::new(SqliteDocumentTable::from_config(&config)?);
                (store, table)
            }
            BackendProvider::Supabase => {
                let supabase = config.supabase.as_ref().ok_or_else(|| {
                    Error::Config("Supabase backend selected but supabase config is missing".to_string())
                })?;
                tracing::info!("Using Supabase backend ({})", supabase.url);
                let client = Arc::new(SupabaseClient::new(supabase)?);
                let store = Arc::new(SupabaseStorage::new(Arc::clone(&client)));
                let table = Arc::new(SupabaseTable::new(client, config.database.table.clone()));
                (store, table)
            }
        };

        Ok(Self::from_parts(config, store, table))
    }

    /// Create state over already-built providers
    pub fn from_parts(
        config: AppConfig,
        store: Arc<dyn ObjectStore>,
        table: Arc<dyn DocumentTable>,
    ) -> Self {
        let extractor = Arc::new(PdfExtractor::new(&config.extraction));

        let pipeline = UploadPipeline::new(
            Arc::clone(&store),
            Arc::clone(&table),
            Arc::clone(&extractor),
            &config,
        );
        let documents =
            DocumentService::new(Arc::clone(&store), Arc::clone(&table), config.storage.clone());
        let context = ContextBuilder::new(
            Arc::clone(&store),
            Arc::clone(&table),
            Arc::clone(&extractor),
            &config,
        );

        tracing::info!(
            "Providers ready (object store: {}, document table: {})",
            store.name(),
            table.name()
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                table,
                extractor,
                pipeline,
                documents,
                context,
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get object store
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.inner.store
    }

    /// Get PDF extractor
    pub fn extractor(&self) -> &Arc<PdfExtractor> {
        &self.inner.extractor
    }

    /// Get upload pipeline
    pub fn pipeline(&self) -> &UploadPipeline {
        &self.inner.pipeline
    }

    /// Get document service
    pub fn documents(&self) -> &DocumentService {
        &self.inner.documents
    }

    /// Get context builder
    pub fn context(&self) -> &ContextBuilder {
        &self.inner.context
    }

    /// Whether both providers answer their health checks
    pub async fn is_ready(&self) -> bool {
        let store = self.inner.store.health_check().await.unwrap_or(false);
        let table = self.inner.table.health_check().await.unwrap_or(false);
        if !(store && table) {
            tracing::warn!(
                "Not ready (object store: {}, document table: {})",
                store,
                table
            );
        }
        store && table
    }
}
