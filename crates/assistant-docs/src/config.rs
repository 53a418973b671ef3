//! Configuration for the document service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::DocumentScope;

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backend provider (local or supabase)
    pub backend: BackendProvider,
    /// Server configuration
    pub server: ServerConfig,
    /// Object storage configuration
    pub storage: StorageConfig,
    /// Document table configuration
    pub database: DatabaseConfig,
    /// Text extraction configuration
    pub extraction: ExtractionConfig,
    /// Supabase configuration (required when backend = supabase)
    pub supabase: Option<SupabaseConfig>,
}

impl AppConfig {
    /// Load configuration from an optional TOML file, then apply
    /// environment overrides.
    ///
    /// A missing file is not an error; defaults are used instead.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(path)?;
                toml::from_str::<AppConfig>(&raw).map_err(|e| {
                    Error::Config(format!("Invalid config file {}: {}", path.display(), e))
                })?
            }
            Some(path) => {
                tracing::debug!("Config file {} not found, using defaults", path.display());
                AppConfig::default()
            }
            None => AppConfig::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in production)
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("ASSISTANT_DOCS_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("ASSISTANT_DOCS_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| Error::Config(format!("Invalid ASSISTANT_DOCS_PORT: {}", port)))?;
        }
        if let Some(backend) = lookup("ASSISTANT_DOCS_BACKEND") {
            self.backend = match backend.to_lowercase().as_str() {
                "local" => BackendProvider::Local,
                "supabase" => BackendProvider::Supabase,
                other => {
                    return Err(Error::Config(format!("Unknown backend: {}", other)));
                }
            };
        }

        let url = lookup("SUPABASE_URL");
        let key = lookup("SUPABASE_SERVICE_ROLE_KEY");
        if url.is_some() || key.is_some() {
            let supabase = self.supabase.get_or_insert_with(SupabaseConfig::default);
            if let Some(url) = url {
                supabase.url = url;
            }
            if let Some(key) = key {
                supabase.service_key = key;
            }
        }

        Ok(())
    }

    /// Check cross-field requirements
    pub fn validate(&self) -> Result<()> {
        if self.backend == BackendProvider::Supabase {
            let supabase = self.supabase.as_ref().ok_or_else(|| {
                Error::Config("Supabase backend selected but supabase config is missing".to_string())
            })?;
            if supabase.url.is_empty() || supabase.service_key.is_empty() {
                return Err(Error::Config(
                    "Supabase backend requires both url and service_key".to_string(),
                ));
            }
        }
        if self.storage.user_bucket == self.storage.company_bucket {
            return Err(Error::Config(
                "user_bucket and company_bucket must differ".to_string(),
            ));
        }
        Ok(())
    }
}

/// Backend provider selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BackendProvider {
    /// Local backend (filesystem + SQLite)
    #[default]
    Local,
    /// Supabase storage + PostgREST
    Supabase,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// Object storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Bucket holding documents owned by a single user
    pub user_bucket: String,
    /// Bucket holding company-wide documents
    pub company_bucket: String,
    /// Root directory for the local backend
    pub local_root: PathBuf,
}

impl StorageConfig {
    /// Bucket that holds documents for the given scope
    pub fn bucket_for(&self, scope: &DocumentScope) -> &str {
        match scope {
            DocumentScope::User(_) => &self.user_bucket,
            DocumentScope::Company => &self.company_bucket,
        }
    }

    /// Whether a bucket name is one this service manages
    pub fn is_known_bucket(&self, bucket: &str) -> bool {
        bucket == self.user_bucket || bucket == self.company_bucket
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            user_bucket: "user-documents".to_string(),
            company_bucket: "company-documents".to_string(),
            local_root: data_dir().join("objects"),
        }
    }
}

/// Document table configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file for the local backend
    pub path: PathBuf,
    /// Table name (PostgREST resource for the supabase backend)
    pub table: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: data_dir().join("documents.db"),
            table: "documents".to_string(),
        }
    }
}

/// Text extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Extracted text must be longer than this many characters to be kept
    pub min_text_chars: usize,
    /// Characters of cached text shown per document in the context block
    pub preview_chars: usize,
    /// Maximum pages read per PDF (0 = all pages)
    pub max_pages: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_text_chars: 50,
            preview_chars: 1000,
            max_pages: 0,
        }
    }
}

/// Supabase project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupabaseConfig {
    /// Project URL, e.g. "https://abc.supabase.co"
    pub url: String,
    /// Service role key, sent as both `apikey` and bearer token
    pub service_key: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            service_key: String::new(),
            timeout_secs: 30,
        }
    }
}

fn data_dir() -> PathBuf {
    // Absolute path so the local object store never resolves relative to cwd
    dirs::data_local_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")))
        .join("assistant-docs")
}
