//! Document server binary
//!
//! Run with: cargo run -p assistant-docs --bin assistant-docs-server

use assistant_docs::{config::AppConfig, server::AppServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "assistant_docs=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                   Assistant Documents                     ║
║        Uploads, PDF Text Extraction, Prompt Context       ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Load configuration
    let config_path = std::env::var("ASSISTANT_DOCS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("assistant-docs.toml"));
    let config = AppConfig::load(Some(config_path.as_path()))?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Backend: {:?}", config.backend);
    tracing::info!(
        "  - Buckets: {} / {}",
        config.storage.user_bucket,
        config.storage.company_bucket
    );
    tracing::info!("  - Min extracted chars: {}", config.extraction.min_text_chars);
    tracing::info!("  - Preview chars: {}", config.extraction.preview_chars);

    // Create and start server
    let server = AppServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /functions/extract-pdf-text - Extract text from a stored PDF");
    println!("  POST /extract-text               - Extract text from an uploaded PDF");
    println!("  POST /api/documents              - Upload documents");
    println!("  GET  /api/documents              - List documents");
    println!("  GET  /api/context                - Prompt context block");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
