//! Manuscript store server binary
//!
//! Run with: cargo run -p manuscript-store --bin manuscript-store-server

use manuscript_store::{config::AppConfig, error::expose_error_detail, ManuscriptServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "manuscript_store=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;
    expose_error_detail(!config.server.production);

    tracing::info!("Configuration loaded");
    tracing::info!("  - Storage root: {}", config.storage.root.display());
    tracing::info!("  - Database: {}", config.database.path.display());
    tracing::info!("  - Remote store: {:?}", config.remote.kind);
    tracing::info!(
        "  - Mirror store: {}",
        config
            .mirror
            .as_ref()
            .map(|m| format!("{:?}", m.kind))
            .unwrap_or_else(|| "none".to_string())
    );
    tracing::info!("  - Production mode: {}", config.server.production);

    let server = ManuscriptServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/journals         - Upload a journal (pdfFile + docxFile)");
    println!("  POST /api/submissions      - Upload a submission (file)");
    println!("  GET  /download/:kind/:id   - Download a PDF or DOCX");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
