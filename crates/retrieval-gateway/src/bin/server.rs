//! Retrieval gateway server binary
//!
//! Run with: cargo run -p retrieval-gateway --bin retrieval-gateway-server

use retrieval_gateway::{create_backend, Gateway, GatewayConfig, GatewayServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "retrieval_gateway=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = GatewayConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Datastore: {}", config.datastore.backend);
    tracing::info!("  - Embedding provider: {:?}", config.embeddings.provider);
    tracing::info!("  - Embedding dimensions: {}", config.embeddings.dimensions);
    tracing::info!("  - Chunk size: {}", config.chunking.chunk_size);

    // The backend is fixed for the life of the process
    let backend = create_backend(&config).await?;
    if !backend.health_check().await.unwrap_or(false) {
        tracing::warn!("Datastore '{}' is not healthy yet", backend.name());
    }

    let server = GatewayServer::new(config, Gateway::new(backend));

    tracing::info!("Endpoints on http://{}:", server.address());
    tracing::info!("  POST   /upsert       - Store documents");
    tracing::info!("  POST   /upsert-file  - Upload a file");
    tracing::info!("  POST   /query        - Similarity search");
    tracing::info!("  DELETE /delete       - Remove documents");

    server.start().await?;

    Ok(())
}
