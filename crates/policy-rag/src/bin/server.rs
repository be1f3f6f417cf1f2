//! Policy RAG server binary
//!
//! Run with: cargo run -p policy-rag --bin policy-rag-server
//! Set POLICY_RAG_CONFIG to a TOML file to override the defaults.

use policy_rag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "policy_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                     Policy RAG Chat                       ║
║     Health Insurance Q&A with Grounded Source Disclosure  ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let config = RagConfig::load(None)?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Backend: {:?}", config.backend);
    tracing::info!("  - Embedding model: {}", config.llm.embed_model);
    tracing::info!("  - LLM model: {}", config.llm.generate_model);
    tracing::info!("  - Chunk size: {} (overlap {})", config.chunking.chunk_size, config.chunking.chunk_overlap);
    tracing::info!("  - Index directory: {}", config.index.directory.display());
    match &config.index.documents_dir {
        Some(dir) => tracing::info!("  - Documents: {}", dir.display()),
        None => tracing::info!("  - Documents: built-in demo corpus"),
    }

    // Loads the persisted index or builds it; fatal if neither is possible
    let server = RagServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST   /api/sessions                - Start a conversation");
    println!("  POST   /api/sessions/:id/ask        - Ask a question");
    println!("  DELETE /api/sessions/:id/history    - Clear the conversation");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
