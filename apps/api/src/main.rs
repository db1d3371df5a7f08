mod config;
mod db;
mod errors;
mod generation;
mod llm_client;
mod models;
mod posts;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::generation::generator::PostGenerator;
use crate::generation::memory::ClientMemory;
use crate::generation::phrase_bank::PhraseBanks;
use crate::generation::retrieval::{EmptyIndex, HttpSimilarityIndex, SimilarityIndex};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Post Generator API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize LLM client
    let llm = LlmClient::new(
        &config.azure_openai_endpoint,
        &config.azure_openai_deployment,
        &config.azure_openai_api_version,
        config.azure_openai_api_key.clone(),
    )?;
    info!(
        "LLM client initialized (deployment: {})",
        config.azure_openai_deployment
    );

    // Similarity index: HTTP backend when configured, otherwise empty
    let index: Arc<dyn SimilarityIndex> = match &config.similarity_search_url {
        Some(url) => {
            info!("Similarity search at {url}");
            Arc::new(HttpSimilarityIndex::new(url.clone())?)
        }
        None => {
            info!("SIMILARITY_SEARCH_URL not set; generating without example posts");
            Arc::new(EmptyIndex)
        }
    };

    let banks = PhraseBanks::load(&config.hooks_path, &config.frameworks_path, &config.ctas_path);
    let memory = Arc::new(ClientMemory::new());

    if let Some(ttl) = config.client_idle_ttl {
        spawn_memory_eviction(Arc::clone(&memory), ttl);
    }

    let generator = PostGenerator::new(
        Arc::new(llm),
        index,
        banks,
        memory,
        config.similar_posts_k,
    );

    // Build app state
    let state = AppState {
        db,
        generator: Arc::new(generator),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client has a fixed domain

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically drops client memory idle for longer than `ttl`.
fn spawn_memory_eviction(memory: Arc<ClientMemory>, ttl: Duration) {
    info!("Client memory idle TTL: {}s", ttl.as_secs());
    let period = (ttl / 2).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let evicted = memory.evict_idle(ttl);
            if evicted > 0 {
                info!("Evicted {evicted} idle client(s); {} remain", memory.len());
            }
        }
    });
}
