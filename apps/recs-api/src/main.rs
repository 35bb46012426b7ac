//! Recommendations API - REST server

use std::sync::Arc;

use axum_helpers::server::{create_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_recommendations::{ClipHttpEmbedder, QdrantVectorStore, VectorStore};
use tracing::info;

mod api;
mod config;
mod health;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!("Connecting to Qdrant at {}", config.qdrant.url);

    let embedder = Arc::new(ClipHttpEmbedder::new(config.clip.clone()));
    let store = Arc::new(
        QdrantVectorStore::new(config.qdrant.clone(), embedder)
            .await
            .map_err(|e| eyre::eyre!("Failed to connect to Qdrant: {}", e))?,
    );

    let created = store
        .ensure_schema()
        .await
        .map_err(|e| eyre::eyre!("Failed to provision schema: {}", e))?;
    if created {
        info!("Provisioned vector store collections");
    }

    let state = AppState {
        config: config.clone(),
        store,
    };

    let api_routes = api::routes(&state);
    let router = axum_helpers::create_router::<openapi::ApiDoc>(api_routes).await?;
    let app = router
        .merge(health_router(config.app.clone()))
        .merge(health::router(state.clone()));

    info!("Starting Recommendations API on port {}", config.server.port);

    create_app(app, &config.server).await?;

    info!("Recommendations API shutdown complete");
    Ok(())
}
