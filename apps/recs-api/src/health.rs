//! Readiness endpoint

use axum::{http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct ReadyResponse {
    status: &'static str,
    name: &'static str,
    version: &'static str,
}

/// 200 when the vector store answers its health check, 503 otherwise.
async fn ready(state: AppState) -> Result<Json<ReadyResponse>, StatusCode> {
    if !state.store.healthy().await {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(ReadyResponse {
        status: "ready",
        name: state.config.app.name,
        version: state.config.app.version,
    }))
}

/// Root-level `/ready` route; pairs with the shared `/health` liveness route.
pub fn router(state: AppState) -> Router {
    Router::new().route("/ready", get(move || ready(state)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::Body;
    use axum::http::Request;
    use axum_helpers::server::health_router;
    use core_config::{app_info, server::ServerConfig, Environment};
    use domain_recommendations::{ClipConfig, ClipHttpEmbedder, QdrantConfig, QdrantVectorStore};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_state() -> AppState {
        let qdrant = QdrantConfig::default();
        let embedder = Arc::new(ClipHttpEmbedder::new(ClipConfig::new(
            "http://localhost:8081".to_string(),
        )));
        let store = Arc::new(
            QdrantVectorStore::new(qdrant.clone(), embedder)
                .await
                .unwrap(),
        );
        AppState {
            config: Config {
                app: app_info!(),
                qdrant,
                clip: ClipConfig::new("http://localhost:8081".to_string()),
                server: ServerConfig::default(),
                environment: Environment::Development,
                probe_seed: None,
            },
            store,
        }
    }

    #[tokio::test]
    async fn test_liveness_and_readiness_mounted_at_root() {
        let state = test_state().await;
        let app = Router::new()
            .merge(health_router(state.config.app))
            .merge(router(state));

        let response = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Routed even when the store is unreachable; only the status differs.
        let response = app
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_ne!(response.status(), StatusCode::NOT_FOUND);
    }
}
