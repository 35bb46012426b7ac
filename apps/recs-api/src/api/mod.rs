//! API routes module

use std::sync::Arc;

use axum::Router;
use domain_recommendations::{
    handlers, ProbeVectorSource, RandomProbe, RecommendationService, RecommendationState,
    SeededProbe, SessionManager,
};

use crate::state::AppState;

/// Create all API routes
pub fn routes(state: &AppState) -> Router {
    let probe: Arc<dyn ProbeVectorSource> = match state.config.probe_seed {
        Some(seed) => Arc::new(SeededProbe::new(seed)),
        None => Arc::new(RandomProbe),
    };

    let recommendation_state = RecommendationState {
        service: RecommendationService::new(Arc::clone(&state.store), probe),
        sessions: SessionManager::new(Arc::clone(&state.store)),
    };

    Router::new().nest("/recommendations", handlers::router(recommendation_state))
}
