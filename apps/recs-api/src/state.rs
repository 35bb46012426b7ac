//! Application state management

use std::sync::Arc;

use domain_recommendations::QdrantVectorStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    pub store: Arc<QdrantVectorStore>,
}
