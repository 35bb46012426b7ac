//! Recommendations Domain Library
//!
//! Personalized product recommendations over a vector catalog: user like
//! state becomes a preference centroid, and every query (initial page,
//! click toggle, free-text search) is a nearest-neighbor lookup in the
//! same embedding space.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────┐
//! │ RecommendationService │  ← Ranking queries, probe fallback
//! └──────────┬────────────┘
//!            │
//! ┌──────────▼────────────┐     ┌──────────────────┐
//! │  PreferenceTracker    │     │  SessionManager  │
//! └──────────┬────────────┘     └────────┬─────────┘
//!            │                           │
//! ┌──────────▼───────────────────────────▼─────────┐
//! │              VectorStore (trait)               │
//! ├────────────────────────────────────────────────┤
//! │  QdrantVectorStore   │   InMemoryVectorStore   │
//! └──────────┬───────────┴─────────────────────────┘
//!            │
//! ┌──────────▼────────────┐
//! │ TextEmbedder (trait)  │  ← ClipHttpEmbedder
//! └───────────────────────┘
//! ```

pub mod embedding;
pub mod error;
pub mod handlers;
pub mod models;
pub mod preferences;
pub mod probe;
pub mod qdrant;
pub mod service;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use embedding::{ClipConfig, ClipHttpEmbedder, TextEmbedder};
pub use error::{RecommendationError, RecommendationResult};
pub use handlers::{ApiDoc, ClickRequest, RecommendationState, SearchRequest};
pub use models::{Product, ProductHit, RecommendationPage, UserProfile};
pub use preferences::{label_from_image_path, PreferenceTracker};
pub use probe::{ProbeVectorSource, RandomProbe, SeededProbe};
pub use qdrant::{QdrantConfig, QdrantVectorStore, DEFAULT_DIMENSION};
pub use service::{RecommendationService, DEFAULT_PAGE_SIZE};
pub use session::SessionManager;
pub use store::{InMemoryVectorStore, VectorStore};
