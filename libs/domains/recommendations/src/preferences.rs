use std::sync::Arc;

use uuid::Uuid;

use crate::error::{RecommendationError, RecommendationResult};
use crate::models::UserProfile;
use crate::store::VectorStore;

/// Normalizes a clicked image path into the catalog label.
///
/// `images/shoe-12.jpg` and `shoe-12.jpg` both map to `shoe-12`.
pub fn label_from_image_path(image_path: &str) -> String {
    let trimmed = image_path.strip_prefix("images/").unwrap_or(image_path);
    trimmed.strip_suffix(".jpg").unwrap_or(trimmed).to_string()
}

/// Tracks per-user like state against the vector store.
pub struct PreferenceTracker<S: VectorStore> {
    store: Arc<S>,
}

impl<S: VectorStore> Clone for PreferenceTracker<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: VectorStore> PreferenceTracker<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Toggle the like edge for the clicked image. Returns true when the
    /// product is liked after the toggle, false when the like was removed.
    pub async fn toggle_like(
        &self,
        user_id: Uuid,
        image_path: &str,
    ) -> RecommendationResult<bool> {
        let label = label_from_image_path(image_path);
        let product_id = self
            .store
            .product_id_by_label(&label)
            .await?
            .ok_or_else(|| RecommendationError::ProductNotFound(label.clone()))?;

        let liked = self.store.liked_products(user_id).await?;
        if liked.contains(&product_id) {
            self.store.remove_like(user_id, product_id).await?;
            tracing::info!(user_id = %user_id, label = %label, "Removed like");
            Ok(false)
        } else {
            self.store.add_like(user_id, product_id).await?;
            tracing::info!(user_id = %user_id, label = %label, "Added like");
            Ok(true)
        }
    }

    /// The user's current like set as full product payloads.
    pub async fn profile(&self, user_id: Uuid) -> RecommendationResult<UserProfile> {
        let ids = self.store.liked_products(user_id).await?;
        let liked = self.store.get_products(&ids).await?;
        Ok(UserProfile { user_id, liked })
    }

    /// Centroid of the liked product vectors, all zeros when nothing is liked.
    pub async fn preference_vector(&self, user_id: Uuid) -> RecommendationResult<Vec<f32>> {
        self.store.user_vector(user_id).await
    }

    pub async fn has_likes(&self, user_id: Uuid) -> RecommendationResult<bool> {
        Ok(!self.store.liked_products(user_id).await?.is_empty())
    }
}
