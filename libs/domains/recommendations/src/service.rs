use std::sync::Arc;

use uuid::Uuid;

use crate::error::{RecommendationError, RecommendationResult};
use crate::models::RecommendationPage;
use crate::preferences::PreferenceTracker;
use crate::probe::ProbeVectorSource;
use crate::store::VectorStore;

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Ranking query engine: turns preference state into ordered product pages.
pub struct RecommendationService<S: VectorStore> {
    store: Arc<S>,
    tracker: PreferenceTracker<S>,
    probe: Arc<dyn ProbeVectorSource>,
    page_size: usize,
}

impl<S: VectorStore> Clone for RecommendationService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            tracker: self.tracker.clone(),
            probe: Arc::clone(&self.probe),
            page_size: self.page_size,
        }
    }
}

impl<S: VectorStore> RecommendationService<S> {
    pub fn new(store: Arc<S>, probe: Arc<dyn ProbeVectorSource>) -> Self {
        Self {
            tracker: PreferenceTracker::new(Arc::clone(&store)),
            store,
            probe,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn tracker(&self) -> &PreferenceTracker<S> {
        &self.tracker
    }

    /// Landing-page set: always ranked against a fresh probe vector, so
    /// every page load explores the catalog anew. Click state still rides
    /// along in `user_clicks`.
    pub async fn initial_recommendations(
        &self,
        user_id: Uuid,
    ) -> RecommendationResult<RecommendationPage> {
        let vector = self.probe.probe(self.store.dimension());
        self.recommend_by_vector(user_id, &vector).await
    }

    /// Recommendations for the user's current preference state.
    ///
    /// A user with no likes yet has no preference signal, so the query runs
    /// against a fresh probe vector instead of the all-zero centroid.
    pub async fn recommendations(&self, user_id: Uuid) -> RecommendationResult<RecommendationPage> {
        let vector = if self.tracker.has_likes(user_id).await? {
            self.tracker.preference_vector(user_id).await?
        } else {
            self.probe.probe(self.store.dimension())
        };
        self.recommend_by_vector(user_id, &vector).await
    }

    /// Nearest products to an explicit query vector, with the user's click state.
    pub async fn recommend_by_vector(
        &self,
        user_id: Uuid,
        vector: &[f32],
    ) -> RecommendationResult<RecommendationPage> {
        let data = self.store.near_vector(vector, self.page_size).await?;
        let profile = self.tracker.profile(user_id).await?;
        Ok(RecommendationPage {
            data,
            user_clicks: profile.click_labels(),
        })
    }

    /// Text search over the catalog, ranked by embedding proximity.
    pub async fn search_by_text(
        &self,
        user_id: Uuid,
        query: &str,
    ) -> RecommendationResult<RecommendationPage> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RecommendationError::Validation(
                "search query must not be empty".to_string(),
            ));
        }
        let data = self.store.near_text(query, self.page_size).await?;
        let profile = self.tracker.profile(user_id).await?;
        Ok(RecommendationPage {
            data,
            user_clicks: profile.click_labels(),
        })
    }

    /// Toggle the like for a clicked image and re-rank against the
    /// updated preference vector.
    pub async fn on_image_clicked(
        &self,
        user_id: Uuid,
        image_path: &str,
    ) -> RecommendationResult<RecommendationPage> {
        let now_liked = self.tracker.toggle_like(user_id, image_path).await?;
        tracing::debug!(user_id = %user_id, image_path, now_liked, "Click toggled");
        self.recommendations(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;
    use crate::probe::SeededProbe;
    use crate::store::InMemoryVectorStore;

    fn product(label: &str, index: i64) -> Product {
        Product {
            id: Uuid::new_v4(),
            label: label.to_string(),
            sku: format!("SKU-{index}"),
            category: "shoes".to_string(),
            description: format!("{label} description"),
            price: 30.0,
            qty: 5,
            index,
        }
    }

    async fn service_with_catalog() -> (RecommendationService<InMemoryVectorStore>, Uuid) {
        let store = Arc::new(InMemoryVectorStore::new(2));
        store
            .upsert_product(product("shoe-1", 0), vec![1.0, 0.0])
            .await
            .unwrap();
        store
            .upsert_product(product("shoe-2", 1), vec![0.0, 1.0])
            .await
            .unwrap();
        store
            .upsert_product(product("shoe-3", 2), vec![0.7, 0.7])
            .await
            .unwrap();
        let user = store.create_user(1).await.unwrap();
        let service = RecommendationService::new(store, Arc::new(SeededProbe::new(42)));
        (service, user)
    }

    #[tokio::test]
    async fn test_recommendations_without_likes_use_probe_fallback() {
        let (service, user) = service_with_catalog().await;
        let page = service.recommendations(user).await.unwrap();

        assert_eq!(page.data.len(), 3);
        assert!(page.user_clicks.is_empty());
        assert!(page.data.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[tokio::test]
    async fn test_recommendations_follow_preference_vector() {
        let (service, user) = service_with_catalog().await;
        service.on_image_clicked(user, "images/shoe-1.jpg").await.unwrap();

        let page = service.recommendations(user).await.unwrap();
        assert_eq!(page.data[0].product.label, "shoe-1");
        assert_eq!(page.user_clicks, vec!["shoe-1"]);
    }

    #[tokio::test]
    async fn test_click_toggle_returns_to_probe_fallback() {
        let (service, user) = service_with_catalog().await;
        service.on_image_clicked(user, "images/shoe-2.jpg").await.unwrap();
        let page = service.on_image_clicked(user, "images/shoe-2.jpg").await.unwrap();

        assert!(page.user_clicks.is_empty());
        assert_eq!(page.data.len(), 3);
    }

    #[tokio::test]
    async fn test_click_unknown_image_fails() {
        let (service, user) = service_with_catalog().await;
        let result = service.on_image_clicked(user, "images/ghost.jpg").await;
        assert!(matches!(
            result,
            Err(RecommendationError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_initial_recommendations_keep_click_state() {
        let (service, user) = service_with_catalog().await;
        service.on_image_clicked(user, "images/shoe-2.jpg").await.unwrap();

        let page = service.initial_recommendations(user).await.unwrap();
        assert_eq!(page.user_clicks, vec!["shoe-2"]);
        assert_eq!(page.data.len(), 3);
    }

    #[tokio::test]
    async fn test_search_by_text_returns_ranked_page() {
        let (service, user) = service_with_catalog().await;
        service.on_image_clicked(user, "shoe-3.jpg").await.unwrap();

        let page = service.search_by_text(user, "anything at all").await.unwrap();
        assert_eq!(page.data.len(), 3);
        assert_eq!(page.user_clicks, vec!["shoe-3"]);
        assert!(page.data.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[tokio::test]
    async fn test_search_rejects_empty_query() {
        let (service, user) = service_with_catalog().await;
        let result = service.search_by_text(user, "   ").await;
        assert!(matches!(result, Err(RecommendationError::Validation(_))));
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let mut store = crate::store::MockVectorStore::new();
        store.expect_dimension().return_const(2usize);
        store.expect_liked_products().returning(|_| {
            Err(RecommendationError::StoreUnavailable(
                "connection refused".to_string(),
            ))
        });

        let service =
            RecommendationService::new(Arc::new(store), Arc::new(SeededProbe::new(1)));
        let result = service.recommendations(Uuid::new_v4()).await;
        assert!(matches!(
            result,
            Err(RecommendationError::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_page_size_caps_results() {
        let (service, user) = service_with_catalog().await;
        let service = service.with_page_size(2);
        let page = service.recommendations(user).await.unwrap();
        assert_eq!(page.data.len(), 2);
    }
}
