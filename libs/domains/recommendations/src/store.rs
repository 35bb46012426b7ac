use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{RecommendationError, RecommendationResult};
use crate::models::{order_hits, Product, ProductHit};

/// Gateway trait over the vector store backing the catalog and user profiles.
///
/// Implementations own the schema layout, the distance orientation (lower is
/// closer) and the uniqueness of user-to-product like edges.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Dimensionality of the embedding space.
    fn dimension(&self) -> usize;

    /// Create the collections if missing. Returns true when anything was created.
    async fn ensure_schema(&self) -> RecommendationResult<bool>;

    /// Drop the collections if present.
    async fn drop_schema(&self) -> RecommendationResult<()>;

    /// Register a new user point with an empty like set.
    async fn create_user(&self, session_number: i64) -> RecommendationResult<Uuid>;

    /// Add a like edge from user to product. Adding an existing edge is a no-op.
    async fn add_like(&self, user_id: Uuid, product_id: Uuid) -> RecommendationResult<()>;

    /// Remove a like edge from user to product. Removing a missing edge is a no-op.
    async fn remove_like(&self, user_id: Uuid, product_id: Uuid) -> RecommendationResult<()>;

    /// Product ids the user currently likes.
    async fn liked_products(&self, user_id: Uuid) -> RecommendationResult<Vec<Uuid>>;

    /// The user's preference vector: centroid of liked product vectors,
    /// all zeros when the like set is empty.
    async fn user_vector(&self, user_id: Uuid) -> RecommendationResult<Vec<f32>>;

    /// Look up a product id by its normalized label.
    async fn product_id_by_label(&self, label: &str) -> RecommendationResult<Option<Uuid>>;

    /// Fetch product payloads by id. Missing ids are skipped.
    async fn get_products(&self, ids: &[Uuid]) -> RecommendationResult<Vec<Product>>;

    /// Nearest products to the given vector, ordered closest first.
    async fn near_vector(
        &self,
        vector: &[f32],
        limit: usize,
    ) -> RecommendationResult<Vec<ProductHit>>;

    /// Nearest products to the embedding of the given text, ordered closest first.
    async fn near_text(&self, query: &str, limit: usize)
        -> RecommendationResult<Vec<ProductHit>>;
}

/// Cosine distance, oriented so that 0 is identical and 2 is opposite.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

#[derive(Debug, Clone)]
struct UserRecord {
    session_number: i64,
    likes: Vec<Uuid>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    products: HashMap<Uuid, (Product, Vec<f32>)>,
    users: HashMap<Uuid, UserRecord>,
    schema_ready: bool,
}

/// In-memory implementation of VectorStore (for development/testing)
#[derive(Debug, Clone)]
pub struct InMemoryVectorStore {
    dimension: usize,
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryVectorStore {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            state: Arc::new(RwLock::new(InMemoryState::default())),
        }
    }

    /// Seed or replace a product and its embedding.
    pub async fn upsert_product(
        &self,
        product: Product,
        vector: Vec<f32>,
    ) -> RecommendationResult<()> {
        if vector.len() != self.dimension {
            return Err(RecommendationError::SchemaMismatch(format!(
                "expected {} dimensions, got {}",
                self.dimension,
                vector.len()
            )));
        }
        let mut state = self.state.write().await;
        state.products.insert(product.id, (product, vector));
        Ok(())
    }

    /// Session number recorded at user creation.
    pub async fn session_number(&self, user_id: Uuid) -> RecommendationResult<i64> {
        let state = self.state.read().await;
        state
            .users
            .get(&user_id)
            .map(|u| u.session_number)
            .ok_or_else(|| RecommendationError::Internal(format!("unknown user {}", user_id)))
    }

    // Pseudo-embedding for text so near_text stays usable without a model:
    // fold query bytes into the vector space deterministically.
    fn embed_text(&self, query: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for (i, byte) in query.bytes().enumerate() {
            vector[i % self.dimension] += f32::from(byte) / 255.0;
        }
        vector
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn ensure_schema(&self) -> RecommendationResult<bool> {
        let mut state = self.state.write().await;
        let created = !state.schema_ready;
        state.schema_ready = true;
        Ok(created)
    }

    async fn drop_schema(&self) -> RecommendationResult<()> {
        let mut state = self.state.write().await;
        *state = InMemoryState::default();
        Ok(())
    }

    async fn create_user(&self, session_number: i64) -> RecommendationResult<Uuid> {
        let user_id = Uuid::new_v4();
        let mut state = self.state.write().await;
        state.users.insert(
            user_id,
            UserRecord {
                session_number,
                likes: Vec::new(),
            },
        );
        tracing::info!(user_id = %user_id, session_number, "Created user");
        Ok(user_id)
    }

    async fn add_like(&self, user_id: Uuid, product_id: Uuid) -> RecommendationResult<()> {
        let mut state = self.state.write().await;
        if !state.products.contains_key(&product_id) {
            return Err(RecommendationError::ProductNotFound(product_id.to_string()));
        }
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| RecommendationError::Internal(format!("unknown user {}", user_id)))?;
        if !user.likes.contains(&product_id) {
            user.likes.push(product_id);
        }
        Ok(())
    }

    async fn remove_like(&self, user_id: Uuid, product_id: Uuid) -> RecommendationResult<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| RecommendationError::Internal(format!("unknown user {}", user_id)))?;
        user.likes.retain(|id| *id != product_id);
        Ok(())
    }

    async fn liked_products(&self, user_id: Uuid) -> RecommendationResult<Vec<Uuid>> {
        let state = self.state.read().await;
        let user = state
            .users
            .get(&user_id)
            .ok_or_else(|| RecommendationError::Internal(format!("unknown user {}", user_id)))?;
        Ok(user.likes.clone())
    }

    async fn user_vector(&self, user_id: Uuid) -> RecommendationResult<Vec<f32>> {
        let state = self.state.read().await;
        let user = state
            .users
            .get(&user_id)
            .ok_or_else(|| RecommendationError::Internal(format!("unknown user {}", user_id)))?;

        let mut centroid = vec![0.0f32; self.dimension];
        if user.likes.is_empty() {
            return Ok(centroid);
        }
        for product_id in &user.likes {
            let (_, vector) = state.products.get(product_id).ok_or_else(|| {
                RecommendationError::Internal(format!("dangling like edge to {}", product_id))
            })?;
            for (acc, value) in centroid.iter_mut().zip(vector.iter()) {
                *acc += value;
            }
        }
        let count = user.likes.len() as f32;
        for value in &mut centroid {
            *value /= count;
        }
        Ok(centroid)
    }

    async fn product_id_by_label(&self, label: &str) -> RecommendationResult<Option<Uuid>> {
        let state = self.state.read().await;
        Ok(state
            .products
            .values()
            .find(|(p, _)| p.label == label)
            .map(|(p, _)| p.id))
    }

    async fn get_products(&self, ids: &[Uuid]) -> RecommendationResult<Vec<Product>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id).map(|(p, _)| p.clone()))
            .collect())
    }

    async fn near_vector(
        &self,
        vector: &[f32],
        limit: usize,
    ) -> RecommendationResult<Vec<ProductHit>> {
        if vector.len() != self.dimension {
            return Err(RecommendationError::SchemaMismatch(format!(
                "expected {} dimensions, got {}",
                self.dimension,
                vector.len()
            )));
        }
        let state = self.state.read().await;
        let hits: Vec<ProductHit> = state
            .products
            .values()
            .map(|(product, embedding)| ProductHit {
                product: product.clone(),
                distance: cosine_distance(vector, embedding),
            })
            .collect();
        Ok(order_hits(hits).into_iter().take(limit).collect())
    }

    async fn near_text(
        &self,
        query: &str,
        limit: usize,
    ) -> RecommendationResult<Vec<ProductHit>> {
        let vector = self.embed_text(query);
        self.near_vector(&vector, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(label: &str, index: i64) -> Product {
        Product {
            id: Uuid::new_v4(),
            label: label.to_string(),
            sku: format!("SKU-{index}"),
            category: "shoes".to_string(),
            description: format!("{label} description"),
            price: 25.0,
            qty: 3,
            index,
        }
    }

    async fn seeded_store() -> (InMemoryVectorStore, Vec<Product>) {
        let store = InMemoryVectorStore::new(4);
        store.ensure_schema().await.unwrap();
        let products = vec![product("shoe-1", 0), product("shoe-2", 1), product("shoe-3", 2)];
        let vectors = [
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0],
        ];
        for (p, v) in products.iter().zip(vectors.iter()) {
            store.upsert_product(p.clone(), v.clone()).await.unwrap();
        }
        (store, products)
    }

    #[tokio::test]
    async fn test_create_user_records_session_number() {
        let (store, _) = seeded_store().await;
        let user = store.create_user(9).await.unwrap();
        assert_eq!(store.session_number(user).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_add_like_is_idempotent() {
        let (store, products) = seeded_store().await;
        let user = store.create_user(1).await.unwrap();

        store.add_like(user, products[0].id).await.unwrap();
        store.add_like(user, products[0].id).await.unwrap();

        let likes = store.liked_products(user).await.unwrap();
        assert_eq!(likes, vec![products[0].id]);
    }

    #[tokio::test]
    async fn test_likes_are_isolated_per_user() {
        let (store, products) = seeded_store().await;
        let alice = store.create_user(1).await.unwrap();
        let bob = store.create_user(2).await.unwrap();

        store.add_like(alice, products[0].id).await.unwrap();

        assert_eq!(store.liked_products(alice).await.unwrap().len(), 1);
        assert!(store.liked_products(bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_user_vector_is_centroid_of_likes() {
        let (store, products) = seeded_store().await;
        let user = store.create_user(1).await.unwrap();

        store.add_like(user, products[0].id).await.unwrap();
        store.add_like(user, products[1].id).await.unwrap();
        assert_eq!(
            store.user_vector(user).await.unwrap(),
            vec![0.5, 0.5, 0.0, 0.0]
        );

        store.add_like(user, products[2].id).await.unwrap();
        let centroid = store.user_vector(user).await.unwrap();
        for value in &centroid[..3] {
            assert!((value - 1.0 / 3.0).abs() < 1e-6);
        }
    }

    #[tokio::test]
    async fn test_user_vector_empty_likes_is_zero() {
        let (store, _) = seeded_store().await;
        let user = store.create_user(1).await.unwrap();
        assert_eq!(store.user_vector(user).await.unwrap(), vec![0.0; 4]);
    }

    #[tokio::test]
    async fn test_near_vector_orders_by_distance() {
        let (store, _) = seeded_store().await;
        let hits = store.near_vector(&[1.0, 0.1, 0.0, 0.0], 3).await.unwrap();
        assert_eq!(hits[0].product.label, "shoe-1");
        assert!(hits[0].distance <= hits[1].distance);
        assert!(hits[1].distance <= hits[2].distance);
    }

    #[tokio::test]
    async fn test_near_vector_tie_break_by_index() {
        let store = InMemoryVectorStore::new(2);
        let a = product("a", 0);
        let b = product("b", 1);
        // Same embedding, so equal distance from any probe.
        store.upsert_product(b.clone(), vec![1.0, 0.0]).await.unwrap();
        store.upsert_product(a.clone(), vec![1.0, 0.0]).await.unwrap();

        let hits = store.near_vector(&[0.0, 1.0], 2).await.unwrap();
        assert_eq!(hits[0].product.label, "a");
        assert_eq!(hits[1].product.label, "b");
    }

    #[tokio::test]
    async fn test_product_id_by_label() {
        let (store, products) = seeded_store().await;
        let found = store.product_id_by_label("shoe-2").await.unwrap();
        assert_eq!(found, Some(products[1].id));
        assert_eq!(store.product_id_by_label("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_near_text_returns_ranked_results() {
        let (store, _) = seeded_store().await;
        let hits = store.near_text("metallic purple slippers", 3).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let (store, _) = seeded_store().await;
        let result = store.near_vector(&[1.0, 0.0], 3).await;
        assert!(matches!(
            result,
            Err(RecommendationError::SchemaMismatch(_))
        ));
    }
}
