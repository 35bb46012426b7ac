use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A catalog product as stored in the vector collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    #[serde(skip)]
    pub id: Uuid,
    /// Normalized image identifier, e.g. `shoe-12` for `images/shoe-12.jpg`.
    pub label: String,
    pub sku: String,
    pub category: String,
    pub description: String,
    pub price: f64,
    pub qty: i64,
    /// Stable display position within the seeded catalog.
    pub index: i64,
}

/// A product together with its distance from the query vector.
///
/// Distances are oriented so that lower means closer, regardless of the
/// backing store's native score convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductHit {
    #[serde(flatten)]
    pub product: Product,
    pub distance: f32,
}

/// A user's session profile: which products they have liked so far.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub liked: Vec<Product>,
}

impl UserProfile {
    pub fn click_labels(&self) -> Vec<String> {
        self.liked.iter().map(|p| p.label.clone()).collect()
    }
}

/// Ranked recommendations plus the click state they were computed from.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecommendationPage {
    pub data: Vec<ProductHit>,
    pub user_clicks: Vec<String>,
}

/// Orders hits by ascending distance, breaking ties by catalog index.
pub fn order_hits(mut hits: Vec<ProductHit>) -> Vec<ProductHit> {
    hits.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then(a.product.index.cmp(&b.product.index))
    });
    hits
}
