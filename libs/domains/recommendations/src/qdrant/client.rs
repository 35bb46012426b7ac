use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    self, Condition, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, Distance,
    FieldType, Filter, GetPointsBuilder, PointId, PointStruct, ScrollPointsBuilder,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use uuid::Uuid;

use super::QdrantConfig;
use crate::embedding::TextEmbedder;
use crate::error::{RecommendationError, RecommendationResult};
use crate::models::{order_hits, Product, ProductHit};
use crate::store::VectorStore;

const SESSION_NUMBER_KEY: &str = "sessionNumber";
const LIKED_KEY: &str = "liked";
const VECTOR_KEY: &str = "vector";

/// Qdrant-backed implementation of VectorStore.
///
/// Products live in one collection with CLIP embeddings; users live in a
/// second collection whose preference vector is the centroid of the liked
/// product vectors, recomputed on every like toggle. The like set and the
/// raw centroid both live in the user point's payload: cosine collections
/// normalize stored point vectors to unit length, so the point vector
/// cannot carry the centroid unscaled.
pub struct QdrantVectorStore {
    client: Qdrant,
    embedder: Arc<dyn TextEmbedder>,
    config: QdrantConfig,
}

impl QdrantVectorStore {
    pub async fn new(
        config: QdrantConfig,
        embedder: Arc<dyn TextEmbedder>,
    ) -> RecommendationResult<Self> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(api_key) = &config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        builder = builder.timeout(Duration::from_secs(config.timeout_secs));

        let client = builder.build().map_err(|e| {
            RecommendationError::StoreUnavailable(format!("Failed to build client: {}", e))
        })?;

        Ok(Self {
            client,
            embedder,
            config,
        })
    }

    pub async fn healthy(&self) -> bool {
        self.client.health_check().await.is_ok()
    }

    fn uuid_to_point_id(id: Uuid) -> PointId {
        PointId::from(id.to_string())
    }

    fn point_id_to_uuid(point_id: &PointId) -> RecommendationResult<Uuid> {
        match &point_id.point_id_options {
            Some(qdrant::point_id::PointIdOptions::Uuid(uuid_str)) => Uuid::parse_str(uuid_str)
                .map_err(|e| RecommendationError::Internal(format!("Invalid UUID: {}", e))),
            Some(qdrant::point_id::PointIdOptions::Num(num)) => Ok(Uuid::from_u128(*num as u128)),
            None => Err(RecommendationError::Internal("Missing point ID".to_string())),
        }
    }

    fn parse_product(
        id: Uuid,
        payload: HashMap<String, QdrantValue>,
    ) -> RecommendationResult<Product> {
        let mut map = serde_json::Map::new();
        for (key, val) in payload {
            if let Some(json_val) = qdrant_value_to_json(val) {
                map.insert(key, json_val);
            }
        }
        let mut product: Product = serde_json::from_value(serde_json::Value::Object(map))
            .map_err(|e| {
                RecommendationError::SchemaMismatch(format!("bad product payload: {}", e))
            })?;
        product.id = id;
        Ok(product)
    }

    fn user_payload(
        session_number: i64,
        liked: &[Uuid],
        vector: &[f32],
    ) -> HashMap<String, QdrantValue> {
        let liked_values: Vec<QdrantValue> = liked
            .iter()
            .map(|id| QdrantValue::from(id.to_string()))
            .collect();
        let vector_values: Vec<QdrantValue> = vector
            .iter()
            .map(|v| QdrantValue::from(f64::from(*v)))
            .collect();
        HashMap::from([
            (
                SESSION_NUMBER_KEY.to_string(),
                QdrantValue::from(session_number),
            ),
            (
                LIKED_KEY.to_string(),
                QdrantValue {
                    kind: Some(qdrant::value::Kind::ListValue(qdrant::ListValue {
                        values: liked_values,
                    })),
                },
            ),
            (
                VECTOR_KEY.to_string(),
                QdrantValue {
                    kind: Some(qdrant::value::Kind::ListValue(qdrant::ListValue {
                        values: vector_values,
                    })),
                },
            ),
        ])
    }

    async fn user_point(&self, user_id: Uuid) -> RecommendationResult<qdrant::RetrievedPoint> {
        let builder = GetPointsBuilder::new(
            &self.config.users_collection,
            vec![Self::uuid_to_point_id(user_id)],
        )
        .with_payload(true)
        .with_vectors(false);

        let mut response = self.client.get_points(builder).await?;
        response.result.pop().ok_or_else(|| {
            RecommendationError::Internal(format!("unknown user {}", user_id))
        })
    }

    fn liked_from_payload(
        payload: &HashMap<String, QdrantValue>,
    ) -> RecommendationResult<Vec<Uuid>> {
        let Some(value) = payload.get(LIKED_KEY) else {
            return Ok(Vec::new());
        };
        let Some(qdrant::value::Kind::ListValue(list)) = &value.kind else {
            return Err(RecommendationError::SchemaMismatch(format!(
                "{} payload field is not a list",
                LIKED_KEY
            )));
        };
        list.values
            .iter()
            .map(|v| match &v.kind {
                Some(qdrant::value::Kind::StringValue(s)) => Uuid::parse_str(s).map_err(|e| {
                    RecommendationError::SchemaMismatch(format!("bad liked id: {}", e))
                }),
                _ => Err(RecommendationError::SchemaMismatch(
                    "liked entry is not a string".to_string(),
                )),
            })
            .collect()
    }

    fn vector_from_payload(
        payload: &HashMap<String, QdrantValue>,
    ) -> RecommendationResult<Vec<f32>> {
        let Some(value) = payload.get(VECTOR_KEY) else {
            return Err(RecommendationError::SchemaMismatch(format!(
                "user payload has no {} field",
                VECTOR_KEY
            )));
        };
        let Some(qdrant::value::Kind::ListValue(list)) = &value.kind else {
            return Err(RecommendationError::SchemaMismatch(format!(
                "{} payload field is not a list",
                VECTOR_KEY
            )));
        };
        list.values
            .iter()
            .map(|v| match &v.kind {
                Some(qdrant::value::Kind::DoubleValue(d)) => Ok(*d as f32),
                Some(qdrant::value::Kind::IntegerValue(n)) => Ok(*n as f32),
                _ => Err(RecommendationError::SchemaMismatch(
                    "vector entry is not a number".to_string(),
                )),
            })
            .collect()
    }

    fn session_from_payload(payload: &HashMap<String, QdrantValue>) -> i64 {
        match payload.get(SESSION_NUMBER_KEY).and_then(|v| v.kind.as_ref()) {
            Some(qdrant::value::Kind::IntegerValue(n)) => *n,
            _ => 0,
        }
    }

    #[allow(deprecated)]
    fn extract_vector(vectors: &Option<qdrant::VectorsOutput>) -> Option<Vec<f32>> {
        match vectors {
            Some(qdrant::VectorsOutput {
                vectors_options: Some(opts),
            }) => match opts {
                qdrant::vectors_output::VectorsOptions::Vector(v) => Some(v.data.clone()),
                qdrant::vectors_output::VectorsOptions::Vectors(map) => {
                    map.vectors.values().next().map(|v| v.data.clone())
                }
            },
            _ => None,
        }
    }

    /// Centroid of the given product vectors, zeros for an empty set.
    async fn centroid_of(&self, product_ids: &[Uuid]) -> RecommendationResult<Vec<f32>> {
        let mut centroid = vec![0.0f32; self.config.dimension];
        if product_ids.is_empty() {
            return Ok(centroid);
        }

        let point_ids: Vec<PointId> = product_ids
            .iter()
            .map(|id| Self::uuid_to_point_id(*id))
            .collect();
        let builder = GetPointsBuilder::new(&self.config.products_collection, point_ids)
            .with_vectors(true)
            .with_payload(false);
        let response = self.client.get_points(builder).await?;

        let mut count = 0usize;
        for point in &response.result {
            let Some(vector) = Self::extract_vector(&point.vectors) else {
                continue;
            };
            if vector.len() != self.config.dimension {
                return Err(RecommendationError::SchemaMismatch(format!(
                    "product vector has {} dimensions, expected {}",
                    vector.len(),
                    self.config.dimension
                )));
            }
            for (acc, value) in centroid.iter_mut().zip(vector.iter()) {
                *acc += value;
            }
            count += 1;
        }

        if count > 0 {
            for value in &mut centroid {
                *value /= count as f32;
            }
        }
        Ok(centroid)
    }

    /// Rewrite the user's like set and recompute their preference vector.
    async fn write_likes(
        &self,
        user_id: Uuid,
        session_number: i64,
        liked: Vec<Uuid>,
    ) -> RecommendationResult<()> {
        let vector = self.centroid_of(&liked).await?;
        let point = PointStruct::new(
            Self::uuid_to_point_id(user_id),
            vector.clone(),
            Self::user_payload(session_number, &liked, &vector),
        );
        let builder =
            UpsertPointsBuilder::new(&self.config.users_collection, vec![point]).wait(true);
        self.client.upsert_points(builder).await?;
        Ok(())
    }

    async fn ensure_collection(&self, name: &str) -> RecommendationResult<bool> {
        if self.client.collection_exists(name).await? {
            return Ok(false);
        }
        let builder = CreateCollectionBuilder::new(name).vectors_config(VectorParamsBuilder::new(
            self.config.dimension as u64,
            Distance::Cosine,
        ));
        self.client.create_collection(builder).await?;
        tracing::info!(collection = name, "Created collection");
        Ok(true)
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn ensure_schema(&self) -> RecommendationResult<bool> {
        let products_created = self
            .ensure_collection(&self.config.products_collection)
            .await?;
        let users_created = self.ensure_collection(&self.config.users_collection).await?;

        if products_created {
            // Keyword index so label lookups stay cheap as the catalog grows.
            let builder = CreateFieldIndexCollectionBuilder::new(
                &self.config.products_collection,
                "label",
                FieldType::Keyword,
            );
            self.client.create_field_index(builder).await?;
        }

        Ok(products_created || users_created)
    }

    async fn drop_schema(&self) -> RecommendationResult<()> {
        for name in [
            &self.config.products_collection,
            &self.config.users_collection,
        ] {
            if self.client.collection_exists(name).await? {
                self.client.delete_collection(name).await?;
                tracing::info!(collection = %name, "Deleted collection");
            }
        }
        Ok(())
    }

    async fn create_user(&self, session_number: i64) -> RecommendationResult<Uuid> {
        let user_id = Uuid::new_v4();
        let zero = vec![0.0f32; self.config.dimension];
        let point = PointStruct::new(
            Self::uuid_to_point_id(user_id),
            zero.clone(),
            Self::user_payload(session_number, &[], &zero),
        );
        let builder =
            UpsertPointsBuilder::new(&self.config.users_collection, vec![point]).wait(true);
        self.client.upsert_points(builder).await?;
        tracing::info!(user_id = %user_id, session_number, "Created user");
        Ok(user_id)
    }

    async fn add_like(&self, user_id: Uuid, product_id: Uuid) -> RecommendationResult<()> {
        let point = self.user_point(user_id).await?;
        let session_number = Self::session_from_payload(&point.payload);
        let mut liked = Self::liked_from_payload(&point.payload)?;
        if liked.contains(&product_id) {
            return Ok(());
        }
        liked.push(product_id);
        self.write_likes(user_id, session_number, liked).await
    }

    async fn remove_like(&self, user_id: Uuid, product_id: Uuid) -> RecommendationResult<()> {
        let point = self.user_point(user_id).await?;
        let session_number = Self::session_from_payload(&point.payload);
        let mut liked = Self::liked_from_payload(&point.payload)?;
        let before = liked.len();
        liked.retain(|id| *id != product_id);
        if liked.len() == before {
            return Ok(());
        }
        self.write_likes(user_id, session_number, liked).await
    }

    async fn liked_products(&self, user_id: Uuid) -> RecommendationResult<Vec<Uuid>> {
        let point = self.user_point(user_id).await?;
        Self::liked_from_payload(&point.payload)
    }

    async fn user_vector(&self, user_id: Uuid) -> RecommendationResult<Vec<f32>> {
        let point = self.user_point(user_id).await?;
        Self::vector_from_payload(&point.payload)
    }

    async fn product_id_by_label(&self, label: &str) -> RecommendationResult<Option<Uuid>> {
        let builder = ScrollPointsBuilder::new(&self.config.products_collection)
            .filter(Filter::must([Condition::matches(
                "label",
                label.to_string(),
            )]))
            .limit(1)
            .with_payload(false)
            .with_vectors(false);

        let response = self.client.scroll(builder).await?;
        match response.result.first().and_then(|p| p.id.as_ref()) {
            Some(point_id) => Ok(Some(Self::point_id_to_uuid(point_id)?)),
            None => Ok(None),
        }
    }

    async fn get_products(&self, ids: &[Uuid]) -> RecommendationResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let point_ids: Vec<PointId> = ids.iter().map(|id| Self::uuid_to_point_id(*id)).collect();
        let builder = GetPointsBuilder::new(&self.config.products_collection, point_ids)
            .with_payload(true)
            .with_vectors(false);
        let response = self.client.get_points(builder).await?;

        let mut by_id = HashMap::new();
        for point in response.result {
            let id = point
                .id
                .as_ref()
                .map(Self::point_id_to_uuid)
                .transpose()?
                .ok_or_else(|| RecommendationError::Internal("Missing point ID".to_string()))?;
            by_id.insert(id, Self::parse_product(id, point.payload)?);
        }

        // Preserve the caller's id order, skipping missing products.
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn near_vector(
        &self,
        vector: &[f32],
        limit: usize,
    ) -> RecommendationResult<Vec<ProductHit>> {
        if vector.len() != self.config.dimension {
            return Err(RecommendationError::SchemaMismatch(format!(
                "query vector has {} dimensions, expected {}",
                vector.len(),
                self.config.dimension
            )));
        }

        let builder = SearchPointsBuilder::new(
            &self.config.products_collection,
            vector.to_vec(),
            limit as u64,
        )
        .with_payload(true);

        let response = self.client.search_points(builder).await?;

        let hits = response
            .result
            .into_iter()
            .map(|point| {
                let id = point
                    .id
                    .as_ref()
                    .map(Self::point_id_to_uuid)
                    .transpose()?
                    .ok_or_else(|| {
                        RecommendationError::Internal("Missing point ID".to_string())
                    })?;
                Ok(ProductHit {
                    product: Self::parse_product(id, point.payload)?,
                    // Cosine score is a similarity; flip it so lower means closer.
                    distance: 1.0 - point.score,
                })
            })
            .collect::<RecommendationResult<Vec<ProductHit>>>()?;

        Ok(order_hits(hits))
    }

    async fn near_text(
        &self,
        query: &str,
        limit: usize,
    ) -> RecommendationResult<Vec<ProductHit>> {
        let vector = self.embedder.embed(query).await?;
        if vector.len() != self.config.dimension {
            return Err(RecommendationError::SchemaMismatch(format!(
                "embedding has {} dimensions, expected {}",
                vector.len(),
                self.config.dimension
            )));
        }
        self.near_vector(&vector, limit).await
    }
}

fn qdrant_value_to_json(val: QdrantValue) -> Option<serde_json::Value> {
    use qdrant::value::Kind;

    match val.kind {
        Some(Kind::NullValue(_)) => Some(serde_json::Value::Null),
        Some(Kind::BoolValue(b)) => Some(serde_json::Value::Bool(b)),
        Some(Kind::IntegerValue(i)) => Some(serde_json::Value::Number(i.into())),
        Some(Kind::DoubleValue(f)) => {
            serde_json::Number::from_f64(f).map(serde_json::Value::Number)
        }
        Some(Kind::StringValue(s)) => Some(serde_json::Value::String(s)),
        Some(Kind::ListValue(list)) => Some(serde_json::Value::Array(
            list.values
                .into_iter()
                .filter_map(qdrant_value_to_json)
                .collect(),
        )),
        Some(Kind::StructValue(map)) => {
            let mut object = serde_json::Map::new();
            for (key, value) in map.fields {
                if let Some(json_val) = qdrant_value_to_json(value) {
                    object.insert(key, json_val);
                }
            }
            Some(serde_json::Value::Object(object))
        }
        None => None,
    }
}

/// Build the Qdrant payload for a catalog product.
pub fn product_payload(product: &Product) -> HashMap<String, QdrantValue> {
    HashMap::from([
        ("label".to_string(), QdrantValue::from(product.label.clone())),
        ("sku".to_string(), QdrantValue::from(product.sku.clone())),
        (
            "category".to_string(),
            QdrantValue::from(product.category.clone()),
        ),
        (
            "description".to_string(),
            QdrantValue::from(product.description.clone()),
        ),
        ("price".to_string(), QdrantValue::from(product.price)),
        ("qty".to_string(), QdrantValue::from(product.qty)),
        ("index".to_string(), QdrantValue::from(product.index)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_product_from_payload() {
        let id = Uuid::new_v4();
        let product = Product {
            id,
            label: "shoe-12".to_string(),
            sku: "SKU-12".to_string(),
            category: "shoes".to_string(),
            description: "a shoe".to_string(),
            price: 49.99,
            qty: 4,
            index: 12,
        };

        let parsed = QdrantVectorStore::parse_product(id, product_payload(&product)).unwrap();
        assert_eq!(parsed, product);
    }

    #[test]
    fn test_parse_product_missing_field_is_schema_mismatch() {
        let mut payload = product_payload(&Product {
            id: Uuid::nil(),
            label: "x".to_string(),
            sku: "x".to_string(),
            category: "x".to_string(),
            description: String::new(),
            price: 1.0,
            qty: 1,
            index: 0,
        });
        payload.remove("label");

        let result = QdrantVectorStore::parse_product(Uuid::new_v4(), payload);
        assert!(matches!(
            result,
            Err(RecommendationError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_liked_roundtrip_through_payload() {
        let liked = vec![Uuid::new_v4(), Uuid::new_v4()];
        let payload = QdrantVectorStore::user_payload(3, &liked, &[0.0, 0.0]);

        assert_eq!(QdrantVectorStore::session_from_payload(&payload), 3);
        assert_eq!(
            QdrantVectorStore::liked_from_payload(&payload).unwrap(),
            liked
        );
    }

    #[test]
    fn test_empty_liked_payload() {
        let payload = QdrantVectorStore::user_payload(1, &[], &[0.0, 0.0]);
        assert!(QdrantVectorStore::liked_from_payload(&payload)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_user_payload_preserves_raw_centroid() {
        // Centroid of [1,0] and [0,1] has norm < 1; the payload copy must
        // come back exactly as written, not unit-normalized.
        let centroid = vec![0.5f32, 0.5];
        let payload = QdrantVectorStore::user_payload(1, &[], &centroid);

        assert_eq!(
            QdrantVectorStore::vector_from_payload(&payload).unwrap(),
            centroid
        );
    }

    #[test]
    fn test_missing_payload_vector_is_schema_mismatch() {
        let mut payload = QdrantVectorStore::user_payload(1, &[], &[0.25, 0.75]);
        payload.remove("vector");

        assert!(matches!(
            QdrantVectorStore::vector_from_payload(&payload),
            Err(RecommendationError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_qdrant_list_value_to_json() {
        let value = QdrantValue {
            kind: Some(qdrant::value::Kind::ListValue(qdrant::ListValue {
                values: vec![QdrantValue::from("a"), QdrantValue::from(2i64)],
            })),
        };
        let json = qdrant_value_to_json(value).unwrap();
        assert_eq!(json, serde_json::json!(["a", 2]));
    }
}
