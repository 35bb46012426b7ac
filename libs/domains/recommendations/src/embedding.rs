use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{RecommendationError, RecommendationResult};

/// Text embedding provider for hybrid text queries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed a text query into the catalog's vector space.
    async fn embed(&self, text: &str) -> RecommendationResult<Vec<f32>>;
}

/// CLIP inference endpoint configuration
#[derive(Debug, Clone)]
pub struct ClipConfig {
    pub base_url: String,
}

impl ClipConfig {
    pub fn new(base_url: String) -> Self {
        Self { base_url }
    }

    pub fn from_env() -> RecommendationResult<Self> {
        let base_url = std::env::var("CLIP_URL")
            .unwrap_or_else(|_| "http://localhost:8081".to_string());
        Ok(Self { base_url })
    }
}

/// Embeds text via an HTTP CLIP inference service.
pub struct ClipHttpEmbedder {
    client: Client,
    config: ClipConfig,
}

impl ClipHttpEmbedder {
    pub fn new(config: ClipConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn from_env() -> RecommendationResult<Self> {
        Ok(Self::new(ClipConfig::from_env()?))
    }
}

#[derive(Debug, Serialize)]
struct ClipRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ClipResponse {
    vector: Vec<f32>,
}

#[async_trait]
impl TextEmbedder for ClipHttpEmbedder {
    async fn embed(&self, text: &str) -> RecommendationResult<Vec<f32>> {
        let response = self
            .client
            .post(format!("{}/vectorize", self.config.base_url))
            .json(&ClipRequest { text })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RecommendationError::Embedding(format!(
                "CLIP service error ({}): {}",
                status, error_text
            )));
        }

        let body: ClipResponse = response.json().await?;
        if body.vector.is_empty() {
            return Err(RecommendationError::Embedding(
                "CLIP service returned empty vector".to_string(),
            ));
        }
        Ok(body.vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_config_default_url() {
        let config = ClipConfig::new("http://clip:8081".to_string());
        assert_eq!(config.base_url, "http://clip:8081");
    }

    #[tokio::test]
    async fn test_mock_embedder() {
        let mut embedder = MockTextEmbedder::new();
        embedder
            .expect_embed()
            .returning(|_| Ok(vec![0.1, 0.2, 0.3]));
        let vector = embedder.embed("red shoes").await.unwrap();
        assert_eq!(vector.len(), 3);
    }
}
