use crate::error::{RecommendationError, RecommendationResult};

pub const DEFAULT_DIMENSION: usize = 512;

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> RecommendationResult<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|e| {
            RecommendationError::Config(format!("invalid {} value '{}': {}", key, raw, e))
        }),
        Err(_) => Ok(default),
    }
}

/// Qdrant connection and schema configuration
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub products_collection: String,
    pub users_collection: String,
    pub dimension: usize,
}

impl QdrantConfig {
    pub fn new(url: String) -> Self {
        Self {
            url,
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn from_env() -> RecommendationResult<Self> {
        let url =
            std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://localhost:6334".to_string());

        let api_key = std::env::var("QDRANT_API_KEY").ok();

        let timeout_secs = env_parsed("QDRANT_TIMEOUT_SECS", 30)?;
        let dimension = env_parsed("VECTOR_DIMENSION", DEFAULT_DIMENSION)?;

        Ok(Self {
            url,
            api_key,
            timeout_secs,
            dimension,
            ..Self::default()
        })
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            api_key: None,
            timeout_secs: 30,
            products_collection: "products".to_string(),
            users_collection: "users".to_string(),
            dimension: DEFAULT_DIMENSION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_defaults_when_unset() {
        temp_env::with_vars(
            [
                ("QDRANT_TIMEOUT_SECS", None::<&str>),
                ("VECTOR_DIMENSION", None::<&str>),
            ],
            || {
                let config = QdrantConfig::from_env().unwrap();
                assert_eq!(config.timeout_secs, 30);
                assert_eq!(config.dimension, DEFAULT_DIMENSION);
            },
        );
    }

    #[test]
    fn test_from_env_reads_overrides() {
        temp_env::with_vars(
            [
                ("QDRANT_TIMEOUT_SECS", Some("5")),
                ("VECTOR_DIMENSION", Some("128")),
            ],
            || {
                let config = QdrantConfig::from_env().unwrap();
                assert_eq!(config.timeout_secs, 5);
                assert_eq!(config.dimension, 128);
            },
        );
    }

    #[test]
    fn test_malformed_dimension_is_config_error() {
        temp_env::with_var("VECTOR_DIMENSION", Some("not_a_number"), || {
            let result = QdrantConfig::from_env();
            assert!(matches!(result, Err(RecommendationError::Config(_))));
        });
    }

    #[test]
    fn test_malformed_timeout_is_config_error() {
        temp_env::with_var("QDRANT_TIMEOUT_SECS", Some("3.5"), || {
            let result = QdrantConfig::from_env();
            assert!(matches!(result, Err(RecommendationError::Config(_))));
        });
    }
}
