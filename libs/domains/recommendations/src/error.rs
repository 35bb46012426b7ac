use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("Vector store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type RecommendationResult<T> = Result<T, RecommendationError>;

impl From<qdrant_client::QdrantError> for RecommendationError {
    fn from(err: qdrant_client::QdrantError) -> Self {
        RecommendationError::StoreUnavailable(err.to_string())
    }
}

impl From<reqwest::Error> for RecommendationError {
    fn from(err: reqwest::Error) -> Self {
        RecommendationError::Embedding(err.to_string())
    }
}

impl From<serde_json::Error> for RecommendationError {
    fn from(err: serde_json::Error) -> Self {
        RecommendationError::Internal(format!("JSON error: {}", err))
    }
}

/// Convert RecommendationError to AppError for standardized HTTP error responses
impl From<RecommendationError> for AppError {
    fn from(err: RecommendationError) -> Self {
        match err {
            RecommendationError::StoreUnavailable(msg) => {
                AppError::ServiceUnavailable(format!("Vector store unavailable: {}", msg))
            }
            RecommendationError::ProductNotFound(label) => {
                AppError::NotFound(format!("Product {} not found", label))
            }
            RecommendationError::SchemaMismatch(msg) => {
                AppError::InternalServerError(format!("Schema mismatch: {}", msg))
            }
            RecommendationError::Validation(msg) => AppError::BadRequest(msg),
            RecommendationError::Embedding(msg) => {
                AppError::InternalServerError(format!("Embedding error: {}", msg))
            }
            RecommendationError::Config(msg) => {
                AppError::InternalServerError(format!("Config error: {}", msg))
            }
            RecommendationError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for RecommendationError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_store_unavailable_maps_to_503() {
        let err = RecommendationError::StoreUnavailable("connection refused".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_product_not_found_maps_to_404() {
        let err = RecommendationError::ProductNotFound("shoe-99".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_schema_mismatch_maps_to_500() {
        let err = RecommendationError::SchemaMismatch("missing field label".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_maps_to_400() {
        let err = RecommendationError::Validation("empty search query".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
