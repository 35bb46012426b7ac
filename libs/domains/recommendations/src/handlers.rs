//! HTTP handlers for the recommendations API

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use axum_helpers::{
    errors::responses::{
        BadRequestValidationResponse, InternalServerErrorResponse, NotFoundResponse,
        ServiceUnavailableResponse,
    },
    ValidatedJson,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use validator::Validate;

use crate::error::{RecommendationError, RecommendationResult};
use crate::models::{Product, ProductHit, RecommendationPage};
use crate::service::RecommendationService;
use crate::session::SessionManager;
use crate::store::VectorStore;

pub const SESSION_HEADER: &str = "x-session-id";

/// A click on a product image, toggling its like state.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ClickRequest {
    #[serde(rename = "imagePath")]
    #[validate(length(min = 1, message = "imagePath must not be empty"))]
    pub image_path: String,
}

/// A free-text catalog search.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SearchRequest {
    #[serde(rename = "searchQuery")]
    #[validate(length(min = 1, message = "searchQuery must not be empty"))]
    pub search_query: String,
}

/// OpenAPI documentation for the recommendations API
#[derive(OpenApi)]
#[openapi(
    paths(get_recommendations, image_clicked, search_products),
    components(
        schemas(Product, ProductHit, RecommendationPage, ClickRequest, SearchRequest),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            InternalServerErrorResponse,
            ServiceUnavailableResponse
        )
    ),
    tags(
        (name = "Recommendations", description = "Personalized product recommendation endpoints")
    )
)]
pub struct ApiDoc;

/// Shared handler state: session bootstrap plus the ranking engine.
pub struct RecommendationState<S: VectorStore> {
    pub service: RecommendationService<S>,
    pub sessions: SessionManager<S>,
}

/// Create the recommendations router with all HTTP endpoints
pub fn router<S: VectorStore + 'static>(state: RecommendationState<S>) -> Router {
    let shared_state = Arc::new(state);

    Router::new()
        .route("/", get(get_recommendations))
        .route("/clicked", post(image_clicked))
        .route("/search", post(search_products))
        .with_state(shared_state)
}

fn session_key(headers: &HeaderMap) -> RecommendationResult<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| {
            RecommendationError::Validation(format!("missing {} header", SESSION_HEADER))
        })
}

/// Initial ranked set from a fresh probe vector
#[utoipa::path(
    get,
    path = "",
    tag = "Recommendations",
    params(
        ("x-session-id" = String, Header, description = "Caller session key")
    ),
    responses(
        (status = 200, description = "Ranked recommendations", body = RecommendationPage),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn get_recommendations<S: VectorStore>(
    State(state): State<Arc<RecommendationState<S>>>,
    headers: HeaderMap,
) -> RecommendationResult<Json<RecommendationPage>> {
    let user_id = state.sessions.resolve(session_key(&headers)?).await?;
    let page = state.service.initial_recommendations(user_id).await?;
    Ok(Json(page))
}

/// Toggle a like for a clicked image and re-rank
#[utoipa::path(
    post,
    path = "/clicked",
    tag = "Recommendations",
    params(
        ("x-session-id" = String, Header, description = "Caller session key")
    ),
    request_body = ClickRequest,
    responses(
        (status = 200, description = "Recommendations for the updated preference", body = RecommendationPage),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn image_clicked<S: VectorStore>(
    State(state): State<Arc<RecommendationState<S>>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<ClickRequest>,
) -> RecommendationResult<Json<RecommendationPage>> {
    let user_id = state.sessions.resolve(session_key(&headers)?).await?;
    let page = state
        .service
        .on_image_clicked(user_id, &input.image_path)
        .await?;
    Ok(Json(page))
}

/// Free-text catalog search
#[utoipa::path(
    post,
    path = "/search",
    tag = "Recommendations",
    params(
        ("x-session-id" = String, Header, description = "Caller session key")
    ),
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Ranked search results", body = RecommendationPage),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn search_products<S: VectorStore>(
    State(state): State<Arc<RecommendationState<S>>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<SearchRequest>,
) -> RecommendationResult<Json<RecommendationPage>> {
    let user_id = state.sessions.resolve(session_key(&headers)?).await?;
    let page = state
        .service
        .search_by_text(user_id, &input.search_query)
        .await?;
    Ok(Json(page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_key_present() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_static("abc"));
        assert_eq!(session_key(&headers).unwrap(), "abc");
    }

    #[test]
    fn test_session_key_missing_is_validation_error() {
        let headers = HeaderMap::new();
        assert!(matches!(
            session_key(&headers),
            Err(RecommendationError::Validation(_))
        ));
    }

    #[test]
    fn test_click_request_field_names() {
        let request: ClickRequest =
            serde_json::from_str(r#"{"imagePath": "images/shoe-1.jpg"}"#).unwrap();
        assert_eq!(request.image_path, "images/shoe-1.jpg");
    }

    #[test]
    fn test_search_request_validation() {
        let request = SearchRequest {
            search_query: String::new(),
        };
        assert!(request.validate().is_err());
    }
}
