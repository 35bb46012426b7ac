//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for Recommendations API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Recommendations API",
        version = "0.1.0",
        description = "Personalized product recommendations over a vector catalog",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    nest(
        (path = "/api/recommendations", api = domain_recommendations::ApiDoc)
    ),
    tags(
        (name = "Recommendations", description = "Personalized product recommendation endpoints")
    )
)]
pub struct ApiDoc;
