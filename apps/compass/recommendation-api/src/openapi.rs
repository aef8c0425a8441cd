//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Service-level documentation: metadata and the probes owned by this binary.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Meditation Recommendation API",
        version = "0.1.0",
        description = "Recommends meditations for free-text keywords using embedding similarity search"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        axum_helpers::server::health::health_handler,
        crate::api::health::readiness_check,
    ),
    components(schemas(axum_helpers::HealthResponse)),
    tags(
        (name = "health", description = "Liveness and readiness probes")
    )
)]
struct ServiceDoc;

/// Combined OpenAPI documentation for all APIs.
///
/// Domain routes are mounted at the root, so their documents are merged
/// rather than nested under a prefix.
pub struct ApiDoc;

impl OpenApi for ApiDoc {
    fn openapi() -> utoipa::openapi::OpenApi {
        ServiceDoc::openapi().merge_from(domain_recommendations::RecommendationsApiDoc::openapi())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_all_routes() {
        let doc = ApiDoc::openapi();
        for path in ["/recommend", "/health", "/ready"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        assert_eq!(doc.info.title, "Meditation Recommendation API");
    }
}
