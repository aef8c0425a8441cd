use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_helpers::{
    ValidatedQuery,
    errors::handlers::method_not_allowed,
    errors::responses::{
        BadRequestQueryResponse, BadRequestValidationResponse, InternalServerErrorResponse,
    },
};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::OpenApi;

use crate::error::RecommendationError;
use crate::models::{RecommendationRequest, RecommendationResult};
use crate::repository::VectorSearchRepository;
use crate::service::RecommendationService;

/// OpenAPI documentation for the Recommendations API
#[derive(OpenApi)]
#[openapi(
    paths(recommend),
    components(
        schemas(RecommendationResult),
        responses(
            BadRequestValidationResponse,
            BadRequestQueryResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Recommendations", description = "Keyword-based meditation recommendations")
    )
)]
pub struct ApiDoc;

/// Router exposing `GET /recommend`; other methods get a JSON 405.
pub fn router<R: VectorSearchRepository + 'static>(service: RecommendationService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/recommend", get(recommend::<R>).fallback(method_not_allowed))
        .with_state(shared_service)
}

/// Recommend meditations matching free-text keywords
///
/// Results are ordered by similarity, best first.
#[utoipa::path(
    get,
    path = "/recommend",
    tag = "Recommendations",
    params(RecommendationRequest),
    responses(
        (status = 200, description = "Matching meditations, best match first", body = Vec<RecommendationResult>),
        (status = 204, description = "No meditation matched the keywords"),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn recommend<R: VectorSearchRepository>(
    State(service): State<Arc<RecommendationService<R>>>,
    ValidatedQuery(request): ValidatedQuery<RecommendationRequest>,
) -> Result<Response, RecommendationError> {
    info!(
        keywords = %request.keywords,
        limit = request.limit,
        "Recommendation request received"
    );

    let results = service.recommend(&request.keywords, request.limit).await?;

    if results.is_empty() {
        warn!(keywords = %request.keywords, "No recommendations found");
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    info!(
        count = results.len(),
        keywords = %request.keywords,
        "Returning recommendations"
    );
    Ok((StatusCode::OK, Json(results)).into_response())
}
