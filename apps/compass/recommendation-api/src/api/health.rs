//! Readiness endpoint

use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_helpers::{HealthCheckFuture, run_health_checks};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(readiness_check))
        .with_state(state)
}

/// Readiness probe: pings MongoDB
#[utoipa::path(
    get,
    path = "/ready",
    tag = "health",
    responses(
        (status = 200, description = "MongoDB reachable: {\"status\":\"ready\",\"mongodb\":\"connected\"}"),
        (status = 503, description = "MongoDB unreachable: {\"status\":\"not ready\",\"mongodb\":\"disconnected\"}")
    )
)]
pub async fn readiness_check(State(state): State<AppState>) -> Response {
    let db_name = state.config.mongodb.database().to_string();
    let mongodb: HealthCheckFuture<'_> = Box::pin(async move {
        if database::mongodb::check_health(&state.mongo_client, &db_name).await {
            Ok(())
        } else {
            Err("ping failed".to_string())
        }
    });

    match run_health_checks(vec![("mongodb", mongodb)]).await {
        Ok((status, body)) | Err((status, body)) => (status, body).into_response(),
    }
}
