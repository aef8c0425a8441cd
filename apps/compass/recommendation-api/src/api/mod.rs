//! API routes module

pub mod health;
pub mod recommendations;

use axum::Router;
use axum_helpers::{create_router, health_router};
use eyre::Result;

use crate::openapi::ApiDoc;
use crate::state::AppState;

/// All application routes. Merged at the root by `axum_helpers::create_router`.
pub fn routes(state: &AppState) -> Result<Router> {
    Ok(Router::new()
        .merge(recommendations::router(state)?)
        .merge(health::router(state.clone())))
}

/// The complete service: routes, docs, middleware and `/health`.
pub fn app(state: &AppState) -> Result<Router> {
    let router = create_router::<ApiDoc>(routes(state)?, &state.config.server)?;
    Ok(router.merge(health_router(state.config.app)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    /// State whose MongoDB is unreachable; the driver connects lazily.
    async fn offline_state() -> AppState {
        let config = temp_env::with_vars(
            [
                ("MONGODB_URL", Some("mongodb://127.0.0.1:1")),
                ("MONGODB_DATABASE", Some("Atma-Contents")),
                ("EMBEDDING_API_URL", Some("http://127.0.0.1:1")),
                ("CORS_ALLOWED_ORIGIN", None),
            ],
            || Config::from_env().unwrap(),
        );
        let mongo_client =
            mongodb::Client::with_uri_str("mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200")
                .await
                .unwrap();
        let db = mongo_client.database(config.mongodb.database());

        AppState {
            config,
            mongo_client,
            db,
        }
    }

    async fn call(router: Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health_is_up_without_mongodb() {
        let state = offline_state().await;

        let (status, body) = call(app(&state).unwrap(), "GET", "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["name"], "recommendation_api");
    }

    #[tokio::test]
    async fn test_ready_reports_unreachable_mongodb() {
        let state = offline_state().await;

        let (status, body) = call(app(&state).unwrap(), "GET", "/ready").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "not ready");
        assert_eq!(body["mongodb"], "disconnected");
    }

    #[tokio::test]
    async fn test_recommend_is_mounted_at_root() {
        let state = offline_state().await;
        let router = app(&state).unwrap();

        let (status, body) = call(router.clone(), "GET", "/recommend?limit=3").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "INVALID_QUERY");

        let (status, body) = call(router.clone(), "DELETE", "/recommend?keywords=calm").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], "METHOD_NOT_ALLOWED");

        let (status, _) = call(router, "GET", "/api/recommend?keywords=calm").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let state = offline_state().await;

        let (status, body) = call(app(&state).unwrap(), "GET", "/api-docs/openapi.json").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/recommend"].is_object());
        assert!(body["paths"]["/ready"].is_object());
    }
}
