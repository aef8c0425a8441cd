//! Wires the recommendations domain to its HTTP routes.

use axum::Router;
use domain_recommendations::{
    HttpEmbeddingProvider, MongoVectorSearchRepository, RecommendationService, handlers,
};
use eyre::{Result, WrapErr};
use std::sync::Arc;
use tracing::info;

use crate::state::AppState;

pub fn router(state: &AppState) -> Result<Router> {
    let embedding = HttpEmbeddingProvider::new(&state.config.embedding)
        .wrap_err("Failed to build embedding HTTP client")?;
    info!(endpoint = embedding.endpoint(), "Embedding service configured");

    let repository =
        MongoVectorSearchRepository::new(&state.db, state.config.vector_search.clone());
    info!(
        collection = %state.config.vector_search.collection,
        index = %state.config.vector_search.index,
        "Vector search configured"
    );

    let service = RecommendationService::new(Arc::new(embedding), repository);

    Ok(handlers::router(service))
}
