//! Recommendation Service - the embed, search, map pipeline

use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::embedding::EmbeddingProvider;
use crate::error::{RecommendationError, error_chain};
use crate::mapper;
use crate::models::{MAX_LIMIT, MIN_LIMIT, RecommendationResult};
use crate::repository::VectorSearchRepository;

/// Clamp a caller-supplied limit into `MIN_LIMIT..=MAX_LIMIT`.
pub fn normalize_limit(limit: i64) -> u32 {
    let clamped = limit.clamp(i64::from(MIN_LIMIT), i64::from(MAX_LIMIT));
    u32::try_from(clamped).unwrap_or(MAX_LIMIT)
}

/// Sequences the embedding provider, the vector search and the mapper.
///
/// Each call is independent. A failing stage ends the call immediately:
/// nothing is retried and no partial result is returned.
pub struct RecommendationService<R: VectorSearchRepository> {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    repository: Arc<R>,
}

impl<R: VectorSearchRepository> RecommendationService<R> {
    pub fn new(embedding_provider: Arc<dyn EmbeddingProvider>, repository: R) -> Self {
        Self {
            embedding_provider,
            repository: Arc::new(repository),
        }
    }

    /// Recommend up to `limit` meditations for `keywords`, best match first.
    ///
    /// An empty vec means the search ran and found nothing.
    #[instrument(skip(self))]
    pub async fn recommend(
        &self,
        keywords: &str,
        limit: i64,
    ) -> Result<Vec<RecommendationResult>, RecommendationError> {
        let limit = normalize_limit(limit);

        let embedding = self
            .embedding_provider
            .embed(keywords)
            .await
            .map_err(|e| log_failure(e.into()))?;

        let matches = self
            .repository
            .search_by_vector(&embedding, limit)
            .await
            .map_err(|e| log_failure(e.into()))?;

        let mut results = mapper::map_all(&matches);
        results.truncate(limit as usize);

        info!(count = results.len(), "Recommendations ready");
        Ok(results)
    }
}

fn log_failure(err: RecommendationError) -> RecommendationError {
    error!(
        stage = %err.stage(),
        error = %error_chain(&err),
        "Recommendation pipeline failed"
    );
    err
}
