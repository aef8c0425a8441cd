use async_trait::async_trait;

use crate::error::EmbeddingError;
use crate::models::EmbeddingVector;

/// Turns free text into an embedding vector.
///
/// Implementations make exactly one attempt per call; there is no retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbeddingError>;
}
