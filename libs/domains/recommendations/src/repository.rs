use async_trait::async_trait;
use mongodb::bson::Document;

use crate::error::SearchError;
use crate::models::EmbeddingVector;

/// Similarity search over the stored meditation embeddings.
///
/// Matches come back as raw documents, best match first; turning them into
/// typed records is the mapper's job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorSearchRepository: Send + Sync {
    /// Return at most `limit` documents nearest to `vector`.
    ///
    /// Fails rather than returning an empty list when the store cannot be queried.
    async fn search_by_vector(
        &self,
        vector: &EmbeddingVector,
        limit: u32,
    ) -> Result<Vec<Document>, SearchError>;
}
