//! MongoDB Atlas implementation of VectorSearchRepository

use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_or_default, env_parse_or_default};
use futures::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{Bson, Document, doc},
};
use tracing::{debug, info, instrument};

use crate::error::SearchError;
use crate::models::{EmbeddingVector, MAX_LIMIT};
use crate::repository::VectorSearchRepository;

const DEFAULT_COLLECTION: &str = "meditations";
const DEFAULT_INDEX: &str = "meditations_vector_search";
const DEFAULT_PATH: &str = "embedding";
const DEFAULT_OVERFETCH_FACTOR: u32 = 20;
const DEFAULT_MAX_CANDIDATES: u32 = 100;

/// Where and how to run `$vectorSearch`.
#[derive(Debug, Clone)]
pub struct VectorSearchConfig {
    pub collection: String,
    /// Atlas Search index name
    pub index: String,
    /// Document field holding the stored embedding
    pub path: String,
    /// Candidates considered per requested result
    pub overfetch_factor: u32,
    /// Ceiling on the candidate pool (raised to `limit` if smaller)
    pub max_candidates: u32,
}

impl Default for VectorSearchConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            index: DEFAULT_INDEX.to_string(),
            path: DEFAULT_PATH.to_string(),
            overfetch_factor: DEFAULT_OVERFETCH_FACTOR,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}

/// Environment variables:
/// - `VECTOR_SEARCH_COLLECTION` (default: `meditations`)
/// - `VECTOR_SEARCH_INDEX` (default: `meditations_vector_search`)
/// - `VECTOR_SEARCH_PATH` (default: `embedding`)
/// - `VECTOR_SEARCH_OVERFETCH_FACTOR` (default: 20)
/// - `VECTOR_SEARCH_MAX_CANDIDATES` (default: 100)
impl FromEnv for VectorSearchConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            collection: env_or_default("VECTOR_SEARCH_COLLECTION", DEFAULT_COLLECTION),
            index: env_or_default("VECTOR_SEARCH_INDEX", DEFAULT_INDEX),
            path: env_or_default("VECTOR_SEARCH_PATH", DEFAULT_PATH),
            overfetch_factor: env_parse_or_default(
                "VECTOR_SEARCH_OVERFETCH_FACTOR",
                DEFAULT_OVERFETCH_FACTOR,
            )?,
            max_candidates: env_parse_or_default(
                "VECTOR_SEARCH_MAX_CANDIDATES",
                DEFAULT_MAX_CANDIDATES,
            )?,
        })
    }
}

/// Largest `numCandidates` Atlas accepts.
pub const MAX_NUM_CANDIDATES: u32 = 10_000;

/// Candidate pool for `$vectorSearch`: `limit * factor`, capped at
/// `max_candidates` but never smaller than `limit`, and never above
/// [`MAX_NUM_CANDIDATES`].
pub fn num_candidates(limit: u32, overfetch_factor: u32, max_candidates: u32) -> u32 {
    let limit = limit.min(MAX_NUM_CANDIDATES);
    let ceiling = max_candidates.clamp(limit, MAX_NUM_CANDIDATES);
    limit.saturating_mul(overfetch_factor).clamp(limit, ceiling)
}

/// Aggregation pipeline for a nearest-neighbour query.
///
/// The stored embedding is not projected back.
pub fn build_pipeline(
    config: &VectorSearchConfig,
    vector: &EmbeddingVector,
    limit: u32,
) -> Vec<Document> {
    let query_vector: Vec<Bson> = vector.as_slice().iter().copied().map(Bson::Double).collect();
    let candidates = num_candidates(limit, config.overfetch_factor, config.max_candidates);

    vec![
        doc! {
            "$vectorSearch": {
                "index": config.index.as_str(),
                "path": config.path.as_str(),
                "queryVector": query_vector,
                "numCandidates": i64::from(candidates),
                "limit": i64::from(limit),
            }
        },
        doc! {
            "$project": {
                "_id": 1,
                "name": 1,
                "type": 1,
                "keywords": 1,
                "score": { "$meta": "vectorSearchScore" },
            }
        },
    ]
}

fn validate_query(vector: &EmbeddingVector, limit: u32) -> Result<(), SearchError> {
    if vector.is_empty() {
        return Err(SearchError::InvalidQuery("query vector is empty".to_string()));
    }
    if limit < 1 {
        return Err(SearchError::InvalidQuery(
            "limit must be at least 1".to_string(),
        ));
    }
    if limit > MAX_LIMIT {
        return Err(SearchError::InvalidQuery(format!(
            "limit {limit} exceeds the maximum of {MAX_LIMIT}"
        )));
    }
    Ok(())
}

/// `$vectorSearch` over a MongoDB Atlas collection
pub struct MongoVectorSearchRepository {
    collection: Collection<Document>,
    config: VectorSearchConfig,
}

impl MongoVectorSearchRepository {
    /// # Example
    /// ```ignore
    /// let client = database::mongodb::connect_from_config(&mongo_config).await?;
    /// let repo = MongoVectorSearchRepository::new(
    ///     &client.database("Atma-Contents"),
    ///     VectorSearchConfig::default(),
    /// );
    /// ```
    pub fn new(db: &Database, config: VectorSearchConfig) -> Self {
        let collection = db.collection::<Document>(&config.collection);
        Self { collection, config }
    }

    pub fn config(&self) -> &VectorSearchConfig {
        &self.config
    }
}

#[async_trait]
impl VectorSearchRepository for MongoVectorSearchRepository {
    #[instrument(
        skip(self, vector),
        fields(
            collection = %self.config.collection,
            index = %self.config.index,
            dimensions = vector.len()
        )
    )]
    async fn search_by_vector(
        &self,
        vector: &EmbeddingVector,
        limit: u32,
    ) -> Result<Vec<Document>, SearchError> {
        validate_query(vector, limit)?;

        let pipeline = build_pipeline(&self.config, vector, limit);
        debug!("Running vector search");

        let cursor = self.collection.aggregate(pipeline).await?;
        let matches: Vec<Document> = cursor.try_collect().await?;

        info!(matches = matches.len(), "Vector search completed");
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_candidates_overfetches_twenty_times() {
        assert_eq!(num_candidates(1, 20, 100), 20);
        assert_eq!(num_candidates(3, 20, 100), 60);
    }

    #[test]
    fn test_num_candidates_capped_at_ceiling() {
        assert_eq!(num_candidates(5, 20, 100), 100);
        assert_eq!(num_candidates(10, 20, 100), 100);
    }

    #[test]
    fn test_num_candidates_never_below_limit() {
        assert_eq!(num_candidates(150, 20, 100), 150);
        assert_eq!(num_candidates(4, 0, 100), 4);
    }

    #[test]
    fn test_num_candidates_never_above_store_maximum() {
        assert_eq!(num_candidates(10_000, 20, 100), 10_000);
        assert_eq!(num_candidates(600, 20, 50_000), 10_000);
        assert_eq!(num_candidates(u32::MAX, 20, 100), 10_000);
    }

    #[test]
    fn test_pipeline_shape() {
        let config = VectorSearchConfig::default();
        let vector = EmbeddingVector::new(vec![0.5, -0.25, 1.0]);

        let pipeline = build_pipeline(&config, &vector, 3);
        assert_eq!(pipeline.len(), 2);

        let search = pipeline[0].get_document("$vectorSearch").unwrap();
        assert_eq!(search.get_str("index").unwrap(), "meditations_vector_search");
        assert_eq!(search.get_str("path").unwrap(), "embedding");
        assert_eq!(search.get_i64("numCandidates").unwrap(), 60);
        assert_eq!(search.get_i64("limit").unwrap(), 3);

        let query: Vec<f64> = search
            .get_array("queryVector")
            .unwrap()
            .iter()
            .filter_map(Bson::as_f64)
            .collect();
        assert_eq!(query, vec![0.5, -0.25, 1.0]);

        let project = pipeline[1].get_document("$project").unwrap();
        assert!(project.contains_key("keywords"));
        assert!(!project.contains_key("embedding"));
        assert_eq!(
            project.get_document("score").unwrap(),
            &doc! { "$meta": "vectorSearchScore" }
        );
    }

    #[test]
    fn test_validate_query_rejects_empty_vector_and_zero_limit() {
        let vector = EmbeddingVector::new(vec![0.1]);
        assert!(validate_query(&vector, 1).is_ok());
        assert!(matches!(
            validate_query(&EmbeddingVector::default(), 1),
            Err(SearchError::InvalidQuery(_))
        ));
        assert!(matches!(
            validate_query(&vector, 0),
            Err(SearchError::InvalidQuery(_))
        ));
        assert!(validate_query(&vector, MAX_LIMIT).is_ok());
        assert!(matches!(
            validate_query(&vector, MAX_LIMIT + 1),
            Err(SearchError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_config_from_env_defaults_and_overrides() {
        temp_env::with_vars(
            [
                ("VECTOR_SEARCH_COLLECTION", None::<&str>),
                ("VECTOR_SEARCH_INDEX", Some("alt_index")),
                ("VECTOR_SEARCH_PATH", None),
                ("VECTOR_SEARCH_OVERFETCH_FACTOR", Some("10")),
                ("VECTOR_SEARCH_MAX_CANDIDATES", None),
            ],
            || {
                let config = VectorSearchConfig::from_env().unwrap();
                assert_eq!(config.collection, "meditations");
                assert_eq!(config.index, "alt_index");
                assert_eq!(config.path, "embedding");
                assert_eq!(config.overfetch_factor, 10);
                assert_eq!(config.max_candidates, 100);
            },
        );
    }

    #[test]
    fn test_config_from_env_rejects_garbage_number() {
        temp_env::with_var("VECTOR_SEARCH_MAX_CANDIDATES", Some("plenty"), || {
            let err = VectorSearchConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("VECTOR_SEARCH_MAX_CANDIDATES"));
        });
    }

    #[tokio::test]
    async fn test_invalid_query_never_reaches_the_store() {
        // Client construction is lazy, so nothing is listening here.
        let client = mongodb::Client::with_uri_str("mongodb://127.0.0.1:1")
            .await
            .unwrap();
        let repo = MongoVectorSearchRepository::new(
            &client.database("Atma-Contents"),
            VectorSearchConfig::default(),
        );

        let err = repo
            .search_by_vector(&EmbeddingVector::default(), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery(_)));
    }

    #[tokio::test]
    #[ignore = "requires a MongoDB Atlas cluster with the vector index (MONGODB_URL, MONGODB_DATABASE)"]
    async fn test_search_against_atlas() {
        let url = std::env::var("MONGODB_URL").unwrap();
        let database = std::env::var("MONGODB_DATABASE").unwrap();
        let client = mongodb::Client::with_uri_str(&url).await.unwrap();
        let repo = MongoVectorSearchRepository::new(
            &client.database(&database),
            VectorSearchConfig::default(),
        );

        let dims: usize = std::env::var("EMBEDDING_DIMENSIONS")
            .ok()
            .and_then(|d| d.parse().ok())
            .unwrap_or(384);
        let matches = repo
            .search_by_vector(&EmbeddingVector::new(vec![0.01; dims]), 3)
            .await
            .unwrap();
        assert!(matches.len() <= 3);
    }
}
