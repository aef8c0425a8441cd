//! Recommendations Domain Library
//!
//! Keyword-driven meditation recommendations: free text is embedded by a
//! remote service and matched against stored meditation embeddings with
//! MongoDB Atlas vector search.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────┐
//! │ handlers GET /recommend │  ← 200 / 204 / generic 500
//! └────────────┬────────────┘
//!              │
//! ┌────────────▼────────────┐
//! │  RecommendationService  │  ← embed, search, map; fail fast
//! └─────┬─────────────┬─────┘
//!       │             │
//! ┌─────▼───────────┐ ┌▼──────────────────────────┐
//! │EmbeddingProvider│ │   VectorSearchRepository  │
//! │     (trait)     │ │          (trait)          │
//! └─────┬───────────┘ └┬──────────────────────────┘
//!       │             │
//! ┌─────▼───────────┐ ┌▼──────────────────────────┐
//! │  HttpEmbedding  │ │MongoVectorSearchRepository│
//! │     Provider    │ │      ($vectorSearch)      │
//! └─────────────────┘ └┬──────────────────────────┘
//!                     │ raw documents
//!                ┌────▼───┐
//!                │ mapper │  ← tolerant, order-preserving
//!                └────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use core_config::FromEnv;
//! use domain_recommendations::{
//!     EmbeddingConfig, HttpEmbeddingProvider, MongoVectorSearchRepository,
//!     RecommendationService, VectorSearchConfig, handlers,
//! };
//! use std::sync::Arc;
//!
//! let embedding = HttpEmbeddingProvider::new(&EmbeddingConfig::from_env()?)?;
//! let repository = MongoVectorSearchRepository::new(&db, VectorSearchConfig::from_env()?);
//!
//! let service = RecommendationService::new(Arc::new(embedding), repository);
//! let routes = handlers::router(service);
//! ```

pub mod embedding;
pub mod error;
pub mod handlers;
pub mod mapper;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use embedding::{EmbeddingConfig, EmbeddingProvider, HttpEmbeddingProvider};
pub use error::{EmbeddingError, MappingDefect, RecommendationError, SearchError};
pub use handlers::ApiDoc as RecommendationsApiDoc;
pub use mapper::MappedRecord;
pub use models::{
    DEFAULT_LIMIT, EmbeddingVector, MAX_LIMIT, MeditationRecord, PipelineStage, RecommendationRequest,
    RecommendationResult,
};
pub use repository::VectorSearchRepository;
pub use self::mongodb::{MongoVectorSearchRepository, VectorSearchConfig};
pub use service::RecommendationService;
