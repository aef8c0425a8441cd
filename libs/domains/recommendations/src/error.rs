use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

use crate::models::PipelineStage;

/// The embedding service could not produce a usable vector.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("embedding service did not answer within {after_secs}s")]
    Timeout { after_secs: u64 },

    #[error("embedding service responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed embedding response: {0}")]
    Malformed(String),
}

/// The vector search could not be completed.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("vector search failed: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("invalid vector search query: {0}")]
    InvalidQuery(String),
}

/// A matched document that could not be mapped cleanly.
///
/// Defects are reported and the field is defaulted; they never fail a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field `{field}`: {problem}")]
pub struct MappingDefect {
    pub field: &'static str,
    pub problem: String,
}

impl MappingDefect {
    pub fn new(field: &'static str, problem: impl Into<String>) -> Self {
        Self {
            field,
            problem: problem.into(),
        }
    }
}

/// Failure of the recommendation pipeline as a whole.
#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("embedding stage failed")]
    Embedding(#[from] EmbeddingError),

    #[error("search stage failed")]
    Search(#[from] SearchError),
}

impl RecommendationError {
    pub fn stage(&self) -> PipelineStage {
        match self {
            RecommendationError::Embedding(_) => PipelineStage::Embedding,
            RecommendationError::Search(_) => PipelineStage::Search,
        }
    }
}

/// Renders `err` and all of its sources as `outer: inner: ...`.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

/// Pipeline failures reach callers as a generic 500; the cause is logged where it occurs.
impl From<RecommendationError> for AppError {
    fn from(_: RecommendationError) -> Self {
        AppError::internal()
    }
}

impl IntoResponse for RecommendationError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_attribution() {
        let err = RecommendationError::from(EmbeddingError::Malformed("null".into()));
        assert_eq!(err.stage(), PipelineStage::Embedding);

        let err = RecommendationError::from(SearchError::InvalidQuery("empty vector".into()));
        assert_eq!(err.stage(), PipelineStage::Search);
    }

    #[test]
    fn test_error_chain_includes_inner_cause() {
        let err = RecommendationError::from(EmbeddingError::Status {
            status: 503,
            body: "model loading".into(),
        });
        let chain = error_chain(&err);
        assert!(chain.starts_with("embedding stage failed"));
        assert!(chain.contains("503"));
        assert!(chain.contains("model loading"));
    }

    #[test]
    fn test_pipeline_failure_is_generic_500() {
        let err = RecommendationError::from(EmbeddingError::Status {
            status: 502,
            body: "upstream secret detail".into(),
        });
        let response = err.into_response();
        assert_eq!(
            response.status(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
