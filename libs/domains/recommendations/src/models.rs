use serde::{Deserialize, Deserializer, Serialize, de};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use strum::Display;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

/// Number of recommendations returned when the caller does not ask for a count.
pub const DEFAULT_LIMIT: i64 = 5;

/// Smallest limit ever forwarded to the vector search.
pub const MIN_LIMIT: u32 = 1;

/// Largest limit ever forwarded to the vector search (Atlas caps
/// `numCandidates`, which may not be smaller than the limit, at 10000).
pub const MAX_LIMIT: u32 = 10_000;

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// `limit=` with no value means the default; anything else must be an integer.
fn limit_or_default<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct LimitVisitor;

    impl<'de> de::Visitor<'de> for LimitVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an integer limit")
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<i64, E> {
            Ok(value)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<i64, E> {
            i64::try_from(value).map_err(|_| E::invalid_value(de::Unexpected::Unsigned(value), &self))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<i64, E> {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Ok(DEFAULT_LIMIT);
            }
            trimmed
                .parse()
                .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
        }
    }

    deserializer.deserialize_any(LimitVisitor)
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank")
            .with_message(Cow::Borrowed("keywords must not be blank")));
    }
    Ok(())
}

/// Query parameters of `GET /recommend`.
///
/// `limit` is deliberately signed: zero and negative values are accepted here
/// and normalized by the service.
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecommendationRequest {
    /// Free text describing the kind of meditation wanted
    #[validate(custom(function = "not_blank"))]
    #[param(example = "calm breathing")]
    pub keywords: String,

    /// Maximum number of recommendations (values below 1 are treated as 1,
    /// values above 10000 as 10000)
    #[serde(default = "default_limit", deserialize_with = "limit_or_default")]
    #[param(default = 5, example = 3)]
    pub limit: i64,
}

/// Embedding produced by the remote embedding service.
///
/// Dimensionality is whatever the service returns; it is not checked here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingVector(Vec<f64>);

impl EmbeddingVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl From<Vec<f64>> for EmbeddingVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// A meditation as stored in the `meditations` collection.
///
/// Owned by the content store; this service only reads matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeditationRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub meditation_type: String,
    pub keywords: BTreeSet<String>,
    pub embedding: EmbeddingVector,
    /// Similarity score reported by the vector index, when projected
    pub score: Option<f64>,
}

/// A single recommendation as returned to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RecommendationResult {
    #[schema(example = "665f1c2ab4d1a0c3e8f2a901")]
    pub id: String,
    #[schema(example = "Box Breathing")]
    pub name: String,
    #[serde(rename = "type")]
    #[schema(example = "breathing")]
    pub meditation_type: String,
}

impl From<MeditationRecord> for RecommendationResult {
    fn from(record: MeditationRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            meditation_type: record.meditation_type,
        }
    }
}

/// Stage of the recommendation pipeline, used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum PipelineStage {
    Embedding,
    Search,
}
