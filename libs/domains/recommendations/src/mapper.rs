//! Converts raw vector-search matches into typed records.
//!
//! Mapping never fails: absent fields become empty values and fields of an
//! unexpected type are defaulted and reported as [`MappingDefect`]s.

use mongodb::bson::{Bson, Document};
use std::collections::BTreeSet;
use tracing::warn;

use crate::error::MappingDefect;
use crate::models::{EmbeddingVector, MeditationRecord, RecommendationResult};

/// A mapped record together with everything that had to be patched up.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRecord {
    pub record: MeditationRecord,
    pub defects: Vec<MappingDefect>,
}

pub fn to_record(doc: &Document) -> MappedRecord {
    let mut defects = Vec::new();

    let record = MeditationRecord {
        id: id_field(doc, &mut defects),
        name: string_field(doc, "name", &mut defects),
        meditation_type: string_field(doc, "type", &mut defects),
        keywords: keywords_field(doc, &mut defects),
        embedding: embedding_field(doc, &mut defects),
        score: score_field(doc, &mut defects),
    };

    MappedRecord { record, defects }
}

/// Map a single match straight to its API projection, logging any defects.
pub fn to_result(doc: &Document) -> RecommendationResult {
    let MappedRecord { record, defects } = to_record(doc);
    report(&record.id, &defects);
    RecommendationResult::from(record)
}

/// Map every match, preserving order.
pub fn map_all(docs: &[Document]) -> Vec<RecommendationResult> {
    docs.iter().map(to_result).collect()
}

fn report(id: &str, defects: &[MappingDefect]) {
    for defect in defects {
        warn!(record_id = %id, field = defect.field, problem = %defect.problem, "Mapping defect");
    }
}

fn type_name(value: &Bson) -> String {
    format!("{:?}", value.element_type())
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Double(v) => Some(*v),
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        _ => None,
    }
}

fn id_field(doc: &Document, defects: &mut Vec<MappingDefect>) -> String {
    match doc.get("_id") {
        None | Some(Bson::Null) => String::new(),
        Some(Bson::String(s)) => s.clone(),
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        Some(Bson::Int32(v)) => v.to_string(),
        Some(Bson::Int64(v)) => v.to_string(),
        Some(other) => {
            defects.push(MappingDefect::new(
                "_id",
                format!("unsupported type {}", type_name(other)),
            ));
            String::new()
        }
    }
}

fn string_field(doc: &Document, field: &'static str, defects: &mut Vec<MappingDefect>) -> String {
    match doc.get(field) {
        None | Some(Bson::Null) => String::new(),
        Some(Bson::String(s)) => s.clone(),
        Some(other) => {
            defects.push(MappingDefect::new(
                field,
                format!("expected string, found {}", type_name(other)),
            ));
            String::new()
        }
    }
}

fn keywords_field(doc: &Document, defects: &mut Vec<MappingDefect>) -> BTreeSet<String> {
    match doc.get("keywords") {
        None | Some(Bson::Null) => BTreeSet::new(),
        Some(Bson::Array(items)) => {
            let mut keywords = BTreeSet::new();
            for (i, item) in items.iter().enumerate() {
                match item {
                    Bson::String(s) => {
                        keywords.insert(s.clone());
                    }
                    other => defects.push(MappingDefect::new(
                        "keywords",
                        format!("element {} is {}, not a string", i, type_name(other)),
                    )),
                }
            }
            keywords
        }
        Some(other) => {
            defects.push(MappingDefect::new(
                "keywords",
                format!("expected array, found {}", type_name(other)),
            ));
            BTreeSet::new()
        }
    }
}

fn embedding_field(doc: &Document, defects: &mut Vec<MappingDefect>) -> EmbeddingVector {
    match doc.get("embedding") {
        None | Some(Bson::Null) => EmbeddingVector::default(),
        Some(Bson::Array(items)) => {
            let mut values = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                match as_f64(item) {
                    Some(v) => values.push(v),
                    None => defects.push(MappingDefect::new(
                        "embedding",
                        format!("element {} is {}, not a number", i, type_name(item)),
                    )),
                }
            }
            EmbeddingVector::new(values)
        }
        Some(other) => {
            defects.push(MappingDefect::new(
                "embedding",
                format!("expected array, found {}", type_name(other)),
            ));
            EmbeddingVector::default()
        }
    }
}

fn score_field(doc: &Document, defects: &mut Vec<MappingDefect>) -> Option<f64> {
    match doc.get("score") {
        None | Some(Bson::Null) => None,
        Some(value) => {
            let score = as_f64(value);
            if score.is_none() {
                defects.push(MappingDefect::new(
                    "score",
                    format!("expected number, found {}", type_name(value)),
                ));
            }
            score
        }
    }
}
