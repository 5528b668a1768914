//! Property-based ordering of query results.
//!
//! Property values are compared as typed variants: numbers by value, strings
//! lexicographically, numbers before strings. A missing or `null` property (and
//! any value that is neither number, string nor boolean) sorts after everything
//! else, and ties keep their original relative order.

use crate::ingestion::types::Feature;

use serde_json::{Map, Value};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Absent,
    Number(f64),
    Text(String),
}

impl SortValue {
    pub fn of(properties: &Map<String, Value>, key: &str) -> Self {
        match properties.get(key) {
            Some(Value::Number(n)) => n.as_f64().map_or(SortValue::Absent, SortValue::Number),
            Some(Value::String(s)) => SortValue::Text(s.clone()),
            Some(Value::Bool(b)) => SortValue::Number(if *b { 1.0 } else { 0.0 }),
            _ => SortValue::Absent,
        }
    }
}

pub fn compare(a: &SortValue, b: &SortValue) -> Ordering {
    match (a, b) {
        (SortValue::Absent, SortValue::Absent) => Ordering::Equal,
        (SortValue::Absent, _) => Ordering::Greater,
        (_, SortValue::Absent) => Ordering::Less,
        (SortValue::Number(x), SortValue::Number(y)) => x.total_cmp(y),
        (SortValue::Text(x), SortValue::Text(y)) => x.cmp(y),
        (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
        (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
    }
}

/// Stable ascending sort of `features` by property `key`.
pub fn sort_by_property(features: &mut Vec<Feature>, key: &str) {
    let mut keyed: Vec<(SortValue, Feature)> = features
        .drain(..)
        .map(|feature| (SortValue::of(&feature.properties, key), feature))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| compare(a, b));
    features.extend(keyed.into_iter().map(|(_, feature)| feature));
}
