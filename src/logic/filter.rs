use serde_json::Value;
use std::collections::BTreeMap;

use crate::model::{EntityRecord, Metadata, MetadataValue, Scalar};

/// Query keys that never participate in filtering: pagination plus the
/// reserved no-op `search` key.
pub const RESERVED_KEYS: [&str; 3] = ["page", "per_page", "search"];

const UNHARMONIZED_PREFIX: &str = "metadata.unharmonized.";

/// Parsed filter constraints, shared by both compilers.
///
/// The in-memory evaluator ([`FilterSpec::matches`]) and the Cypher compiler
/// ([`crate::logic::cypher::compile_where`]) consume this one representation,
/// so the two backends always agree on which constraints exist; each only
/// decides how to apply them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    /// Harmonized constraints, keyed by metadata field name.
    pub harmonized: BTreeMap<String, String>,
    /// Unharmonized constraints: path segments under
    /// `metadata.unharmonized.` plus the expected value.
    pub unharmonized: Vec<(Vec<String>, String)>,
}

impl FilterSpec {
    /// Classify query pairs into filter constraints. Reserved keys and
    /// empty values are dropped; `metadata.unharmonized.<path>` keys become
    /// path walks, everything else is a harmonized field constraint.
    pub fn from_query(pairs: &[(String, String)]) -> Self {
        let mut spec = FilterSpec::default();
        for (key, value) in pairs {
            if RESERVED_KEYS.contains(&key.as_str()) || value.is_empty() {
                continue;
            }
            if let Some(path) = key.strip_prefix(UNHARMONIZED_PREFIX) {
                if !path.is_empty() {
                    let segments = path.split('.').map(str::to_string).collect();
                    spec.unharmonized.push((segments, value.clone()));
                }
            } else {
                spec.harmonized.insert(key.clone(), value.clone());
            }
        }
        spec
    }

    pub fn is_empty(&self) -> bool {
        self.harmonized.is_empty() && self.unharmonized.is_empty()
    }

    /// Evaluate every constraint against an entity's metadata (AND).
    ///
    /// Total over arbitrary document shapes: a missing field, a broken path
    /// or a type mismatch makes the entity non-matching, never an error.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.harmonized
            .iter()
            .all(|(field, expected)| harmonized_matches(metadata.get(field), expected))
            && self.unharmonized.iter().all(|(path, expected)| {
                unharmonized_matches(metadata.get("unharmonized"), path, expected)
            })
    }
}

/// Drop the entities that do not satisfy the filter spec.
pub fn apply_filters<T: EntityRecord>(items: Vec<T>, spec: &FilterSpec) -> Vec<T> {
    if spec.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| spec.matches(item.metadata()))
        .collect()
}

/// The unwrap-then-compare rule for harmonized fields: resolve one
/// `{value: ...}` wrapper, then membership for sequences and exact equality
/// for everything else. Absent fields (and null payloads) fail closed.
fn harmonized_matches(node: Option<&MetadataValue>, expected: &str) -> bool {
    let node = match node {
        Some(node) => node,
        None => return false,
    };
    match node.unwrapped() {
        MetadataValue::Scalar(Scalar::Null) => false,
        MetadataValue::Sequence(items) => items.iter().any(|item| element_equals(item, expected)),
        other => element_equals(other, expected),
    }
}

/// Membership and equality are shallow: the filter value is a string and
/// only compares equal to a stored string. Wrapped objects or nested
/// containers inside a list never match.
fn element_equals(element: &MetadataValue, expected: &str) -> bool {
    matches!(element, MetadataValue::Scalar(Scalar::String(s)) if s == expected)
}

/// Walk `metadata.unharmonized.<path>` through nested maps. Any absent
/// segment (or a null terminal) fails closed; the terminal value follows the
/// same membership-or-equality rule, without unwrapping.
fn unharmonized_matches(subtree: Option<&MetadataValue>, path: &[String], expected: &str) -> bool {
    let subtree = match subtree {
        Some(subtree) => subtree.to_json(),
        None => return false,
    };

    let mut current = &subtree;
    for segment in path {
        current = match current {
            Value::Object(map) => match map.get(segment) {
                Some(next) => next,
                None => return false,
            },
            _ => return false,
        };
    }

    match current {
        Value::Null => false,
        Value::Array(items) => items.iter().any(|item| item == &Value::String(expected.into())),
        Value::String(s) => s == expected,
        _ => false,
    }
}
