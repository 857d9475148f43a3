use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// Metadata mapping carried by every entity document: field name to value.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A single metadata field value.
///
/// Source documents are heterogeneous: a field may hold a bare scalar, a
/// `{value: ...}` wrapper (optionally carrying provenance), a list of either,
/// or (inside the unharmonized subtree) arbitrary nested maps. Modelling the
/// shapes as an exhaustive variant keeps the normalizer and both filter
/// compilers total over any document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    // Order matters for untagged deserialization:
    // - arrays must be tried before the object/scalar shapes
    // - Wrapped only matches objects that carry a `value` key; anything else
    //   falls through to Map
    // - Scalar is last so it cannot swallow containers
    Sequence(Vec<MetadataValue>),
    Wrapped(WrappedValue),
    Map(BTreeMap<String, MetadataValue>),
    Scalar(Scalar),
}

/// A `{value: ...}` wrapper object. Extra keys (provenance such as `source`
/// or `ancestry`) are preserved on round-trip and ignored by filtering and
/// aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrappedValue {
    pub value: Box<MetadataValue>,
    #[serde(flatten)]
    pub provenance: BTreeMap<String, Value>,
}

/// Leaf values: JSON scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl MetadataValue {
    /// Re-hydrate the original JSON representation of this value.
    pub fn to_json(&self) -> Value {
        match self {
            MetadataValue::Sequence(items) => {
                Value::Array(items.iter().map(MetadataValue::to_json).collect())
            }
            MetadataValue::Wrapped(wrapped) => {
                let mut map = serde_json::Map::new();
                map.insert("value".to_string(), wrapped.value.to_json());
                for (k, v) in &wrapped.provenance {
                    map.insert(k.clone(), v.clone());
                }
                Value::Object(map)
            }
            MetadataValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            MetadataValue::Scalar(scalar) => scalar.to_json(),
        }
    }

    /// Resolve one `{value: ...}` wrapper, if present. Bare values resolve
    /// to themselves. This is the unwrap step shared by both filter
    /// compilers: a wrapped field is compared through its payload, anything
    /// else is compared directly.
    pub fn unwrapped(&self) -> &MetadataValue {
        match self {
            MetadataValue::Wrapped(wrapped) => &wrapped.value,
            other => other,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, MetadataValue::Scalar(Scalar::Null))
    }
}

impl Scalar {
    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Number(n) => Value::Number(n.clone()),
            Scalar::String(s) => Value::String(s.clone()),
        }
    }
}
