use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::model::{Metadata, MetadataValue, Scalar};

/// Flatten a metadata value into its scalar emissions.
///
/// A wrapper resolves to whatever its payload emits. A sequence emits the
/// concatenation of its elements' emissions. Nulls emit nothing. Unlike the
/// shapes the source data actually exhibits (nesting depth ≤ 2), this
/// recurses to arbitrary depth. A plain object carrying no `value` key emits
/// itself as a single opaque value.
pub fn normalize(node: &MetadataValue) -> Vec<Value> {
    match node {
        MetadataValue::Scalar(Scalar::Null) => Vec::new(),
        MetadataValue::Scalar(scalar) => vec![scalar.to_json()],
        MetadataValue::Wrapped(wrapped) => normalize(&wrapped.value),
        MetadataValue::Sequence(items) => items.iter().flat_map(normalize).collect(),
        MetadataValue::Map(_) => vec![node.to_json()],
    }
}

/// Deterministic, order-independent textual key for grouping values:
/// canonical JSON with object keys sorted at every level.
pub fn stable_key(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                match serde_json::to_string(key) {
                    Ok(encoded) => out.push_str(&encoded),
                    Err(_) => out.push_str(key),
                }
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        scalar => match serde_json::to_string(scalar) {
            Ok(encoded) => out.push_str(&encoded),
            // Unserializable values fall back to their display form.
            Err(_) => out.push_str(&scalar.to_string()),
        },
    }
}

/// One distinct value and how often it was emitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: Value,
    pub count: u64,
}

/// The `by/{field}/count` payload: emission total, per-entity missing count,
/// and the frequency table ordered by canonical key.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ByCountResults {
    pub total: u64,
    pub missing: u64,
    pub values: Vec<ValueCount>,
}

/// Frequency table keyed by canonical serialization; keeps the first-seen
/// original value for output. Both aggregation backends assemble their
/// results through this one table so ordering and totals cannot diverge.
#[derive(Debug, Default)]
pub struct CountTable {
    entries: BTreeMap<String, (Value, u64)>,
}

impl CountTable {
    pub fn emit(&mut self, value: Value, count: u64) {
        let key = stable_key(&value);
        let entry = self.entries.entry(key).or_insert((value, 0));
        entry.1 += count;
    }

    pub fn into_results(self, missing: u64) -> ByCountResults {
        let mut total = 0;
        let values = self
            .entries
            .into_values()
            .map(|(value, count)| {
                total += count;
                ValueCount { value, count }
            })
            .collect();
        ByCountResults {
            total,
            missing,
            values,
        }
    }
}

/// Aggregate a metadata field over a collection of entities.
///
/// An entity whose field is absent, or whose normalization emits nothing
/// (a wrapped null, a list of nulls), counts as missing. Every emission
/// increments its value's count and the running total, so list-valued
/// fields may contribute more than one emission per entity.
pub fn count_values<'a, I>(items: I, field: &str) -> ByCountResults
where
    I: IntoIterator<Item = &'a Metadata>,
{
    let mut table = CountTable::default();
    let mut missing = 0;

    for metadata in items {
        match metadata.get(field) {
            None => missing += 1,
            Some(node) => {
                let emissions = normalize(node);
                if emissions.is_empty() {
                    missing += 1;
                } else {
                    for value in emissions {
                        table.emit(value, 1);
                    }
                }
            }
        }
    }

    table.into_results(missing)
}

/// Assemble results from store-side `(value, count)` rows. Rows are folded
/// through the same table as the in-memory path, so the output ordering is
/// the canonical-key order regardless of the store's own comparator.
pub fn fold_rows<I>(rows: I, missing: u64) -> ByCountResults
where
    I: IntoIterator<Item = (Value, u64)>,
{
    let mut table = CountTable::default();
    for (value, count) in rows {
        table.emit(value, count);
    }
    table.into_results(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(value: Value) -> Metadata {
        serde_json::from_value(value).expect("metadata should deserialize")
    }

    #[test]
    fn test_normalize_shapes() {
        let node: MetadataValue = serde_json::from_value(json!({"value": "M"})).unwrap();
        assert_eq!(normalize(&node), vec![json!("M")]);

        let node: MetadataValue =
            serde_json::from_value(json!([{"value": "White"}, "Asian"])).unwrap();
        assert_eq!(normalize(&node), vec![json!("White"), json!("Asian")]);

        let node: MetadataValue = serde_json::from_value(json!({"value": null})).unwrap();
        assert!(normalize(&node).is_empty());
    }

    #[test]
    fn test_normalize_recurses_past_depth_two() {
        let node: MetadataValue =
            serde_json::from_value(json!({"value": [[{"value": ["a", "b"]}], "c"]})).unwrap();
        assert_eq!(normalize(&node), vec![json!("a"), json!("b"), json!("c")]);
    }

    #[test]
    fn test_stable_key_sorts_object_keys() {
        let a = json!({"b": 1, "a": [true, null]});
        assert_eq!(stable_key(&a), r#"{"a":[true,null],"b":1}"#);

        // Key order in the source object is irrelevant.
        let b = json!({"a": [true, null], "b": 1});
        assert_eq!(stable_key(&a), stable_key(&b));
    }

    #[test]
    fn test_mixed_wrapping_counts_per_value() {
        // One entity stores race as a wrapped list of wrapped values, the
        // other as a plain wrapped scalar; both normalize to one emission.
        let docs = vec![
            metadata(json!({"race": {"value": [{"value": "White"}]}})),
            metadata(json!({"race": {"value": "Black"}})),
        ];
        let results = count_values(docs.iter(), "race");
        assert_eq!(results.total, 2);
        assert_eq!(results.missing, 0);
        assert_eq!(
            results.values,
            vec![
                ValueCount {
                    value: json!("Black"),
                    count: 1
                },
                ValueCount {
                    value: json!("White"),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_absent_field_counts_missing() {
        let docs = vec![
            metadata(json!({"diagnosis": {"value": "Neuroblastoma"}})),
            metadata(json!({"sex": {"value": "F"}})),
        ];
        let results = count_values(docs.iter(), "diagnosis");
        assert_eq!(results.total, 1);
        assert_eq!(results.missing, 1);
    }

    #[test]
    fn test_wrapped_null_counts_missing_not_zero_emission() {
        let docs = vec![metadata(json!({"diagnosis": {"value": null}}))];
        let results = count_values(docs.iter(), "diagnosis");
        assert_eq!(results.total, 0);
        assert_eq!(results.missing, 1);
        assert!(results.values.is_empty());
    }

    #[test]
    fn test_multi_valued_fields_emit_more_than_one_value_per_entity() {
        let docs = vec![
            metadata(json!({"race": {"value": ["White", "Asian"]}})),
            metadata(json!({"sex": {"value": "M"}})),
        ];
        let results = count_values(docs.iter(), "race");
        // total + missing exceeds the entity count.
        assert_eq!(results.total, 2);
        assert_eq!(results.missing, 1);
    }

    #[test]
    fn test_total_equals_sum_of_counts() {
        let docs = vec![
            metadata(json!({"race": {"value": ["White", "Asian"]}})),
            metadata(json!({"race": {"value": "White"}})),
            metadata(json!({"race": "Asian"})),
        ];
        let results = count_values(docs.iter(), "race");
        let sum: u64 = results.values.iter().map(|v| v.count).sum();
        assert_eq!(results.total, sum);
        assert_eq!(results.total, 4);
    }

    #[test]
    fn test_order_independence() {
        let docs = vec![
            metadata(json!({"race": {"value": "Black"}})),
            metadata(json!({"race": {"value": ["White", "Black"]}})),
            metadata(json!({"sex": {"value": "M"}})),
        ];
        let forward = count_values(docs.iter(), "race");
        let reversed = count_values(docs.iter().rev(), "race");
        let rotated = count_values(docs.iter().cycle().skip(1).take(docs.len()), "race");
        assert_eq!(forward, reversed);
        assert_eq!(forward, rotated);
    }

    #[test]
    fn test_values_sorted_by_canonical_key() {
        let docs = vec![
            metadata(json!({"stage": {"value": "III"}})),
            metadata(json!({"stage": {"value": "I"}})),
            metadata(json!({"stage": {"value": "II"}})),
        ];
        let results = count_values(docs.iter(), "stage");
        let order: Vec<&Value> = results.values.iter().map(|v| &v.value).collect();
        assert_eq!(order, vec![&json!("I"), &json!("II"), &json!("III")]);
    }

    #[test]
    fn test_fold_rows_matches_in_memory_assembly() {
        let folded = fold_rows(vec![(json!("White"), 2), (json!("Black"), 1)], 3);
        let docs = vec![
            metadata(json!({"race": {"value": "White"}})),
            metadata(json!({"race": {"value": ["White", "Black"]}})),
            metadata(json!({})),
            metadata(json!({})),
            metadata(json!({"race": {"value": null}})),
        ];
        let computed = count_values(docs.iter(), "race");
        assert_eq!(folded, computed);
    }

    #[test]
    fn test_fold_rows_merges_duplicate_keys() {
        let folded = fold_rows(vec![(json!("A"), 1), (json!("A"), 2)], 0);
        assert_eq!(folded.total, 3);
        assert_eq!(folded.values.len(), 1);
    }

    #[test]
    fn test_results_serialize_to_response_shape() {
        let results = fold_rows(vec![(json!("A"), 1)], 2);
        assert_eq!(
            serde_json::to_value(&results).unwrap(),
            json!({"total": 1, "missing": 2, "values": [{"value": "A", "count": 1}]})
        );
    }
}
