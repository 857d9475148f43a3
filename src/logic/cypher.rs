use serde_json::Value;
use std::collections::BTreeMap;

use crate::logic::filter::FilterSpec;

/// Bound parameters accompanying a compiled statement.
pub type Params = BTreeMap<String, Value>;

/// A compiled `WHERE` clause plus its bound parameters. The clause is either
/// empty (no constraints, so everything matches; deliberately not an
/// always-true boolean) or starts with `WHERE`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledWhere {
    pub clause: String,
    pub params: Params,
}

/// Predicate applied to every harmonized key in the `$filters` parameter
/// object. Mirrors the in-memory rule: absent field fails, a `.value`
/// wrapper is resolved first, lists test membership, everything else tests
/// exact equality.
const HARMONIZED_PREDICATE: &str = "\
ALL(k IN keys($filters) WHERE
  CASE
    WHEN n.metadata[k] IS NULL THEN false
    WHEN (n.metadata[k]).value IS NOT NULL THEN
      CASE
        WHEN (n.metadata[k]).value IS LIST THEN $filters[k] IN (n.metadata[k]).value
        ELSE (n.metadata[k]).value = $filters[k]
      END
    ELSE
      CASE
        WHEN (n.metadata[k]) IS LIST THEN $filters[k] IN (n.metadata[k])
        ELSE (n.metadata[k]) = $filters[k]
      END
  END
)";

/// Compile a filter spec into a parameterized Cypher `WHERE` clause.
///
/// All harmonized constraints bind as a single `$filters` object evaluated
/// by [`HARMONIZED_PREDICATE`]. Each unharmonized constraint becomes a
/// `reduce()` walk through nested maps with its own uniquely-named
/// parameters (`uh{i}_parts`, `uh{i}_value`), yielding false as soon as a
/// segment is absent. Sub-clauses are ANDed. An empty spec compiles to an
/// empty clause and no parameters.
pub fn compile_where(spec: &FilterSpec) -> CompiledWhere {
    let mut parts: Vec<String> = Vec::new();
    let mut params = Params::new();

    if !spec.harmonized.is_empty() {
        let filters: serde_json::Map<String, Value> = spec
            .harmonized
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        params.insert("filters".to_string(), Value::Object(filters));
        parts.push(HARMONIZED_PREDICATE.to_string());
    }

    for (idx, (path, value)) in spec.unharmonized.iter().enumerate() {
        let parts_param = format!("uh{idx}_parts");
        let value_param = format!("uh{idx}_value");
        params.insert(
            parts_param.clone(),
            Value::Array(path.iter().map(|p| Value::String(p.clone())).collect()),
        );
        params.insert(value_param.clone(), Value::String(value.clone()));
        parts.push(unharmonized_predicate(&parts_param, &value_param));
    }

    if parts.is_empty() {
        return CompiledWhere::default();
    }

    let clause = format!(
        "WHERE {}",
        parts
            .iter()
            .map(|p| format!("({p})"))
            .collect::<Vec<_>>()
            .join(" AND ")
    );
    CompiledWhere { clause, params }
}

fn unharmonized_predicate(parts_param: &str, value_param: &str) -> String {
    let walk = format!("reduce(m = n.metadata.unharmonized, p IN ${parts_param} | m[p])");
    format!(
        "\
CASE
  WHEN {walk} IS NULL THEN false
  ELSE
    CASE
      WHEN {walk} IS LIST THEN ${value_param} IN {walk}
      ELSE {walk} = ${value_param}
    END
END"
    )
}

fn match_clause(label: &str, where_clause: &str) -> String {
    if where_clause.is_empty() {
        format!("MATCH (n:{label})")
    } else {
        format!("MATCH (n:{label}) {where_clause}")
    }
}

/// Count of nodes matching the clause.
pub fn count_statement(label: &str, where_clause: &str) -> String {
    format!(
        "{} RETURN count(n) AS total",
        match_clause(label, where_clause)
    )
}

/// One window of matching nodes; binds `$skip` and `$limit`.
pub fn page_statement(label: &str, where_clause: &str) -> String {
    format!(
        "{} RETURN n AS node SKIP $skip LIMIT $limit",
        match_clause(label, where_clause)
    )
}

/// Every node of a kind, unfiltered and unpaged.
pub fn list_statement(label: &str) -> String {
    format!("MATCH (n:{label}) RETURN n AS node")
}

/// Value-frequency pipeline for `by/{field}/count`; binds `$field`.
///
/// Normalizes the same shapes as the in-memory normalizer: a list (or a
/// single node) of entries, each entry unwrapped through a `value` key when
/// it carries one, one more list/unwrap round for nested payloads, nulls
/// dropped at the end. Rows are re-sorted client-side, so the trailing
/// `ORDER BY` is cosmetic.
pub fn values_statement(label: &str, where_clause: &str) -> String {
    format!(
        "{match_part}
WITH n.metadata[$field] AS node
WHERE node IS NOT NULL
WITH CASE WHEN node IS LIST THEN node ELSE [node] END AS entries
UNWIND entries AS entry
WITH CASE WHEN entry IS MAP AND 'value' IN keys(entry) THEN entry.value ELSE entry END AS val
WITH CASE WHEN val IS LIST THEN val ELSE [val] END AS vals
UNWIND vals AS v
WITH CASE WHEN v IS MAP AND 'value' IN keys(v) THEN v.value ELSE v END AS value
WITH value
WHERE value IS NOT NULL
RETURN value, count(*) AS count
ORDER BY value",
        match_part = match_clause(label, where_clause)
    )
}

/// Count of matching nodes whose field is absent or wraps a null; binds
/// `$field`.
pub fn missing_statement(label: &str, where_clause: &str) -> String {
    format!(
        "{match_part}
WITH n.metadata[$field] AS node
RETURN sum(CASE
  WHEN node IS NULL THEN 1
  WHEN node IS MAP AND 'value' IN keys(node) AND node.value IS NULL THEN 1
  ELSE 0
END) AS missing",
        match_part = match_clause(label, where_clause)
    )
}

/// Single subject/sample/file by its (organization, namespace, name)
/// identity tuple; binds `$org`, `$ns`, `$name`.
pub fn entity_detail_statement(label: &str) -> String {
    format!(
        "MATCH (n:{label})
WHERE n.id.name = $name
  AND n.id.namespace.organization = $org
  AND n.id.namespace.name = $ns
RETURN n AS node
LIMIT 1"
    )
}

/// Single namespace by (organization, name); binds `$org`, `$name`.
pub fn namespace_detail_statement() -> String {
    "MATCH (n:Namespace)
WHERE n.id.organization = $org
  AND n.id.name = $name
RETURN n AS node
LIMIT 1"
        .to_string()
}

/// Single organization by identifier; binds `$name`.
pub fn organization_detail_statement() -> String {
    "MATCH (n:Organization)
WHERE n.identifier = $name
RETURN n AS node
LIMIT 1"
        .to_string()
}
