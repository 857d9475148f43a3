use url::form_urlencoded;

/// Decode a raw query string into ordered key/value pairs.
///
/// Duplicate keys collapse to a single entry: the first occurrence keeps its
/// position, the last value wins. Downstream consumers (filter parsing,
/// pagination, Link-header reproduction) all see the same view.
pub fn parse_query(raw: Option<&str>) -> Vec<(String, String)> {
    let raw = match raw {
        Some(raw) => raw,
        None => return Vec::new(),
    };

    let mut pairs: Vec<(String, String)> = Vec::new();
    for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
        let key = key.into_owned();
        let value = value.into_owned();
        match pairs.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => pairs.push((key, value)),
        }
    }
    pairs
}

/// Look up a query value by key.
pub fn query_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_order_and_decodes() {
        let pairs = parse_query(Some("sex=M&metadata.unharmonized.site.code=A%2012"));
        assert_eq!(
            pairs,
            vec![
                ("sex".to_string(), "M".to_string()),
                (
                    "metadata.unharmonized.site.code".to_string(),
                    "A 12".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_duplicate_keys_keep_first_position_last_value() {
        let pairs = parse_query(Some("a=1&b=2&a=3"));
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "3".to_string()),
                ("b".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_query_is_empty() {
        assert!(parse_query(None).is_empty());
        assert!(parse_query(Some("")).is_empty());
    }

    #[test]
    fn test_query_value() {
        let pairs = parse_query(Some("page=2&per_page=10"));
        assert_eq!(query_value(&pairs, "page"), Some("2"));
        assert_eq!(query_value(&pairs, "missing"), None);
    }
}
