//! Field lookup keys
//!
//! Scalars are reduced to the text a caller would type in a query string, so
//! `true`, `175` and `"inNetwork"` can all be matched from a URL parameter.

use serde_json::Value;

/// Comparable text form of a scalar JSON value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKey {
    Bool(bool),
    Number(String),
    String(String),
}

impl FieldKey {
    /// Builds a key from a JSON value. Arrays, objects and null have no key.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(FieldKey::Bool(*b)),
            Value::Number(n) => Some(FieldKey::Number(n.to_string())),
            Value::String(s) => Some(FieldKey::String(s.clone())),
            _ => None,
        }
    }

    /// Whether a raw query value selects this key.
    pub fn matches(&self, raw: &str) -> bool {
        match self {
            FieldKey::Bool(b) => raw == if *b { "true" } else { "false" },
            FieldKey::Number(text) | FieldKey::String(text) => raw == text,
        }
    }
}

/// Resolves a dotted path such as `plan_join.parent` inside a document.
pub fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(document, |current, segment| current.get(segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_scalars_only() {
        assert_eq!(FieldKey::from_json(&json!(true)), Some(FieldKey::Bool(true)));
        assert_eq!(
            FieldKey::from_json(&json!(175)),
            Some(FieldKey::Number("175".to_string()))
        );
        assert_eq!(FieldKey::from_json(&json!(null)), None);
        assert_eq!(FieldKey::from_json(&json!({"a": 1})), None);
        assert_eq!(FieldKey::from_json(&json!([1])), None);
    }

    #[test]
    fn test_matches_by_text() {
        assert!(FieldKey::from_json(&json!(175)).unwrap().matches("175"));
        assert!(!FieldKey::from_json(&json!(175)).unwrap().matches("175.0"));
        assert!(FieldKey::from_json(&json!(false)).unwrap().matches("false"));
        assert!(FieldKey::from_json(&json!("175")).unwrap().matches("175"));
    }

    #[test]
    fn test_lookup_dotted_path() {
        let doc = json!({"plan_join": {"name": "service", "parent": "lps1"}, "copay": 1});
        assert_eq!(lookup(&doc, "plan_join.parent"), Some(&json!("lps1")));
        assert_eq!(lookup(&doc, "copay"), Some(&json!(1)));
        assert_eq!(lookup(&doc, "plan_join.missing"), None);
        assert_eq!(lookup(&doc, "copay.deeper"), None);
    }
}
