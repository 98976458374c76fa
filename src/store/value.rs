//! Value types for the key-value store

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::collections::VecDeque;

/// Represents the different types of values that can be stored
///
/// A key holds exactly one variant at a time; assigning a different variant
/// replaces the prior one in full. The variant is fixed by the command that
/// created the value: SET stores Text (or Json through its auto-detection
/// heuristic), list commands store List, hash commands store Hash, and the
/// JSON commands store Json.
///
/// The serde representation is externally tagged so that variant identity
/// survives a snapshot round trip: a Hash and a Json object holding the same
/// fields stay distinct after a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    /// Plain text value
    Text(String),

    /// Ordered list of text items
    List(VecDeque<String>),

    /// Field -> value mapping, iteration follows insertion order
    Hash(Map<String, Json>),

    /// Arbitrary structured document
    Json(Json),
}

impl Value {
    /// Create a text value
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Create an empty list
    pub fn empty_list() -> Self {
        Value::List(VecDeque::new())
    }

    /// Create an empty hash
    pub fn empty_hash() -> Self {
        Value::Hash(Map::new())
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Hash(_) => "hash",
            Value::Json(_) => "json",
        }
    }

    /// Try to get as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as list reference
    pub fn as_list(&self) -> Option<&VecDeque<String>> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    /// Try to get as mutable list
    pub fn as_list_mut(&mut self) -> Option<&mut VecDeque<String>> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    /// Try to get as hash reference
    pub fn as_hash(&self) -> Option<&Map<String, Json>> {
        match self {
            Value::Hash(hash) => Some(hash),
            _ => None,
        }
    }

    /// Try to get as mutable hash
    pub fn as_hash_mut(&mut self) -> Option<&mut Map<String, Json>> {
        match self {
            Value::Hash(hash) => Some(hash),
            _ => None,
        }
    }

    /// Check if value is a list
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Check if value is a hash
    pub fn is_hash(&self) -> bool {
        matches!(self, Value::Hash(_))
    }

    /// Convert to a structured JSON document
    pub fn to_json(&self) -> Json {
        match self {
            Value::Text(s) => Json::String(s.clone()),
            Value::List(list) => {
                Json::Array(list.iter().map(|item| Json::String(item.clone())).collect())
            }
            Value::Hash(hash) => Json::Object(hash.clone()),
            Value::Json(doc) => doc.clone(),
        }
    }

    /// Serialize for a plain read: Text is returned as-is, every other
    /// variant renders as its compact JSON form
    pub fn to_text(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            other => other.to_json().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_round_trip() {
        let value = Value::text("hello");
        assert_eq!(value.as_text(), Some("hello"));
        assert_eq!(value.to_text(), "hello");
    }

    #[test]
    fn test_list_to_text_is_json() {
        let mut list = VecDeque::new();
        list.push_back("a".to_string());
        list.push_back("b".to_string());
        let value = Value::List(list);
        assert_eq!(value.to_text(), r#"["a","b"]"#);
    }

    #[test]
    fn test_json_to_text_is_compact() {
        let doc: Json = serde_json::from_str(r#"{ "a": 1, "b": [2, 3] }"#).unwrap();
        let value = Value::Json(doc);
        assert_eq!(value.to_text(), r#"{"a":1,"b":[2,3]}"#);
    }

    #[test]
    fn test_serde_keeps_variant_identity() {
        let mut hash = Map::new();
        hash.insert("f".to_string(), Json::String("v".to_string()));
        let stored = Value::Hash(hash);

        let encoded = serde_json::to_string(&stored).unwrap();
        let decoded: Value = serde_json::from_str(&encoded).unwrap();

        assert!(decoded.is_hash());
        assert_eq!(decoded, stored);

        // A Json document with the same fields must stay a Json document
        let doc = Value::Json(serde_json::json!({"f": "v"}));
        let encoded = serde_json::to_string(&doc).unwrap();
        let decoded: Value = serde_json::from_str(&encoded).unwrap();
        assert!(!decoded.is_hash());
        assert_eq!(decoded, doc);
    }

    #[test]
    fn test_hash_keeps_insertion_order() {
        let mut hash = Map::new();
        hash.insert("zeta".to_string(), Json::String("1".to_string()));
        hash.insert("alpha".to_string(), Json::String("2".to_string()));
        let fields: Vec<&String> = hash.keys().collect();
        assert_eq!(fields, vec!["zeta", "alpha"]);
    }
}
