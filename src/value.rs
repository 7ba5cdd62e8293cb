//! The record value model.
//!
//! Every record flowing through the pipeline is a [`Record`]: an ordered map
//! from string keys to [`Value`]s. A `Value` is a recursive tagged union
//! covering the scalar, array and map forms found in line-delimited JSON,
//! plus a native timestamp produced by the date masks.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// A record is a top-level map. Iteration preserves insertion order;
/// equality ignores it.
pub type Record = IndexMap<String, Value>;

/// A dynamically typed value inside a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<Value>),
    Map(Record),
}

impl Value {
    /// Converts a parsed JSON value. Whole numbers become `Integer`, other
    /// numbers `Float`; timestamps never appear on the input side.
    pub fn from_json(value: serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts back to JSON. Timestamps serialise as RFC 3339 strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Timestamp(t) => serde_json::Value::String(t.to_rfc3339()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// Converts a YAML value from the masking configuration into a `Value`,
    /// so mask parameters share the record value model.
    pub fn from_yaml(value: &serde_yaml::Value) -> Result<Value> {
        Ok(match value {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(*b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_yaml::Value::String(s) => Value::String(s.clone()),
            serde_yaml::Value::Sequence(items) => Value::Array(
                items
                    .iter()
                    .map(Value::from_yaml)
                    .collect::<Result<Vec<_>>>()?,
            ),
            serde_yaml::Value::Mapping(map) => {
                let mut record = Record::new();
                for (k, v) in map {
                    let key = k
                        .as_str()
                        .ok_or_else(|| anyhow!("configuration map keys must be strings"))?;
                    record.insert(key.to_string(), Value::from_yaml(v)?);
                }
                Value::Map(record)
            }
            serde_yaml::Value::Tagged(tagged) => Value::from_yaml(&tagged.value)?,
        })
    }

    /// The string form used by templates, hashing and cache keys. Strings
    /// render bare; everything else renders as compact JSON.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Timestamp(t) => t.to_rfc3339(),
            other => other.to_json().to_string(),
        }
    }

    /// True for the empty string, empty array and empty map.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Map(map) => map.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Parses one JSON document into a record; the document must be an object.
pub fn record_from_json(value: serde_json::Value) -> Result<Record> {
    match Value::from_json(value) {
        Value::Map(record) => Ok(record),
        other => Err(anyhow!("expected a JSON object, got {}", kind_name(&other))),
    }
}

/// Serialises a record as a JSON object.
pub fn record_to_json(record: &Record) -> serde_json::Value {
    Value::Map(record.clone()).to_json()
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Integer(_) => "an integer",
        Value::Float(_) => "a number",
        Value::String(_) => "a string",
        Value::Timestamp(_) => "a timestamp",
        Value::Array(_) => "an array",
        Value::Map(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_numbers_split_into_integer_and_float() {
        let parsed = Value::from_json(serde_json::json!({"age": 30, "score": 1.5}));
        let Value::Map(record) = parsed else {
            panic!("expected a map")
        };
        assert_eq!(record["age"], Value::Integer(30));
        assert_eq!(record["score"], Value::Float(1.5));
    }

    #[test]
    fn json_round_trip_preserves_structure() {
        let source = serde_json::json!({
            "name": "Alice",
            "tags": ["a", "b"],
            "address": {"city": "Valletta", "zip": null}
        });
        let record = record_from_json(source.clone()).unwrap();
        assert_eq!(record_to_json(&record), source);
    }

    #[test]
    fn non_object_line_is_rejected() {
        assert!(record_from_json(serde_json::json!([1, 2])).is_err());
    }

    #[test]
    fn map_equality_ignores_key_order() {
        let a = record_from_json(serde_json::json!({"x": 1, "y": 2})).unwrap();
        let b = record_from_json(serde_json::json!({"y": 2, "x": 1})).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn render_keeps_strings_bare() {
        assert_eq!(Value::String("Alice".into()).render(), "Alice");
        assert_eq!(Value::Integer(42).render(), "42");
        assert_eq!(Value::Null.render(), "");
        assert_eq!(
            Value::Array(vec![Value::Integer(1), Value::Integer(2)]).render(),
            "[1,2]"
        );
    }

    #[test]
    fn emptiness_covers_containers_only() {
        assert!(Value::String(String::new()).is_empty());
        assert!(Value::Array(vec![]).is_empty());
        assert!(!Value::Integer(0).is_empty());
        assert!(!Value::Null.is_empty());
    }
}
