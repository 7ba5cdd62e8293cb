//! Parses a JSON string into a structured value. The parameter names a
//! sibling field to parse; when empty, the selected value itself is
//! parsed.

use anyhow::{Result, anyhow, bail};

use crate::config::MaskingRule;
use crate::masks::MaskEngine;
use crate::selector::PathSelector;
use crate::value::{Record, Value};

pub struct FromJsonEngine {
    source: Option<PathSelector>,
}

impl FromJsonEngine {
    pub fn new(source_field: &str) -> Result<Self> {
        let source = if source_field.is_empty() {
            None
        } else {
            Some(PathSelector::new(source_field)?)
        };
        Ok(Self { source })
    }
}

impl MaskEngine for FromJsonEngine {
    fn mask(&mut self, entry: Value, context: &[Record]) -> Result<Value> {
        let source = match &self.source {
            None => entry,
            Some(selector) => {
                let record = context
                    .first()
                    .ok_or_else(|| anyhow!("fromJson: no record context available"))?;
                selector.read(record).ok_or_else(|| {
                    anyhow!("fromJson: field '{}' not found in the record", selector.path())
                })?
            }
        };
        let Value::String(text) = &source else {
            bail!("fromJson: the value '{}' is not a string", source.render());
        };
        let parsed: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| anyhow!("fromJson: cannot parse '{text}': {e}"))?;
        Ok(Value::from_json(parsed))
    }
}

pub fn factory(rule: &MaskingRule, _seed: u64) -> Result<Option<Box<dyn MaskEngine>>> {
    match &rule.mask.from_json {
        Some(field) => Ok(Some(Box::new(FromJsonEngine::new(field)?))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::record_from_json;

    #[test]
    fn masking_parses_the_selected_value() {
        let mut engine = FromJsonEngine::new("").unwrap();
        let masked = engine
            .mask(Value::String("{\"a\":1,\"b\":[true]}".into()), &[])
            .unwrap();
        assert_eq!(
            masked,
            Value::Map(record_from_json(serde_json::json!({"a": 1, "b": [true]})).unwrap())
        );
    }

    #[test]
    fn masking_parses_a_sibling_field_when_named() {
        let record = record_from_json(serde_json::json!({"payload": "[1,2]"})).unwrap();
        let mut engine = FromJsonEngine::new("payload").unwrap();
        let masked = engine
            .mask(Value::Null, std::slice::from_ref(&record))
            .unwrap();
        assert_eq!(masked, Value::Array(vec![Value::Integer(1), Value::Integer(2)]));
    }

    #[test]
    fn invalid_json_is_a_masking_error() {
        let mut engine = FromJsonEngine::new("").unwrap();
        assert!(engine.mask(Value::String("{oops".into()), &[]).is_err());
    }

    #[test]
    fn factory_declines_an_empty_spec() {
        assert!(factory(&MaskingRule::default(), 0).unwrap().is_none());
    }
}
