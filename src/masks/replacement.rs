//! Replaces the selected value with the value of another field, read
//! from the innermost record context.

use anyhow::{Result, anyhow};

use crate::config::MaskingRule;
use crate::masks::MaskEngine;
use crate::selector::PathSelector;
use crate::value::{Record, Value};

pub struct ReplacementEngine {
    field: PathSelector,
}

impl ReplacementEngine {
    pub fn new(field: &str) -> Result<Self> {
        Ok(Self {
            field: PathSelector::new(field)?,
        })
    }
}

impl MaskEngine for ReplacementEngine {
    fn mask(&mut self, _entry: Value, context: &[Record]) -> Result<Value> {
        let record = context
            .first()
            .ok_or_else(|| anyhow!("replacement: no record context available"))?;
        self.field.read(record).ok_or_else(|| {
            anyhow!(
                "replacement: field '{}' not found in the record",
                self.field.path()
            )
        })
    }
}

pub fn factory(rule: &MaskingRule, _seed: u64) -> Result<Option<Box<dyn MaskEngine>>> {
    match &rule.mask.replacement {
        Some(field) => Ok(Some(Box::new(ReplacementEngine::new(field)?))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::record_from_json;

    #[test]
    fn masking_copies_the_sibling_field() {
        let record =
            record_from_json(serde_json::json!({"realName": "Alice", "displayName": "x"}))
                .unwrap();
        let mut engine = ReplacementEngine::new("realName").unwrap();
        let masked = engine
            .mask(Value::String("x".into()), std::slice::from_ref(&record))
            .unwrap();
        assert_eq!(masked, Value::String("Alice".into()));
    }

    #[test]
    fn a_missing_source_field_is_a_masking_error() {
        let record = record_from_json(serde_json::json!({"displayName": "x"})).unwrap();
        let mut engine = ReplacementEngine::new("realName").unwrap();
        assert!(
            engine
                .mask(Value::Null, std::slice::from_ref(&record))
                .is_err()
        );
    }

    #[test]
    fn factory_declines_an_empty_spec() {
        assert!(factory(&MaskingRule::default(), 0).unwrap().is_none());
    }
}
