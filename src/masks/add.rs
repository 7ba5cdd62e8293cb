//! Adds a field to the parent map when it is absent. String values may
//! contain `{{.path}}` templates resolved against the whole record.
//! `addTransient` behaves identically; the binder removes the field
//! again once every rule has run.

use anyhow::{Result, anyhow};
use regex::Regex;

use crate::config::MaskingRule;
use crate::masks::{MaskContextEngine, template};
use crate::value::{Record, Value};

pub struct AddEngine {
    value: Value,
    pattern: Regex,
}

impl AddEngine {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            pattern: Regex::new(r"\{\{\s*\.([A-Za-z0-9_][A-Za-z0-9_.]*)\s*\}\}")
                .expect("pattern is valid"),
        }
    }

    fn resolve(&self, context: &[Record]) -> Result<Value> {
        match &self.value {
            Value::String(text) if text.contains("{{") => {
                let record = context
                    .first()
                    .ok_or_else(|| anyhow!("add: no record context available"))?;
                Ok(Value::String(template::render(text, &self.pattern, record)?))
            }
            other => Ok(other.clone()),
        }
    }
}

impl MaskContextEngine for AddEngine {
    fn mask_context(&mut self, mut parent: Record, key: &str, context: &[Record]) -> Result<Record> {
        if !parent.contains_key(key) {
            let value = self.resolve(context)?;
            parent.insert(key.to_string(), value);
        }
        Ok(parent)
    }
}

pub fn factory(rule: &MaskingRule, _seed: u64) -> Result<Option<Box<dyn MaskContextEngine>>> {
    match &rule.mask.add {
        Some(value) => Ok(Some(Box::new(AddEngine::new(Value::from_yaml(value)?)))),
        None => Ok(None),
    }
}

pub fn transient_factory(rule: &MaskingRule, _seed: u64) -> Result<Option<Box<dyn MaskContextEngine>>> {
    match &rule.mask.add_transient {
        Some(value) => Ok(Some(Box::new(AddEngine::new(Value::from_yaml(value)?)))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::record_from_json;

    #[test]
    fn masking_adds_the_field_when_absent() {
        let mut engine = AddEngine::new(Value::Integer(1));
        let parent = record_from_json(serde_json::json!({"a": 0})).unwrap();
        let masked = engine.mask_context(parent, "added", &[]).unwrap();
        assert_eq!(masked["added"], Value::Integer(1));
    }

    #[test]
    fn masking_keeps_an_existing_field() {
        let mut engine = AddEngine::new(Value::Integer(1));
        let parent = record_from_json(serde_json::json!({"added": 9})).unwrap();
        let masked = engine.mask_context(parent, "added", &[]).unwrap();
        assert_eq!(masked["added"], Value::Integer(9));
    }

    #[test]
    fn string_values_render_as_templates() {
        let mut engine = AddEngine::new(Value::String("{{.name}}!".into()));
        let record = record_from_json(serde_json::json!({"name": "Ada"})).unwrap();
        let masked = engine
            .mask_context(Record::new(), "greeting", std::slice::from_ref(&record))
            .unwrap();
        assert_eq!(masked["greeting"], Value::String("Ada!".into()));
    }

    #[test]
    fn factories_decline_an_empty_spec() {
        assert!(factory(&MaskingRule::default(), 0).unwrap().is_none());
        assert!(transient_factory(&MaskingRule::default(), 0).unwrap().is_none());
    }
}
