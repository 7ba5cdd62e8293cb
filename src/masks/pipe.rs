//! Runs a nested masking pipeline over an array of sub-records.
//!
//! The child rules come inline or from a separate masking file (loaded at
//! build time). Optional `injectParent`/`injectRoot` keys expose the
//! enclosing records to the child rules; injected keys are stripped from
//! the output again.

use anyhow::{Result, anyhow, bail};

use crate::binder::Binder;
use crate::config::Definition;
use crate::pipeline::Pipeline;
use crate::value::{Record, Value};

use super::MaskEngine;

pub struct PipeEngine {
    definition: Definition,
    inject_parent: Option<String>,
    inject_root: Option<String>,
    seed: u64,
}

impl PipeEngine {
    pub fn new(
        definition: Definition,
        inject_parent: Option<String>,
        inject_root: Option<String>,
        seed: u64,
    ) -> Self {
        Self {
            definition,
            inject_parent,
            inject_root,
            seed,
        }
    }
}

impl MaskEngine for PipeEngine {
    fn mask(&mut self, entry: Value, context: &[Record]) -> Result<Value> {
        let Value::Array(items) = entry else {
            bail!("pipe: the selected value is not an array");
        };

        let mut records = Vec::with_capacity(items.len());
        for item in items {
            let Value::Map(mut record) = item else {
                bail!("pipe: the selected array contains a non-object element");
            };
            if let Some(key) = &self.inject_parent {
                let parent = context
                    .first()
                    .ok_or_else(|| anyhow!("pipe: no parent record to inject"))?;
                record.insert(key.clone(), Value::Map(parent.clone()));
            }
            if let Some(key) = &self.inject_root {
                let root = context
                    .last()
                    .ok_or_else(|| anyhow!("pipe: no root record to inject"))?;
                record.insert(key.clone(), Value::Map(root.clone()));
            }
            records.push(record);
        }

        let binder = Binder::new(self.seed);
        let (pipeline, _caches) = binder.bind(Pipeline::from_records(records), &self.definition)?;
        let mut masked = pipeline.collect()?;

        for record in &mut masked {
            if let Some(key) = &self.inject_parent {
                record.shift_remove(key);
            }
            if let Some(key) = &self.inject_root {
                record.shift_remove(key);
            }
        }
        Ok(Value::Array(masked.into_iter().map(Value::Map).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_definition_from_string;
    use crate::value::record_from_json;

    fn child_definition() -> Definition {
        load_definition_from_string(
            r#"
            masking:
              - selector: {jsonpath: "name"}
                mask: {constant: "X"}
            "#,
        )
        .unwrap()
    }

    #[test]
    fn masking_applies_the_child_rules_to_every_element() {
        let mut engine = PipeEngine::new(child_definition(), None, None, 0);
        let entry = Value::Array(vec![
            Value::Map(record_from_json(serde_json::json!({"name": "a", "n": 1})).unwrap()),
            Value::Map(record_from_json(serde_json::json!({"name": "b", "n": 2})).unwrap()),
        ]);
        let masked = engine.mask(entry, &[]).unwrap();
        assert_eq!(
            masked,
            Value::Array(vec![
                Value::Map(record_from_json(serde_json::json!({"name": "X", "n": 1})).unwrap()),
                Value::Map(record_from_json(serde_json::json!({"name": "X", "n": 2})).unwrap()),
            ])
        );
    }

    #[test]
    fn injected_parents_are_visible_and_stripped() {
        let definition = load_definition_from_string(
            r#"
            masking:
              - selector: {jsonpath: "owner"}
                mask: {template: "{{.parent.name}}"}
            "#,
        )
        .unwrap();
        let mut engine = PipeEngine::new(definition, Some("parent".into()), None, 0);
        let outer = record_from_json(serde_json::json!({"name": "Ada"})).unwrap();
        let entry = Value::Array(vec![Value::Map(
            record_from_json(serde_json::json!({"owner": "?"})).unwrap(),
        )]);
        let masked = engine.mask(entry, std::slice::from_ref(&outer)).unwrap();
        assert_eq!(
            masked,
            Value::Array(vec![Value::Map(
                record_from_json(serde_json::json!({"owner": "Ada"})).unwrap()
            )])
        );
    }

    #[test]
    fn a_non_array_input_is_a_masking_error() {
        let mut engine = PipeEngine::new(child_definition(), None, None, 0);
        assert!(engine.mask(Value::Integer(1), &[]).is_err());
    }
}
