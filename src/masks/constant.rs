//! Replaces the selected value with a constant from the configuration.

use anyhow::Result;

use crate::config::MaskingRule;
use crate::masks::MaskEngine;
use crate::value::{Record, Value};

pub struct ConstantEngine {
    value: Value,
}

impl ConstantEngine {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl MaskEngine for ConstantEngine {
    fn mask(&mut self, _entry: Value, _context: &[Record]) -> Result<Value> {
        Ok(self.value.clone())
    }
}

pub fn factory(rule: &MaskingRule, _seed: u64) -> Result<Option<Box<dyn MaskEngine>>> {
    match &rule.mask.constant {
        Some(value) => Ok(Some(Box::new(ConstantEngine::new(Value::from_yaml(value)?)))),
        None => Ok(None),
    }
}
