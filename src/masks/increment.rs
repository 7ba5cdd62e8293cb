//! Replaces the selected value with an incrementing counter, ignoring
//! the input. Useful for re-keying identifiers.

use anyhow::Result;

use crate::config::MaskingRule;
use crate::masks::MaskEngine;
use crate::value::{Record, Value};

pub struct IncrementEngine {
    next: i64,
    increment: i64,
}

impl IncrementEngine {
    pub fn new(start: i64, increment: i64) -> Self {
        Self {
            next: start,
            increment,
        }
    }
}

impl MaskEngine for IncrementEngine {
    fn mask(&mut self, _entry: Value, _context: &[Record]) -> Result<Value> {
        let current = self.next;
        self.next += self.increment;
        Ok(Value::Integer(current))
    }
}

pub fn factory(rule: &MaskingRule, _seed: u64) -> Result<Option<Box<dyn MaskEngine>>> {
    match &rule.mask.incremental {
        Some(config) => Ok(Some(Box::new(IncrementEngine::new(
            config.start,
            config.increment,
        )))),
        None => Ok(None),
    }
}
