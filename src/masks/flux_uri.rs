//! Assigns values drawn sequentially from a URI resource to the selected
//! field, one line per masked record, wrapping at exhaustion.

use anyhow::Result;

use crate::config::MaskingRule;
use crate::masks::MaskContextEngine;
use crate::uri;
use crate::value::{Record, Value};

pub struct FluxUriEngine {
    values: Vec<String>,
    offset: usize,
}

impl FluxUriEngine {
    pub fn new(values: Vec<String>) -> Self {
        Self { values, offset: 0 }
    }
}

impl MaskContextEngine for FluxUriEngine {
    fn mask_context(&mut self, mut parent: Record, key: &str, _context: &[Record]) -> Result<Record> {
        let value = self.values[self.offset % self.values.len()].clone();
        self.offset += 1;
        parent.insert(key.to_string(), Value::String(value));
        Ok(parent)
    }
}

pub fn factory(rule: &MaskingRule, _seed: u64) -> Result<Option<Box<dyn MaskContextEngine>>> {
    match &rule.mask.flux_uri {
        Some(uri) => Ok(Some(Box::new(FluxUriEngine::new(uri::read_lines(uri)?)))),
        None => Ok(None),
    }
}
