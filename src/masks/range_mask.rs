//! Coarsens an integer into its surrounding range, e.g. 25 with a range
//! size of 10 becomes `"[20;30["`.

use anyhow::{Result, bail};

use crate::config::MaskingRule;
use crate::masks::MaskEngine;
use crate::value::{Record, Value};

pub struct RangeMaskEngine {
    size: i64,
}

impl RangeMaskEngine {
    pub fn new(size: i64) -> Result<Self> {
        if size <= 0 {
            bail!("range: the range size must be positive, got {size}");
        }
        Ok(Self { size })
    }
}

impl MaskEngine for RangeMaskEngine {
    fn mask(&mut self, entry: Value, _context: &[Record]) -> Result<Value> {
        let Value::Integer(value) = entry else {
            bail!("range: the selected value '{}' is not an integer", entry.render());
        };
        let lower = value.div_euclid(self.size) * self.size;
        Ok(Value::String(format!("[{};{}[", lower, lower + self.size)))
    }
}

pub fn factory(rule: &MaskingRule, _seed: u64) -> Result<Option<Box<dyn MaskEngine>>> {
    match rule.mask.range_mask {
        Some(size) => Ok(Some(Box::new(RangeMaskEngine::new(size)?))),
        None => Ok(None),
    }
}
