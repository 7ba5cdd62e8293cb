//! Replaces the selected value with a uniform decimal in [min, max],
//! rounded to a configured number of digits.

use anyhow::{Result, bail};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::MaskingRule;
use crate::masks::MaskEngine;
use crate::value::{Record, Value};

pub struct RandomDecimalEngine {
    min: f64,
    max: f64,
    precision: u32,
    rng: StdRng,
}

impl RandomDecimalEngine {
    pub fn new(min: f64, max: f64, precision: u32, seed: u64) -> Result<Self> {
        if min > max {
            bail!("randomDecimal: min {min} is greater than max {max}");
        }
        Ok(Self {
            min,
            max,
            precision,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

impl MaskEngine for RandomDecimalEngine {
    fn mask(&mut self, _entry: Value, _context: &[Record]) -> Result<Value> {
        let drawn = self.rng.random_range(self.min..=self.max);
        let factor = 10f64.powi(self.precision as i32);
        Ok(Value::Float((drawn * factor).round() / factor))
    }
}

pub fn factory(rule: &MaskingRule, seed: u64) -> Result<Option<Box<dyn MaskEngine>>> {
    match &rule.mask.random_decimal {
        Some(config) => Ok(Some(Box::new(RandomDecimalEngine::new(
            config.min,
            config.max,
            config.precision,
            seed,
        )?))),
        None => Ok(None),
    }
}
