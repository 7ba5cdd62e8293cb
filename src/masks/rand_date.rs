//! Replaces the selected value with a random instant between two bounds.

use anyhow::{Result, bail};
use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::MaskingRule;
use crate::masks::MaskEngine;
use crate::value::{Record, Value};

pub struct RandDateEngine {
    min_ms: i64,
    max_ms: i64,
    rng: StdRng,
}

impl RandDateEngine {
    pub fn new(date_min: DateTime<Utc>, date_max: DateTime<Utc>, seed: u64) -> Result<Self> {
        let min_ms = date_min.timestamp_millis();
        let max_ms = date_max.timestamp_millis();
        if min_ms >= max_ms {
            bail!("randDate: dateMin {date_min} is not before dateMax {date_max}");
        }
        Ok(Self {
            min_ms,
            max_ms,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

impl MaskEngine for RandDateEngine {
    fn mask(&mut self, _entry: Value, _context: &[Record]) -> Result<Value> {
        let millis = self.rng.random_range(self.min_ms..self.max_ms);
        let instant = Utc
            .timestamp_millis_opt(millis)
            .single()
            .expect("millis are inside the valid chrono range");
        Ok(Value::Timestamp(instant))
    }
}

pub fn factory(rule: &MaskingRule, seed: u64) -> Result<Option<Box<dyn MaskEngine>>> {
    match &rule.mask.rand_date {
        Some(config) => Ok(Some(Box::new(RandDateEngine::new(
            config.date_min,
            config.date_max,
            seed,
        )?))),
        None => Ok(None),
    }
}
