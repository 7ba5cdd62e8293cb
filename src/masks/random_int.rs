//! Replaces the selected value with a uniform integer in [min, max].

use anyhow::{Result, bail};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::MaskingRule;
use crate::masks::MaskEngine;
use crate::value::{Record, Value};

pub struct RandomIntEngine {
    min: i64,
    max: i64,
    rng: StdRng,
}

impl RandomIntEngine {
    pub fn new(min: i64, max: i64, seed: u64) -> Result<Self> {
        if min > max {
            bail!("randomInt: min {min} is greater than max {max}");
        }
        Ok(Self {
            min,
            max,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

impl MaskEngine for RandomIntEngine {
    fn mask(&mut self, _entry: Value, _context: &[Record]) -> Result<Value> {
        Ok(Value::Integer(self.rng.random_range(self.min..=self.max)))
    }
}

pub fn factory(rule: &MaskingRule, seed: u64) -> Result<Option<Box<dyn MaskEngine>>> {
    match &rule.mask.random_int {
        Some(config) => Ok(Some(Box::new(RandomIntEngine::new(
            config.min, config.max, seed,
        )?))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MaskSpec, RandIntConfig};

    #[test]
    fn masking_stays_inside_the_bounds() {
        let mut engine = RandomIntEngine::new(7, 77, 0).unwrap();
        for _ in 0..50 {
            let Value::Integer(masked) = engine.mask(Value::Integer(83), &[]).unwrap() else {
                panic!("expected an integer");
            };
            assert!((7..=77).contains(&masked));
        }
    }

    #[test]
    fn an_inverted_range_is_a_build_error() {
        assert!(RandomIntEngine::new(10, 3, 0).is_err());
    }

    #[test]
    fn factory_creates_a_mask_from_a_populated_spec() {
        let rule = MaskingRule {
            mask: MaskSpec {
                random_int: Some(RandIntConfig { min: 18, max: 25 }),
                ..MaskSpec::default()
            },
            ..MaskingRule::default()
        };
        assert!(factory(&rule, 0).unwrap().is_some());
    }

    #[test]
    fn factory_declines_an_empty_spec() {
        assert!(factory(&MaskingRule::default(), 0).unwrap().is_none());
    }
}
