//! Replaces the selected value with a weighted pick from a list.

use anyhow::{Context, Result};
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::MaskingRule;
use crate::masks::MaskEngine;
use crate::value::{Record, Value};

pub struct WeightedChoiceEngine {
    choices: Vec<Value>,
    distribution: WeightedIndex<u64>,
    rng: StdRng,
}

impl WeightedChoiceEngine {
    pub fn new(choices: Vec<Value>, weights: Vec<u64>, seed: u64) -> Result<Self> {
        let distribution =
            WeightedIndex::new(&weights).context("weightedChoice: invalid weights")?;
        Ok(Self {
            choices,
            distribution,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

impl MaskEngine for WeightedChoiceEngine {
    fn mask(&mut self, _entry: Value, _context: &[Record]) -> Result<Value> {
        let index = self.distribution.sample(&mut self.rng);
        Ok(self.choices[index].clone())
    }
}

pub fn factory(rule: &MaskingRule, seed: u64) -> Result<Option<Box<dyn MaskEngine>>> {
    match &rule.mask.weighted_choice {
        Some(config) => {
            let choices = config
                .iter()
                .map(|c| Value::from_yaml(&c.choice))
                .collect::<Result<Vec<_>>>()?;
            let weights = config.iter().map(|c| c.weight).collect();
            Ok(Some(Box::new(WeightedChoiceEngine::new(
                choices, weights, seed,
            )?)))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_zero_weight_choice_is_never_picked() {
        let choices = vec![Value::String("always".into()), Value::String("never".into())];
        let mut engine = WeightedChoiceEngine::new(choices, vec![1, 0], 3).unwrap();
        for _ in 0..50 {
            assert_eq!(
                engine.mask(Value::Null, &[]).unwrap(),
                Value::String("always".into())
            );
        }
    }

    #[test]
    fn all_zero_weights_are_a_build_error() {
        let choices = vec![Value::Integer(1)];
        assert!(WeightedChoiceEngine::new(choices, vec![0], 0).is_err());
    }

    #[test]
    fn factory_declines_an_empty_spec() {
        assert!(factory(&MaskingRule::default(), 0).unwrap().is_none());
    }
}
