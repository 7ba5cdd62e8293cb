//! Replaces the selected value with a uniform pick from a list, either
//! inlined in the configuration (`randomChoice`) or fetched line-by-line
//! from a URI at build time (`randomChoiceInUri`).

use anyhow::{Result, bail};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::MaskingRule;
use crate::masks::MaskEngine;
use crate::uri;
use crate::value::{Record, Value};

pub struct RandomListEngine {
    choices: Vec<Value>,
    rng: StdRng,
}

impl RandomListEngine {
    pub fn new(choices: Vec<Value>, seed: u64) -> Result<Self> {
        if choices.is_empty() {
            bail!("randomChoice: the choice list is empty");
        }
        Ok(Self {
            choices,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

impl MaskEngine for RandomListEngine {
    fn mask(&mut self, _entry: Value, _context: &[Record]) -> Result<Value> {
        let index = self.rng.random_range(0..self.choices.len());
        Ok(self.choices[index].clone())
    }
}

pub fn factory(rule: &MaskingRule, seed: u64) -> Result<Option<Box<dyn MaskEngine>>> {
    if let Some(choices) = &rule.mask.random_choice {
        let choices = choices
            .iter()
            .map(Value::from_yaml)
            .collect::<Result<Vec<_>>>()?;
        return Ok(Some(Box::new(RandomListEngine::new(choices, seed)?)));
    }
    if let Some(uri) = &rule.mask.random_choice_in_uri {
        let choices = uri::read_lines(uri)?
            .into_iter()
            .map(Value::String)
            .collect();
        return Ok(Some(Box::new(RandomListEngine::new(choices, seed)?)));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masking_picks_one_of_the_choices() {
        let choices = vec![
            Value::String("a".into()),
            Value::String("b".into()),
            Value::String("c".into()),
        ];
        let mut engine = RandomListEngine::new(choices.clone(), 7).unwrap();
        for _ in 0..20 {
            let masked = engine.mask(Value::Null, &[]).unwrap();
            assert!(choices.contains(&masked));
        }
    }

    #[test]
    fn the_same_seed_yields_the_same_sequence() {
        let choices = vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)];
        let mut first = RandomListEngine::new(choices.clone(), 42).unwrap();
        let mut second = RandomListEngine::new(choices, 42).unwrap();
        for _ in 0..10 {
            assert_eq!(
                first.mask(Value::Null, &[]).unwrap(),
                second.mask(Value::Null, &[]).unwrap()
            );
        }
    }

    #[test]
    fn factory_declines_an_empty_spec() {
        assert!(factory(&MaskingRule::default(), 0).unwrap().is_none());
    }
}
