//! Replaces the selected value with a random string matching a regular
//! expression.

use anyhow::{Context, Result};
use rand::Rng;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::MaskingRule;
use crate::masks::MaskEngine;
use crate::value::{Record, Value};

// Bounds unbounded repetitions (`*`, `+`) when generating.
const MAX_REPEAT: u32 = 100;

pub struct RegexEngine {
    generator: rand_regex::Regex,
    rng: StdRng,
}

impl RegexEngine {
    pub fn new(pattern: &str, seed: u64) -> Result<Self> {
        let generator = rand_regex::Regex::compile(pattern, MAX_REPEAT)
            .with_context(|| format!("regex: invalid pattern '{pattern}'"))?;
        Ok(Self {
            generator,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

impl MaskEngine for RegexEngine {
    fn mask(&mut self, _entry: Value, _context: &[Record]) -> Result<Value> {
        let generated: String = self.rng.sample(&self.generator);
        Ok(Value::String(generated))
    }
}

pub fn factory(rule: &MaskingRule, seed: u64) -> Result<Option<Box<dyn MaskEngine>>> {
    match &rule.mask.regex {
        Some(pattern) => Ok(Some(Box::new(RegexEngine::new(pattern, seed)?))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masking_generates_a_matching_string() {
        let pattern = "0[1-7]( [0-9]{2}){4}";
        let checker = regex::Regex::new(&format!("^{pattern}$")).unwrap();
        let mut engine = RegexEngine::new(pattern, 11).unwrap();
        for _ in 0..10 {
            let Value::String(masked) = engine.mask(Value::Null, &[]).unwrap() else {
                panic!("expected a string");
            };
            assert!(checker.is_match(&masked), "'{masked}' does not match");
        }
    }

    #[test]
    fn an_invalid_pattern_is_a_build_error() {
        assert!(RegexEngine::new("[", 0).is_err());
    }

    #[test]
    fn factory_declines_an_empty_spec() {
        assert!(factory(&MaskingRule::default(), 0).unwrap().is_none());
    }
}
