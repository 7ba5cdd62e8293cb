//! Makes the selected string pass a Luhn check by replacing its final
//! character with the computed check digit. The character universe
//! defaults to decimal digits and may be widened (Luhn mod N).

use anyhow::{Result, bail};

use crate::config::MaskingRule;
use crate::masks::MaskEngine;
use crate::value::{Record, Value};

const DEFAULT_UNIVERSE: &str = "0123456789";

pub struct LuhnEngine {
    universe: Vec<char>,
}

impl LuhnEngine {
    pub fn new(universe: Option<&str>) -> Result<Self> {
        let universe: Vec<char> = universe.unwrap_or(DEFAULT_UNIVERSE).chars().collect();
        if universe.len() < 2 {
            bail!("luhn: the universe needs at least two characters");
        }
        Ok(Self { universe })
    }

    fn code_point(&self, c: char) -> Result<u64> {
        self.universe
            .iter()
            .position(|&u| u == c)
            .map(|p| p as u64)
            .ok_or_else(|| anyhow::anyhow!("luhn: character '{c}' is outside the universe"))
    }

    /// Luhn mod N over `payload`, returning the check character.
    fn check_character(&self, payload: &str) -> Result<char> {
        let n = self.universe.len() as u64;
        let mut sum = 0;
        let mut factor = 2;
        for c in payload.chars().rev() {
            let mut addend = factor * self.code_point(c)?;
            addend = addend / n + addend % n;
            sum += addend;
            factor = 3 - factor;
        }
        let remainder = sum % n;
        Ok(self.universe[((n - remainder) % n) as usize])
    }
}

impl MaskEngine for LuhnEngine {
    fn mask(&mut self, entry: Value, _context: &[Record]) -> Result<Value> {
        let Value::String(text) = &entry else {
            bail!("luhn: the selected value '{}' is not a string", entry.render());
        };
        let mut chars = text.chars().collect::<Vec<_>>();
        if chars.is_empty() {
            bail!("luhn: the selected value is empty");
        }
        chars.pop();
        let payload: String = chars.iter().collect();
        let check = self.check_character(&payload)?;
        Ok(Value::String(format!("{payload}{check}")))
    }
}

pub fn factory(rule: &MaskingRule, _seed: u64) -> Result<Option<Box<dyn MaskEngine>>> {
    match &rule.mask.luhn {
        Some(config) => Ok(Some(Box::new(LuhnEngine::new(config.universe.as_deref())?))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_luhn_valid(engine: &LuhnEngine, text: &str) -> bool {
        // a valid string is a fixed point of the mask
        let mut e = LuhnEngine {
            universe: engine.universe.clone(),
        };
        e.mask(Value::String(text.into()), &[]).unwrap() == Value::String(text.into())
    }

    #[test]
    fn masking_produces_a_valid_check_digit() {
        let mut engine = LuhnEngine::new(None).unwrap();
        // 7992739871 with check digit 3 is the classic Luhn example
        let masked = engine.mask(Value::String("79927398710".into()), &[]).unwrap();
        assert_eq!(masked, Value::String("79927398713".into()));
        assert!(is_luhn_valid(&engine, "79927398713"));
    }

    #[test]
    fn masking_is_idempotent_on_valid_numbers() {
        let mut engine = LuhnEngine::new(None).unwrap();
        let once = engine.mask(Value::String("4539148803436467".into()), &[]).unwrap();
        let twice = engine.mask(once.clone(), &[]).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn characters_outside_the_universe_are_a_masking_error() {
        let mut engine = LuhnEngine::new(None).unwrap();
        assert!(engine.mask(Value::String("12a45".into()), &[]).is_err());
    }

    #[test]
    fn factory_declines_an_empty_spec() {
        assert!(factory(&MaskingRule::default(), 0).unwrap().is_none());
    }
}
