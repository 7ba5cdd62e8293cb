//! Replaces the selected value with a deterministic pick from a list:
//! the same input always maps to the same choice. The list comes inline
//! (`hash`) or from a URI (`hashInUri`).

use anyhow::{Result, bail};
use sha2::{Digest, Sha256};

use crate::config::MaskingRule;
use crate::masks::MaskEngine;
use crate::uri;
use crate::value::{Record, Value};

pub struct HashEngine {
    choices: Vec<Value>,
}

impl HashEngine {
    pub fn new(choices: Vec<Value>) -> Result<Self> {
        if choices.is_empty() {
            bail!("hash: the choice list is empty");
        }
        Ok(Self { choices })
    }
}

impl MaskEngine for HashEngine {
    fn mask(&mut self, entry: Value, _context: &[Record]) -> Result<Value> {
        let digest = Sha256::digest(entry.render().as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        let index = (u64::from_be_bytes(prefix) % self.choices.len() as u64) as usize;
        Ok(self.choices[index].clone())
    }
}

pub fn factory(rule: &MaskingRule, _seed: u64) -> Result<Option<Box<dyn MaskEngine>>> {
    if let Some(choices) = &rule.mask.hash {
        let choices = choices
            .iter()
            .map(Value::from_yaml)
            .collect::<Result<Vec<_>>>()?;
        return Ok(Some(Box::new(HashEngine::new(choices)?)));
    }
    if let Some(uri) = &rule.mask.hash_in_uri {
        let choices = uri::read_lines(uri)?
            .into_iter()
            .map(Value::String)
            .collect();
        return Ok(Some(Box::new(HashEngine::new(choices)?)));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choices() -> Vec<Value> {
        vec![
            Value::String("a".into()),
            Value::String("b".into()),
            Value::String("c".into()),
        ]
    }

    #[test]
    fn the_same_input_always_maps_to_the_same_choice() {
        let mut engine = HashEngine::new(choices()).unwrap();
        let first = engine.mask(Value::String("Benjamin".into()), &[]).unwrap();
        for _ in 0..10 {
            assert_eq!(
                engine.mask(Value::String("Benjamin".into()), &[]).unwrap(),
                first
            );
        }
        assert!(choices().contains(&first));
    }

    #[test]
    fn different_inputs_can_map_to_different_choices() {
        let mut engine = HashEngine::new(choices()).unwrap();
        let picked: std::collections::HashSet<String> = (0..32)
            .map(|i| {
                engine
                    .mask(Value::String(format!("input-{i}")), &[])
                    .unwrap()
                    .render()
            })
            .collect();
        assert!(picked.len() > 1);
    }

    #[test]
    fn factory_declines_an_empty_spec() {
        assert!(factory(&MaskingRule::default(), 0).unwrap().is_none());
    }
}
