//! Replaces the selected value with the output of a shell command.

use std::process::Command;

use anyhow::{Context, Result, bail};

use crate::config::MaskingRule;
use crate::masks::MaskEngine;
use crate::value::{Record, Value};

pub struct CommandEngine {
    command: String,
}

impl CommandEngine {
    pub fn new(command: String) -> Self {
        Self { command }
    }
}

impl MaskEngine for CommandEngine {
    fn mask(&mut self, _entry: Value, _context: &[Record]) -> Result<Value> {
        let output = Command::new("/bin/sh")
            .arg("-c")
            .arg(&self.command)
            .output()
            .with_context(|| format!("run command '{}'", self.command))?;
        if !output.status.success() {
            bail!(
                "command '{}' failed ({}): {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim_end()
            );
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(Value::String(stdout.trim_end_matches('\n').to_string()))
    }
}

pub fn factory(rule: &MaskingRule, _seed: u64) -> Result<Option<Box<dyn MaskEngine>>> {
    match &rule.mask.command {
        Some(command) => Ok(Some(Box::new(CommandEngine::new(command.clone())))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masking_uses_the_command_output() {
        let mut engine = CommandEngine::new("echo qwertyuiop".into());
        let masked = engine.mask(Value::String("secret".into()), &[]).unwrap();
        assert_eq!(masked, Value::String("qwertyuiop".into()));
    }

    #[test]
    fn a_failing_command_is_a_masking_error() {
        let mut engine = CommandEngine::new("exit 3".into());
        assert!(engine.mask(Value::Null, &[]).is_err());
    }

    #[test]
    fn factory_declines_an_empty_spec() {
        assert!(factory(&MaskingRule::default(), 0).unwrap().is_none());
    }
}
