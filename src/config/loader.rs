//! Configuration loader module.
//!
//! Loads masking definitions from YAML files or in-memory strings. All
//! loading functions return detailed errors so configuration problems are
//! easy to diagnose: file I/O errors, YAML syntax errors and type
//! mismatches all carry the offending path.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::types::Definition;

/// Loads a masking definition from a YAML file.
pub fn load_definition<P: AsRef<Path>>(path: P) -> Result<Definition> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("read masking file '{}'", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("parse masking file '{}'", path.display()))
}

/// Loads a masking definition from a YAML string. Useful for tests and
/// for configuration content coming from non-file sources.
pub fn load_definition_from_string(content: &str) -> Result<Definition> {
    serde_yaml::from_str(content).context("parse masking definition")
}
