//! Configuration validation module.
//!
//! Structural checks applied to a parsed [`Definition`] before binding
//! begins. Validation enforces the rules the binder relies on:
//!
//! - every rule has a non-empty selector path with no empty segments;
//! - every specification (primary and additional) activates exactly one
//!   mask kind — zero is `no mask kind`, more than one is a conflict;
//! - kind parameters that can be rejected without building an engine
//!   (empty choice lists, all-zero weights, pipe without child rules)
//!   fail here with the rule's selector in the message.

use anyhow::{Result, bail};

use crate::config::types::{Definition, MaskSpec, MaskingRule};

/// Validates the entire masking definition for structural correctness.
pub fn validate_definition(definition: &Definition) -> Result<()> {
    if definition.masking.is_empty() {
        bail!("the masking definition contains no rules");
    }
    for rule in &definition.masking {
        validate_rule(rule)?;
    }
    Ok(())
}

fn validate_rule(rule: &MaskingRule) -> Result<()> {
    let path = &rule.selector.jsonpath;
    if path.is_empty() {
        bail!("a masking rule is missing its selector jsonpath");
    }
    if path.split('.').any(str::is_empty) {
        bail!("selector '{path}' contains an empty segment");
    }
    validate_spec(path, &rule.mask)?;
    for spec in &rule.masks {
        validate_spec(path, spec)?;
    }
    Ok(())
}

fn validate_spec(path: &str, spec: &MaskSpec) -> Result<()> {
    let kinds = spec.populated_kinds();
    match kinds.len() {
        0 => bail!("selector '{path}': no mask kind specified"),
        1 => {}
        _ => bail!(
            "selector '{path}': conflicting mask kinds [{}], exactly one is allowed",
            kinds.join(", ")
        ),
    }
    if let Some(choices) = &spec.random_choice
        && choices.is_empty()
    {
        bail!("selector '{path}': randomChoice needs at least one choice");
    }
    if let Some(choices) = &spec.weighted_choice {
        if choices.is_empty() {
            bail!("selector '{path}': weightedChoice needs at least one choice");
        }
        if choices.iter().all(|c| c.weight == 0) {
            bail!("selector '{path}': weightedChoice weights must not all be zero");
        }
    }
    if let Some(choices) = &spec.hash
        && choices.is_empty()
    {
        bail!("selector '{path}': hash needs at least one choice");
    }
    if let Some(pipe) = &spec.pipe {
        if pipe.masking.is_none() && pipe.definition_file.is_none() {
            bail!("selector '{path}': pipe needs inline masking rules or a definitionFile");
        }
        if let Some(rules) = &pipe.masking {
            for rule in rules {
                validate_rule(rule)?;
            }
        }
    }
    Ok(())
}
