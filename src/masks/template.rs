//! Renders a string template with sibling values.
//!
//! Placeholders take the form `{{.path}}` where `path` is a dotted path
//! resolved against the innermost record context. `templateEach` applies
//! the template to every element of an array, binding the element (and
//! optionally its index) under configured names.

use anyhow::{Result, anyhow, bail};
use regex::Regex;

use crate::config::{MaskingRule, TemplateEachConfig};
use crate::masks::MaskEngine;
use crate::selector::PathSelector;
use crate::value::{Record, Value};

fn placeholder_pattern() -> Regex {
    Regex::new(r"\{\{\s*\.([A-Za-z0-9_][A-Za-z0-9_.]*)\s*\}\}").expect("pattern is valid")
}

/// Renders `template` against `record`, resolving every placeholder or
/// failing on the first one that addresses a missing field.
pub(crate) fn render(template: &str, pattern: &Regex, record: &Record) -> Result<String> {
    let mut rendered = String::with_capacity(template.len());
    let mut last = 0;
    for captures in pattern.captures_iter(template) {
        let matched = captures.get(0).expect("match exists");
        let path = &captures[1];
        let value = PathSelector::new(path)?
            .read(record)
            .ok_or_else(|| anyhow!("template: field '{path}' not found in the record"))?;
        rendered.push_str(&template[last..matched.start()]);
        rendered.push_str(&value.render());
        last = matched.end();
    }
    rendered.push_str(&template[last..]);
    Ok(rendered)
}

pub struct TemplateEngine {
    template: String,
    pattern: Regex,
}

impl TemplateEngine {
    pub fn new(template: String) -> Self {
        Self {
            template,
            pattern: placeholder_pattern(),
        }
    }
}

impl MaskEngine for TemplateEngine {
    fn mask(&mut self, _entry: Value, context: &[Record]) -> Result<Value> {
        let record = context
            .first()
            .ok_or_else(|| anyhow!("template: no record context available"))?;
        Ok(Value::String(render(&self.template, &self.pattern, record)?))
    }
}

pub struct TemplateEachEngine {
    item: String,
    index: Option<String>,
    template: String,
    pattern: Regex,
}

impl TemplateEachEngine {
    pub fn new(config: &TemplateEachConfig) -> Self {
        Self {
            item: config.item.clone(),
            index: config.index.clone(),
            template: config.template.clone(),
            pattern: placeholder_pattern(),
        }
    }
}

impl MaskEngine for TemplateEachEngine {
    fn mask(&mut self, entry: Value, _context: &[Record]) -> Result<Value> {
        let Value::Array(items) = entry else {
            bail!("templateEach: the selected value is not an array");
        };
        let mut rendered = Vec::with_capacity(items.len());
        for (position, item) in items.into_iter().enumerate() {
            let mut scope = Record::new();
            scope.insert(self.item.clone(), item);
            if let Some(index) = &self.index {
                scope.insert(index.clone(), Value::Integer(position as i64));
            }
            rendered.push(Value::String(render(&self.template, &self.pattern, &scope)?));
        }
        Ok(Value::Array(rendered))
    }
}

pub fn factory(rule: &MaskingRule, _seed: u64) -> Result<Option<Box<dyn MaskEngine>>> {
    match &rule.mask.template {
        Some(template) => Ok(Some(Box::new(TemplateEngine::new(template.clone())))),
        None => Ok(None),
    }
}
