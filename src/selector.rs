//! Dotted-path selectors over records.
//!
//! A selector addresses zero or more locations inside a record. Each path
//! segment selects a key in a map; when a segment lands on an array, the
//! remainder of the path is applied element-wise to every element (which
//! must itself be a map, otherwise the location is absent).
//!
//! Selectors are pure: every operation returns a fresh record and leaves
//! unaddressed siblings untouched.

use anyhow::{Result, bail};

use crate::value::{Record, Value};

#[derive(Debug, Clone)]
pub struct PathSelector {
    segments: Vec<String>,
    path: String,
}

impl PathSelector {
    /// Parses a dotted path. The path must be non-empty and contain no
    /// empty segments.
    pub fn new(path: &str) -> Result<Self> {
        if path.is_empty() {
            bail!("selector path is empty");
        }
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            bail!("selector path '{path}' contains an empty segment");
        }
        Ok(Self {
            segments,
            path: path.to_string(),
        })
    }

    /// The textual form this selector was parsed from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Reads the addressed value. Traversing an array collects the
    /// element-wise results into an array; the read only succeeds when
    /// every element yields a value.
    pub fn read(&self, record: &Record) -> Option<Value> {
        read_at(&self.segments, record)
    }

    /// Like `read`, but stops one segment above the leaf and returns the
    /// parent map together with the leaf key. Fails when any intermediate
    /// is not a map.
    pub fn read_context(&self, record: &Record) -> Option<(Record, String)> {
        let (leaf, parents) = self.segments.split_last().expect("path is non-empty");
        let mut current = record;
        for segment in parents {
            match current.get(segment)? {
                Value::Map(map) => current = map,
                _ => return None,
            }
        }
        Some((current.clone(), leaf.clone()))
    }

    /// Writes `value` at the addressed location(s), returning the new
    /// record. Writing through an array expects an array of the same
    /// length and distributes it element-wise.
    pub fn write(&self, record: &Record, value: Value) -> Result<Record> {
        write_at(&self.segments, record, value)
    }

    /// Replaces the parent map identified by `read_context`.
    pub fn write_context(&self, record: &Record, replacement: Record) -> Result<Record> {
        let parents = &self.segments[..self.segments.len() - 1];
        write_context_at(parents, record, replacement)
    }

    /// Removes the addressed key from its parent map, element-wise across
    /// arrays. Missing intermediates leave the record unchanged.
    pub fn delete(&self, record: &Record) -> Record {
        delete_at(&self.segments, record)
    }
}

fn read_at(segments: &[String], record: &Record) -> Option<Value> {
    let (head, rest) = segments.split_first().expect("path is non-empty");
    let value = record.get(head)?;
    if rest.is_empty() {
        return Some(value.clone());
    }
    match value {
        Value::Map(map) => read_at(rest, map),
        Value::Array(items) => {
            let mut results = Vec::with_capacity(items.len());
            for item in items {
                let Value::Map(map) = item else {
                    return None;
                };
                results.push(read_at(rest, map)?);
            }
            Some(Value::Array(results))
        }
        _ => None,
    }
}

fn write_at(segments: &[String], record: &Record, value: Value) -> Result<Record> {
    let (head, rest) = segments.split_first().expect("path is non-empty");
    let mut result = record.clone();
    if rest.is_empty() {
        result.insert(head.clone(), value);
        return Ok(result);
    }
    match record.get(head) {
        Some(Value::Map(map)) => {
            result.insert(head.clone(), Value::Map(write_at(rest, map, value)?));
        }
        Some(Value::Array(items)) => {
            let Value::Array(values) = value else {
                bail!("cannot write a single value through the array at '{head}'");
            };
            if values.len() != items.len() {
                bail!(
                    "cannot write {} value(s) through the array of {} element(s) at '{head}'",
                    values.len(),
                    items.len()
                );
            }
            let mut masked = Vec::with_capacity(items.len());
            for (item, item_value) in items.iter().zip(values) {
                let Value::Map(map) = item else {
                    bail!("array element under '{head}' is not an object");
                };
                masked.push(Value::Map(write_at(rest, map, item_value)?));
            }
            result.insert(head.clone(), Value::Array(masked));
        }
        Some(_) => bail!("cannot write through the non-object value at '{head}'"),
        None => bail!("cannot write through the missing field '{head}'"),
    }
    Ok(result)
}

fn write_context_at(parents: &[String], record: &Record, replacement: Record) -> Result<Record> {
    let Some((head, rest)) = parents.split_first() else {
        return Ok(replacement);
    };
    let mut result = record.clone();
    match record.get(head) {
        Some(Value::Map(map)) => {
            result.insert(
                head.clone(),
                Value::Map(write_context_at(rest, map, replacement)?),
            );
            Ok(result)
        }
        Some(_) => bail!("cannot replace context through the non-object value at '{head}'"),
        None => bail!("cannot replace context through the missing field '{head}'"),
    }
}

fn delete_at(segments: &[String], record: &Record) -> Record {
    let (head, rest) = segments.split_first().expect("path is non-empty");
    let mut result = record.clone();
    if rest.is_empty() {
        result.shift_remove(head);
        return result;
    }
    match record.get(head) {
        Some(Value::Map(map)) => {
            result.insert(head.clone(), Value::Map(delete_at(rest, map)));
        }
        Some(Value::Array(items)) => {
            let pruned = items
                .iter()
                .map(|item| match item {
                    Value::Map(map) => Value::Map(delete_at(rest, map)),
                    other => other.clone(),
                })
                .collect();
            result.insert(head.clone(), Value::Array(pruned));
        }
        _ => {}
    }
    result
}
