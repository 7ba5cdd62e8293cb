//! Named value caches.
//!
//! A cache maps a value to the value it was most recently masked into,
//! keeping a first-seen insertion-order snapshot for persistence. Caches
//! are single-writer: the running pipeline owns them for the duration of
//! the run, so they are shared through `Rc<RefCell<...>>`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::rc::Rc;

use anyhow::{Context, Result};
use indexmap::IndexMap;

use crate::jsonline::JsonLineSource;
use crate::pipeline::{Pipeline, Sink};
use crate::value::{Record, Value};

/// A keyed value store with an insertion-ordered snapshot. Keys compare by
/// canonical JSON encoding; the original key value is retained for `iter`.
#[derive(Debug, Default)]
pub struct Cache {
    entries: IndexMap<String, (Value, Value)>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(&encode_key(key)).map(|(_, value)| value)
    }

    /// Stores `value` under `key`. A re-stored key keeps its original
    /// position in the snapshot but takes the new value.
    pub fn put(&mut self, key: Value, value: Value) {
        self.entries.insert(encode_key(&key), (key, value));
    }

    /// Key/value pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.values().map(|(key, value)| (key, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn encode_key(key: &Value) -> String {
    key.to_json().to_string()
}

pub type SharedCache = Rc<RefCell<Cache>>;

/// The caches created while binding a configuration, keyed by cache name.
pub type CacheRegistry = HashMap<String, SharedCache>;

pub fn new_shared_cache() -> SharedCache {
    Rc::new(RefCell::new(Cache::new()))
}

/// A sink that stores records with conventional `key`/`value` fields into
/// a cache.
pub struct SinkToCache {
    cache: SharedCache,
}

impl SinkToCache {
    pub fn new(cache: SharedCache) -> Self {
        Self { cache }
    }
}

impl Sink for SinkToCache {
    fn process(&mut self, record: Record) -> Result<()> {
        let key = record.get("key").cloned().unwrap_or(Value::Null);
        let value = record.get("value").cloned().unwrap_or(Value::Null);
        self.cache.borrow_mut().put(key, value);
        Ok(())
    }
}

/// Pre-loads a cache from a JSONL file of `{"key": ..., "value": ...}`
/// lines by piping the file through a [`SinkToCache`].
pub fn load_cache(name: &str, cache: SharedCache, path: &str) -> Result<()> {
    let file = File::open(path).with_context(|| format!("load cache '{name}' from '{path}'"))?;
    let source = JsonLineSource::new(BufReader::new(file));
    Pipeline::new(Box::new(source))
        .sink(Box::new(SinkToCache::new(Rc::clone(&cache))))
        .run()
        .with_context(|| format!("load cache '{name}' from '{path}'"))?;
    tracing::info!(
        "Cache '{}' loaded from '{}' ({} entries)",
        name,
        path,
        cache.borrow().len()
    );
    Ok(())
}

/// Dumps a cache to a JSONL file, one `{"key": ..., "value": ...}` line
/// per entry, in first-seen order.
pub fn dump_cache(name: &str, cache: &SharedCache, path: &str) -> Result<()> {
    let file = File::create(path).with_context(|| format!("dump cache '{name}' to '{path}'"))?;
    let mut writer = BufWriter::new(file);
    for (key, value) in cache.borrow().iter() {
        let line = serde_json::json!({"key": key.to_json(), "value": value.to_json()});
        serde_json::to_writer(&mut writer, &line)
            .with_context(|| format!("dump cache '{name}' to '{path}'"))?;
        writer.write_all(b"\n")?;
    }
    writer
        .flush()
        .with_context(|| format!("dump cache '{name}' to '{path}'"))?;
    tracing::info!("Cache '{}' dumped to '{}'", name, path);
    Ok(())
}
