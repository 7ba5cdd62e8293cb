//! Replaces the selected value with its entry in a named cache. A cache
//! miss forwards the value unchanged.

use anyhow::Result;

use crate::cache::SharedCache;
use crate::masks::MaskEngine;
use crate::value::{Record, Value};

pub struct FromCacheEngine {
    cache: SharedCache,
}

impl FromCacheEngine {
    pub fn new(cache: SharedCache) -> Self {
        Self { cache }
    }
}

impl MaskEngine for FromCacheEngine {
    fn mask(&mut self, entry: Value, _context: &[Record]) -> Result<Value> {
        let cached = self.cache.borrow().get(&entry).cloned();
        Ok(cached.unwrap_or(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::new_shared_cache;

    #[test]
    fn masking_returns_the_cached_value() {
        let cache = new_shared_cache();
        cache
            .borrow_mut()
            .put(Value::String("alice".into()), Value::String("x".into()));
        let mut engine = FromCacheEngine::new(cache);
        assert_eq!(
            engine.mask(Value::String("alice".into()), &[]).unwrap(),
            Value::String("x".into())
        );
    }

    #[test]
    fn a_cache_miss_forwards_the_value() {
        let mut engine = FromCacheEngine::new(new_shared_cache());
        assert_eq!(
            engine.mask(Value::String("bob".into()), &[]).unwrap(),
            Value::String("bob".into())
        );
    }
}
