//! Mask engines and the factory registry.
//!
//! A mask engine transforms one value (or, for context engines, a parent
//! map plus leaf key) into its masked form. Engines are produced by
//! factories: a factory inspects a masking rule and either declines
//! (`Ok(None)`), produces the engine (`Ok(Some(..))`), or fails the build
//! (`Err`). The binder consults the fixed, ordered factory lists below for
//! every mask specification.

pub mod add;
pub mod command;
pub mod constant;
pub mod date_parser;
pub mod duration;
pub mod ff1;
pub mod flux_uri;
pub mod from_cache;
pub mod from_json;
pub mod hash;
pub mod increment;
pub mod luhn;
pub mod pipe;
pub mod rand_date;
pub mod random_decimal;
pub mod random_int;
pub mod random_list;
pub mod range_mask;
pub mod regex_mask;
pub mod replacement;
pub mod template;
pub mod weighted_choice;

use anyhow::Result;

use crate::cache::SharedCache;
use crate::config::{MaskingRule, Preserve};
use crate::value::{Record, Value};

/// A value-level masking algorithm. Engines may hold state (counters,
/// random streams); they are not required to be concurrency-safe. The
/// enclosing record(s) arrive as trailing context, innermost first.
pub trait MaskEngine {
    fn mask(&mut self, entry: Value, context: &[Record]) -> Result<Value>;
}

/// A context-level masking algorithm for masks that add, remove or
/// reshape sibling keys. Receives the parent map and the leaf key,
/// returns the replacement parent map.
pub trait MaskContextEngine {
    fn mask_context(&mut self, parent: Record, key: &str, context: &[Record]) -> Result<Record>;
}

/// Adapts a closure into a [`MaskEngine`].
pub struct FunctionMaskEngine<F> {
    function: F,
}

impl<F> FunctionMaskEngine<F>
where
    F: FnMut(Value, &[Record]) -> Result<Value>,
{
    pub fn new(function: F) -> Self {
        Self { function }
    }
}

impl<F> MaskEngine for FunctionMaskEngine<F>
where
    F: FnMut(Value, &[Record]) -> Result<Value>,
{
    fn mask(&mut self, entry: Value, context: &[Record]) -> Result<Value> {
        (self.function)(entry, context)
    }
}

/// Builds a value engine from a rule, or declines it.
pub type MaskFactory = fn(&MaskingRule, u64) -> Result<Option<Box<dyn MaskEngine>>>;

/// Builds a context engine from a rule, or declines it.
pub type MaskContextFactory = fn(&MaskingRule, u64) -> Result<Option<Box<dyn MaskContextEngine>>>;

/// The value-mask factories, in registry order.
pub fn value_factories() -> Vec<MaskFactory> {
    vec![
        constant::factory,
        command::factory,
        random_list::factory,
        random_int::factory,
        weighted_choice::factory,
        regex_mask::factory,
        hash::factory,
        rand_date::factory,
        increment::factory,
        replacement::factory,
        template::factory,
        duration::factory,
        range_mask::factory,
        duration::random_factory,
        random_decimal::factory,
        date_parser::factory,
        from_json::factory,
        luhn::factory,
        ff1::factory,
    ]
}

/// The context-mask factories, in registry order.
pub fn context_factories() -> Vec<MaskContextFactory> {
    vec![flux_uri::factory, add::factory, add::transient_factory]
}

/// Wraps an engine so null and/or empty inputs bypass it untouched.
pub struct PreservingMaskEngine {
    inner: Box<dyn MaskEngine>,
    preserve: Preserve,
}

impl PreservingMaskEngine {
    pub fn new(inner: Box<dyn MaskEngine>, preserve: Preserve) -> Self {
        Self { inner, preserve }
    }
}

impl MaskEngine for PreservingMaskEngine {
    fn mask(&mut self, entry: Value, context: &[Record]) -> Result<Value> {
        let keep_null = matches!(self.preserve, Preserve::Null | Preserve::All);
        let keep_empty = matches!(self.preserve, Preserve::Empty | Preserve::All);
        if (keep_null && entry == Value::Null) || (keep_empty && entry.is_empty()) {
            return Ok(entry);
        }
        self.inner.mask(entry, context)
    }
}

/// Wraps an engine so every (pre-mask value, masked value) pair lands in
/// a named cache.
pub struct CachedMaskEngine {
    inner: Box<dyn MaskEngine>,
    cache: SharedCache,
}

impl CachedMaskEngine {
    pub fn new(inner: Box<dyn MaskEngine>, cache: SharedCache) -> Self {
        Self { inner, cache }
    }
}

impl MaskEngine for CachedMaskEngine {
    fn mask(&mut self, entry: Value, context: &[Record]) -> Result<Value> {
        let key = entry.clone();
        let masked = self.inner.mask(entry, context)?;
        self.cache.borrow_mut().put(key, masked.clone());
        Ok(masked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::new_shared_cache;

    #[test]
    fn preserving_engine_skips_null_inputs() {
        let inner = FunctionMaskEngine::new(|_, _| Ok(Value::String("masked".into())));
        let mut engine = PreservingMaskEngine::new(Box::new(inner), Preserve::Null);
        assert_eq!(engine.mask(Value::Null, &[]).unwrap(), Value::Null);
        assert_eq!(
            engine.mask(Value::String("x".into()), &[]).unwrap(),
            Value::String("masked".into())
        );
    }

    #[test]
    fn preserving_engine_skips_empty_inputs() {
        let inner = FunctionMaskEngine::new(|_, _| Ok(Value::String("masked".into())));
        let mut engine = PreservingMaskEngine::new(Box::new(inner), Preserve::All);
        assert_eq!(
            engine.mask(Value::String(String::new()), &[]).unwrap(),
            Value::String(String::new())
        );
        assert_eq!(engine.mask(Value::Null, &[]).unwrap(), Value::Null);
    }

    #[test]
    fn cached_engine_records_the_pre_mask_key() {
        let cache = new_shared_cache();
        let inner = FunctionMaskEngine::new(|_, _| Ok(Value::String("masked".into())));
        let mut engine = CachedMaskEngine::new(Box::new(inner), cache.clone());
        engine.mask(Value::String("original".into()), &[]).unwrap();
        assert_eq!(
            cache.borrow().get(&Value::String("original".into())),
            Some(&Value::String("masked".into()))
        );
    }
}
