//! The built-in pipeline stages.

use anyhow::Result;

use crate::masks::{MaskContextEngine, MaskEngine};
use crate::pipeline::{Collector, Processor};
use crate::selector::PathSelector;
use crate::value::{Record, Value};

/// Emits every input `times` times, unchanged. Zero drops the input.
pub struct RepeaterProcessor {
    times: usize,
}

impl RepeaterProcessor {
    pub fn new(times: usize) -> Self {
        Self { times }
    }
}

impl Processor for RepeaterProcessor {
    fn process(&mut self, record: Record, out: &mut Collector) -> Result<()> {
        for _ in 0..self.times {
            out.collect(record.clone());
        }
        Ok(())
    }
}

/// Applies a value-level mask engine at the selector's location. A record
/// where the selector finds nothing is forwarded unchanged; an array read
/// is masked element-wise and written back with the same arity.
pub struct MaskProcessor {
    selector: PathSelector,
    engine: Box<dyn MaskEngine>,
}

impl MaskProcessor {
    pub fn new(selector: PathSelector, engine: Box<dyn MaskEngine>) -> Self {
        Self { selector, engine }
    }
}

impl Processor for MaskProcessor {
    fn process(&mut self, record: Record, out: &mut Collector) -> Result<()> {
        let Some(matched) = self.selector.read(&record) else {
            out.collect(record);
            return Ok(());
        };
        let masked = match matched {
            Value::Array(items) => {
                let mut masked = Vec::with_capacity(items.len());
                for item in items {
                    masked.push(self.engine.mask(item, std::slice::from_ref(&record))?);
                }
                Value::Array(masked)
            }
            other => self.engine.mask(other, std::slice::from_ref(&record))?,
        };
        out.collect(self.selector.write(&record, masked)?);
        Ok(())
    }
}

/// Applies a value-level mask engine to the selected value as a whole.
/// Unlike [`MaskProcessor`], an array match reaches the engine intact
/// instead of element-wise; the binder routes the masks whose domain is
/// the array itself (`templateEach`, `pipe`) through this stage.
pub struct MaskWholeProcessor {
    selector: PathSelector,
    engine: Box<dyn MaskEngine>,
}

impl MaskWholeProcessor {
    pub fn new(selector: PathSelector, engine: Box<dyn MaskEngine>) -> Self {
        Self { selector, engine }
    }
}

impl Processor for MaskWholeProcessor {
    fn process(&mut self, record: Record, out: &mut Collector) -> Result<()> {
        let Some(matched) = self.selector.read(&record) else {
            out.collect(record);
            return Ok(());
        };
        let masked = self.engine.mask(matched, std::slice::from_ref(&record))?;
        out.collect(self.selector.write(&record, masked)?);
        Ok(())
    }
}

/// Applies a context-level mask engine: the engine receives the parent map
/// and leaf key and returns a replacement parent map.
pub struct MaskContextProcessor {
    selector: PathSelector,
    engine: Box<dyn MaskContextEngine>,
}

impl MaskContextProcessor {
    pub fn new(selector: PathSelector, engine: Box<dyn MaskContextEngine>) -> Self {
        Self { selector, engine }
    }
}

impl Processor for MaskContextProcessor {
    fn process(&mut self, record: Record, out: &mut Collector) -> Result<()> {
        let Some((parent, key)) = self.selector.read_context(&record) else {
            out.collect(record);
            return Ok(());
        };
        let masked = self
            .engine
            .mask_context(parent, &key, std::slice::from_ref(&record))?;
        out.collect(self.selector.write_context(&record, masked)?);
        Ok(())
    }
}

/// Unconditionally deletes the selected field and forwards the record.
pub struct DeleteProcessor {
    selector: PathSelector,
}

impl DeleteProcessor {
    pub fn new(selector: PathSelector) -> Self {
        Self { selector }
    }
}

impl Processor for DeleteProcessor {
    fn process(&mut self, record: Record, out: &mut Collector) -> Result<()> {
        out.collect(self.selector.delete(&record));
        Ok(())
    }
}

/// Forwards `mapper(record)`.
pub struct MapProcessor<F> {
    mapper: F,
}

impl<F> MapProcessor<F>
where
    F: FnMut(Record) -> Result<Record>,
{
    pub fn new(mapper: F) -> Self {
        Self { mapper }
    }
}

impl<F> Processor for MapProcessor<F>
where
    F: FnMut(Record) -> Result<Record>,
{
    fn process(&mut self, record: Record, out: &mut Collector) -> Result<()> {
        out.collect((self.mapper)(record)?);
        Ok(())
    }
}
