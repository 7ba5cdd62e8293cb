//! The pull-based record pipeline.
//!
//! A pipeline is a chain of pull iterators: the sink repeatedly asks the
//! terminal stage for the next record, each stage pulls from its upstream,
//! processes one input and emits zero or more outputs through its
//! [`Collector`]. One record flows at a time; there is no parallelism
//! across stages or records.

pub mod stages;

use std::collections::VecDeque;

use anyhow::Result;

use crate::value::Record;

/// An iterator over records. `next` yields `Ok(None)` at exhaustion and
/// surfaces source errors through `Err`.
pub trait Source {
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Record>>;
}

/// A pipeline stage. Given one input record, a stage may collect zero,
/// one or many output records; emission order is preserved.
pub trait Processor {
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    fn process(&mut self, record: Record, out: &mut Collector) -> Result<()>;
}

/// A terminal consumer of records. `close` runs on every exit path of
/// [`SinkedPipeline::run`], success or failure.
pub trait Sink {
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    fn process(&mut self, record: Record) -> Result<()>;

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// The FIFO buffer a stage emits into.
#[derive(Debug, Default)]
pub struct Collector {
    queue: VecDeque<Record>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collect(&mut self, record: Record) {
        self.queue.push_back(record);
    }

    pub fn next(&mut self) -> Option<Record> {
        self.queue.pop_front()
    }
}

/// A source wrapped with one processor: drains the collector first, then
/// pulls upstream inputs until the processor emits something or upstream
/// is exhausted.
struct ProcessedSource {
    upstream: Box<dyn Source>,
    processor: Box<dyn Processor>,
    collector: Collector,
}

impl Source for ProcessedSource {
    fn open(&mut self) -> Result<()> {
        self.upstream.open()?;
        self.processor.open()
    }

    fn next(&mut self) -> Result<Option<Record>> {
        if let Some(record) = self.collector.next() {
            return Ok(Some(record));
        }
        while let Some(input) = self.upstream.next()? {
            self.processor.process(input, &mut self.collector)?;
            if let Some(record) = self.collector.next() {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}

/// A source over an in-memory slice of records. Also backs `--empty-input`.
pub struct SourceFromSlice {
    records: Vec<Record>,
    offset: usize,
}

impl SourceFromSlice {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records, offset: 0 }
    }
}

impl Source for SourceFromSlice {
    fn open(&mut self) -> Result<()> {
        self.offset = 0;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Record>> {
        let record = self.records.get(self.offset).cloned();
        self.offset += 1;
        Ok(record)
    }
}

/// A composable pipeline: a source plus an ordered chain of processors.
pub struct Pipeline {
    source: Box<dyn Source>,
}

impl Pipeline {
    pub fn new(source: Box<dyn Source>) -> Self {
        Self { source }
    }

    pub fn from_records(records: Vec<Record>) -> Self {
        Self::new(Box::new(SourceFromSlice::new(records)))
    }

    /// Appends a processing stage.
    pub fn process(self, processor: Box<dyn Processor>) -> Self {
        Self {
            source: Box::new(ProcessedSource {
                upstream: self.source,
                processor,
                collector: Collector::new(),
            }),
        }
    }

    /// Terminates the pipeline with a sink.
    pub fn sink<'a>(self, sink: Box<dyn Sink + 'a>) -> SinkedPipeline<'a> {
        SinkedPipeline {
            source: self.source,
            sink,
        }
    }

    /// Drives the pipeline to exhaustion, gathering every output record.
    pub fn collect(mut self) -> Result<Vec<Record>> {
        self.source.open()?;
        let mut records = Vec::new();
        while let Some(record) = self.source.next()? {
            records.push(record);
        }
        Ok(records)
    }
}

/// A pipeline bound to its sink, ready to run.
pub struct SinkedPipeline<'a> {
    source: Box<dyn Source>,
    sink: Box<dyn Sink + 'a>,
}

impl<'a> SinkedPipeline<'a> {
    /// Runs to exhaustion or to the first error. The sink is closed on all
    /// exit paths; already-written output is never rolled back.
    pub fn run(&mut self) -> Result<()> {
        self.source.open()?;
        self.sink.open()?;
        let outcome = self.drive();
        let closed = self.sink.close();
        outcome.and(closed)
    }

    fn drive(&mut self) -> Result<()> {
        while let Some(record) = self.source.next()? {
            self.sink.process(record)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::stages::{MapProcessor, RepeaterProcessor};
    use super::*;
    use crate::value::{Value, record_from_json};
    use anyhow::bail;

    fn record(json: serde_json::Value) -> Record {
        record_from_json(json).unwrap()
    }

    #[test]
    fn collector_is_first_in_first_out() {
        let mut collector = Collector::new();
        collector.collect(record(serde_json::json!({"n": 1})));
        collector.collect(record(serde_json::json!({"n": 2})));
        assert_eq!(collector.next(), Some(record(serde_json::json!({"n": 1}))));
        assert_eq!(collector.next(), Some(record(serde_json::json!({"n": 2}))));
        assert_eq!(collector.next(), None);
    }

    #[test]
    fn repeater_multiplies_the_stream() {
        let input = vec![record(serde_json::json!({"a": 1}))];
        let out = Pipeline::from_records(input)
            .process(Box::new(RepeaterProcessor::new(3)))
            .collect()
            .unwrap();
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn repeater_with_zero_drops_everything() {
        let input = vec![record(serde_json::json!({"a": 1}))];
        let out = Pipeline::from_records(input)
            .process(Box::new(RepeaterProcessor::new(0)))
            .collect()
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn emission_multiplicities_compose() {
        let input = vec![
            record(serde_json::json!({"a": 1})),
            record(serde_json::json!({"a": 2})),
        ];
        let out = Pipeline::from_records(input)
            .process(Box::new(RepeaterProcessor::new(2)))
            .process(Box::new(RepeaterProcessor::new(3)))
            .collect()
            .unwrap();
        assert_eq!(out.len(), 12);
    }

    #[test]
    fn outputs_keep_strict_input_order() {
        let input = vec![
            record(serde_json::json!({"i": 1})),
            record(serde_json::json!({"i": 2})),
        ];
        let out = Pipeline::from_records(input)
            .process(Box::new(RepeaterProcessor::new(2)))
            .collect()
            .unwrap();
        let order: Vec<_> = out.iter().map(|r| r["i"].clone()).collect();
        assert_eq!(
            order,
            vec![
                Value::Integer(1),
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(2)
            ]
        );
    }

    #[test]
    fn a_stage_error_aborts_the_pull() {
        let input = vec![record(serde_json::json!({"a": 1}))];
        let failing = MapProcessor::new(|_| bail!("boom"));
        let result = Pipeline::from_records(input)
            .process(Box::new(failing))
            .collect();
        assert!(result.is_err());
    }

    #[test]
    fn map_stage_forwards_the_mapped_record() {
        let input = vec![record(serde_json::json!({"a": 1}))];
        let upper = MapProcessor::new(|mut r: Record| {
            r.insert("b".into(), Value::Integer(2));
            Ok(r)
        });
        let out = Pipeline::from_records(input)
            .process(Box::new(upper))
            .collect()
            .unwrap();
        assert_eq!(out, vec![record(serde_json::json!({"a": 1, "b": 2}))]);
    }
}
