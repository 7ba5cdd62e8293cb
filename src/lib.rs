//! pimo — a streaming engine for masking private data in JSON lines.
//!
//! Records (nested key/value trees) are pulled from a source, pushed
//! through a chain of masking stages built from a declarative YAML
//! definition, and emitted to a sink. See [`binder::Binder`] for how a
//! definition becomes a pipeline.

pub mod binder;
pub mod cache;
pub mod config;
pub mod jsonline;
pub mod logging;
pub mod masks;
pub mod pipeline;
pub mod selector;
pub mod uri;
pub mod value;

pub use binder::Binder;
pub use cache::{Cache, CacheRegistry, SharedCache, dump_cache, load_cache};
pub use config::{Definition, load_definition, load_definition_from_string, validate_definition};
pub use jsonline::{JsonLineSink, JsonLineSource};
pub use pipeline::{Collector, Pipeline, Processor, Sink, Source, SourceFromSlice};
pub use selector::PathSelector;
pub use value::{Record, Value};
