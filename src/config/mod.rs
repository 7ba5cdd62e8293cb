//! Configuration module.

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{load_definition, load_definition_from_string};
pub use types::{
    DateParserConfig, Definition, Ff1Config, IncrementalConfig, LuhnConfig, MaskSpec, MaskingRule,
    PipeConfig, Preserve, RandDateConfig, RandIntConfig, RandomDecimalConfig,
    RandomDurationConfig, SelectorConfig, TemplateEachConfig, WeightedChoiceConfig,
};
pub use validation::validate_definition;
