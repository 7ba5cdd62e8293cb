//! Configuration type definitions.
//!
//! Core configuration structures for pimo. These types are deserialised
//! from YAML masking files and handed to the binder, which turns the rule
//! list into a composed pipeline.
//!
//! # Example Structure
//!
//! ```yaml
//! version: "1"
//! masking:
//!   - selector:
//!       jsonpath: "user.email"
//!     mask:
//!       constant: "x@example.org"
//!     cache: emails
//! ```

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Root configuration: an ordered list of masking rules.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct Definition {
    /// Configuration format version, currently informational.
    #[serde(default)]
    pub version: Option<String>,

    /// Optional base seed; the `--seed` flag takes precedence.
    #[serde(default)]
    pub seed: Option<u64>,

    /// The masking rules, applied in declaration order.
    #[serde(default)]
    pub masking: Vec<MaskingRule>,
}

/// One masking rule: a selector, a primary mask, optional additional
/// masks, and the rule-level attributes.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct MaskingRule {
    pub selector: SelectorConfig,

    /// The primary mask specification.
    #[serde(default)]
    pub mask: MaskSpec,

    /// Additional specifications applied after the primary, in order.
    #[serde(default)]
    pub masks: Vec<MaskSpec>,

    /// Records (pre-mask value → masked value) into the named cache.
    #[serde(default)]
    pub cache: Option<String>,

    /// Forwards null and/or empty inputs without masking them.
    #[serde(default)]
    pub preserve: Option<Preserve>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct SelectorConfig {
    /// Dotted path addressing the field(s) to mask.
    #[serde(default)]
    pub jsonpath: String,
}

/// Which inputs bypass the mask engine untouched.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Preserve {
    /// Forward `null` inputs unchanged.
    Null,
    /// Forward empty strings, arrays and objects unchanged.
    Empty,
    /// Forward both null and empty inputs unchanged.
    All,
}

/// A mask specification. Exactly one field must be populated; which one
/// determines the mask kind the binder routes to.
#[derive(Clone, Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MaskSpec {
    pub add: Option<serde_yaml::Value>,
    pub add_transient: Option<serde_yaml::Value>,
    pub constant: Option<serde_yaml::Value>,
    pub random_choice: Option<Vec<serde_yaml::Value>>,
    pub random_choice_in_uri: Option<String>,
    pub command: Option<String>,
    pub random_int: Option<RandIntConfig>,
    pub weighted_choice: Option<Vec<WeightedChoiceConfig>>,
    pub regex: Option<String>,
    pub hash: Option<Vec<serde_yaml::Value>>,
    pub hash_in_uri: Option<String>,
    pub rand_date: Option<RandDateConfig>,
    pub incremental: Option<IncrementalConfig>,
    pub replacement: Option<String>,
    pub template: Option<String>,
    pub template_each: Option<TemplateEachConfig>,
    pub duration: Option<String>,
    pub remove: Option<bool>,
    #[serde(rename = "range")]
    pub range_mask: Option<i64>,
    pub random_duration: Option<RandomDurationConfig>,
    pub flux_uri: Option<String>,
    pub random_decimal: Option<RandomDecimalConfig>,
    pub date_parser: Option<DateParserConfig>,
    pub from_cache: Option<String>,
    pub ff1: Option<Ff1Config>,
    pub pipe: Option<PipeConfig>,
    pub from_json: Option<String>,
    pub luhn: Option<LuhnConfig>,
}

impl MaskSpec {
    /// Names of the populated kind fields, used to enforce that exactly
    /// one kind is active per specification.
    pub fn populated_kinds(&self) -> Vec<&'static str> {
        let mut kinds = Vec::new();
        if self.add.is_some() {
            kinds.push("add");
        }
        if self.add_transient.is_some() {
            kinds.push("add-transient");
        }
        if self.constant.is_some() {
            kinds.push("constant");
        }
        if self.random_choice.is_some() {
            kinds.push("random-choice");
        }
        if self.random_choice_in_uri.is_some() {
            kinds.push("random-choice-in-uri");
        }
        if self.command.is_some() {
            kinds.push("command");
        }
        if self.random_int.is_some() {
            kinds.push("random-int");
        }
        if self.weighted_choice.is_some() {
            kinds.push("weighted-choice");
        }
        if self.regex.is_some() {
            kinds.push("regex");
        }
        if self.hash.is_some() {
            kinds.push("hash");
        }
        if self.hash_in_uri.is_some() {
            kinds.push("hash-in-uri");
        }
        if self.rand_date.is_some() {
            kinds.push("rand-date");
        }
        if self.incremental.is_some() {
            kinds.push("incremental");
        }
        if self.replacement.is_some() {
            kinds.push("replacement");
        }
        if self.template.is_some() {
            kinds.push("template");
        }
        if self.template_each.is_some() {
            kinds.push("template-each");
        }
        if self.duration.is_some() {
            kinds.push("duration");
        }
        if self.remove.is_some() {
            kinds.push("remove");
        }
        if self.range_mask.is_some() {
            kinds.push("range-mask");
        }
        if self.random_duration.is_some() {
            kinds.push("random-duration");
        }
        if self.flux_uri.is_some() {
            kinds.push("flux-uri");
        }
        if self.random_decimal.is_some() {
            kinds.push("random-decimal");
        }
        if self.date_parser.is_some() {
            kinds.push("date-parser");
        }
        if self.from_cache.is_some() {
            kinds.push("from-cache");
        }
        if self.ff1.is_some() {
            kinds.push("ff1");
        }
        if self.pipe.is_some() {
            kinds.push("pipe");
        }
        if self.from_json.is_some() {
            kinds.push("from-json");
        }
        if self.luhn.is_some() {
            kinds.push("luhn");
        }
        kinds
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct RandIntConfig {
    pub min: i64,
    pub max: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WeightedChoiceConfig {
    pub choice: serde_yaml::Value,
    pub weight: u64,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandDateConfig {
    pub date_min: DateTime<Utc>,
    pub date_max: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct IncrementalConfig {
    pub start: i64,
    #[serde(default = "default_increment")]
    pub increment: i64,
}

const fn default_increment() -> i64 {
    1
}

#[derive(Clone, Debug, Deserialize)]
pub struct TemplateEachConfig {
    /// Name the current element is bound to inside the template.
    pub item: String,
    /// Optional name the element index is bound to.
    #[serde(default)]
    pub index: Option<String>,
    pub template: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RandomDurationConfig {
    pub min: String,
    pub max: String,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct RandomDecimalConfig {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub precision: u32,
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DateParserConfig {
    /// chrono format of the incoming string; RFC 3339 when omitted.
    #[serde(default)]
    pub input_format: Option<String>,
    /// chrono format of the emitted string; a native timestamp when omitted.
    #[serde(default)]
    pub output_format: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ff1Config {
    /// Environment variable holding the base64-encoded AES key.
    pub key_from_env: String,
    /// Sibling field providing the tweak, read from the record context.
    #[serde(default)]
    pub tweak_field: Option<String>,
    #[serde(default = "default_radix")]
    pub radix: u32,
    #[serde(default)]
    pub decrypt: bool,
}

const fn default_radix() -> u32 {
    10
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PipeConfig {
    /// Inline child rules applied to each element of the selected array.
    #[serde(default)]
    pub masking: Option<Vec<MaskingRule>>,
    /// Alternatively, a masking file to load the child rules from.
    #[serde(default)]
    pub definition_file: Option<String>,
    /// Key under which the parent record is visible to the child rules.
    #[serde(default)]
    pub inject_parent: Option<String>,
    /// Key under which the root record is visible to the child rules.
    #[serde(default)]
    pub inject_root: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct LuhnConfig {
    /// Character universe for the check digit; decimal digits by default.
    #[serde(default)]
    pub universe: Option<String>,
}
