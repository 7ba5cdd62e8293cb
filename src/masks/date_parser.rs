//! Re-formats date strings between representations.
//!
//! Parses the selected string with `inputFormat` (chrono `%` codes;
//! RFC 3339 when omitted) and emits it with `outputFormat` (a native
//! timestamp when omitted).

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::config::{DateParserConfig, MaskingRule};
use crate::masks::MaskEngine;
use crate::value::{Record, Value};

pub struct DateParserEngine {
    input_format: Option<String>,
    output_format: Option<String>,
}

impl DateParserEngine {
    pub fn new(config: &DateParserConfig) -> Self {
        Self {
            input_format: config.input_format.clone(),
            output_format: config.output_format.clone(),
        }
    }

    fn parse(&self, text: &str) -> Result<DateTime<Utc>> {
        match &self.input_format {
            None => Ok(DateTime::parse_from_rfc3339(text)
                .map_err(|e| anyhow!("dateParser: cannot parse '{text}' as RFC 3339: {e}"))?
                .with_timezone(&Utc)),
            Some(format) => {
                if let Ok(date_time) = NaiveDateTime::parse_from_str(text, format) {
                    return Ok(date_time.and_utc());
                }
                let date = NaiveDate::parse_from_str(text, format).map_err(|e| {
                    anyhow!("dateParser: cannot parse '{text}' with format '{format}': {e}")
                })?;
                Ok(date
                    .and_hms_opt(0, 0, 0)
                    .expect("midnight is always valid")
                    .and_utc())
            }
        }
    }
}

impl MaskEngine for DateParserEngine {
    fn mask(&mut self, entry: Value, _context: &[Record]) -> Result<Value> {
        let date = match &entry {
            Value::String(text) => self.parse(text)?,
            Value::Timestamp(date) => *date,
            other => bail!(
                "dateParser: the selected value '{}' is not a date string",
                other.render()
            ),
        };
        Ok(match &self.output_format {
            None => Value::Timestamp(date),
            Some(format) => Value::String(date.format(format).to_string()),
        })
    }
}

pub fn factory(rule: &MaskingRule, _seed: u64) -> Result<Option<Box<dyn MaskEngine>>> {
    match &rule.mask.date_parser {
        Some(config) => Ok(Some(Box::new(DateParserEngine::new(config)))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masking_reformats_between_layouts() {
        let config = DateParserConfig {
            input_format: Some("%d/%m/%Y".into()),
            output_format: Some("%Y-%m-%d".into()),
        };
        let mut engine = DateParserEngine::new(&config);
        let masked = engine.mask(Value::String("25/12/2021".into()), &[]).unwrap();
        assert_eq!(masked, Value::String("2021-12-25".into()));
    }

    #[test]
    fn omitted_output_format_yields_a_timestamp() {
        let config = DateParserConfig {
            input_format: None,
            output_format: None,
        };
        let mut engine = DateParserEngine::new(&config);
        let masked = engine
            .mask(Value::String("2021-12-25T10:30:00Z".into()), &[])
            .unwrap();
        assert_eq!(
            masked,
            Value::Timestamp("2021-12-25T10:30:00Z".parse().unwrap())
        );
    }

    #[test]
    fn an_unparseable_input_is_a_masking_error() {
        let config = DateParserConfig {
            input_format: Some("%Y-%m-%d".into()),
            output_format: None,
        };
        let mut engine = DateParserEngine::new(&config);
        assert!(engine.mask(Value::String("not-a-date".into()), &[]).is_err());
    }

    #[test]
    fn factory_declines_an_empty_spec() {
        assert!(factory(&MaskingRule::default(), 0).unwrap().is_none());
    }
}
