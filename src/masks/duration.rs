//! Shifts date values by ISO-8601 periods.
//!
//! `duration` applies a fixed signed period (`-P2D`, `PT1H30M`) to the
//! selected date; `randomDuration` applies a random shift drawn between
//! two periods. Dates arrive either as native timestamps or as RFC 3339
//! strings and leave in the same form.

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, Days, Duration, Months, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::MaskingRule;
use crate::masks::MaskEngine;
use crate::value::{Record, Value};

/// A signed ISO-8601 period: `[-]P[nY][nM][nW][nD][T[nH][nM][nS]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Period {
    negative: bool,
    months: u32,
    days: u64,
    seconds: i64,
}

impl Period {
    pub(crate) fn parse(text: &str) -> Result<Period> {
        let (negative, rest) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let rest = rest
            .strip_prefix('P')
            .ok_or_else(|| anyhow!("invalid ISO-8601 period '{text}'"))?;
        if rest.is_empty() {
            bail!("invalid ISO-8601 period '{text}'");
        }

        let mut months: u32 = 0;
        let mut days: u64 = 0;
        let mut seconds: i64 = 0;
        let mut in_time = false;
        let mut number = String::new();
        for c in rest.chars() {
            match c {
                '0'..='9' => number.push(c),
                'T' if !in_time && number.is_empty() => in_time = true,
                'Y' | 'M' | 'W' | 'D' | 'H' | 'S' => {
                    let n: i64 = number
                        .parse()
                        .map_err(|_| anyhow!("invalid ISO-8601 period '{text}'"))?;
                    number.clear();
                    match (c, in_time) {
                        ('Y', false) => months += 12 * n as u32,
                        ('M', false) => months += n as u32,
                        ('W', false) => days += 7 * n as u64,
                        ('D', false) => days += n as u64,
                        ('H', true) => seconds += 3600 * n,
                        ('M', true) => seconds += 60 * n,
                        ('S', true) => seconds += n,
                        _ => bail!("invalid ISO-8601 period '{text}'"),
                    }
                }
                _ => bail!("invalid ISO-8601 period '{text}'"),
            }
        }
        if !number.is_empty() {
            bail!("invalid ISO-8601 period '{text}': trailing number");
        }
        Ok(Period {
            negative,
            months,
            days,
            seconds,
        })
    }

    pub(crate) fn shift(&self, date: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let shifted = if self.negative {
            date.checked_sub_months(Months::new(self.months))
                .and_then(|d| d.checked_sub_days(Days::new(self.days)))
                .and_then(|d| d.checked_sub_signed(Duration::seconds(self.seconds)))
        } else {
            date.checked_add_months(Months::new(self.months))
                .and_then(|d| d.checked_add_days(Days::new(self.days)))
                .and_then(|d| d.checked_add_signed(Duration::seconds(self.seconds)))
        };
        shifted.ok_or_else(|| anyhow!("date shift overflows the representable range"))
    }

    /// Approximate signed length in seconds (months as 30 days, used only
    /// to draw the random span).
    pub(crate) fn approx_seconds(&self) -> i64 {
        let unsigned =
            self.months as i64 * 30 * 86_400 + self.days as i64 * 86_400 + self.seconds;
        if self.negative { -unsigned } else { unsigned }
    }
}

fn shift_entry(entry: Value, shift: impl Fn(DateTime<Utc>) -> Result<DateTime<Utc>>) -> Result<Value> {
    match entry {
        Value::Timestamp(date) => Ok(Value::Timestamp(shift(date)?)),
        Value::String(text) => {
            let date = DateTime::parse_from_rfc3339(&text)
                .map_err(|e| anyhow!("cannot parse date '{text}': {e}"))?
                .with_timezone(&Utc);
            Ok(Value::String(shift(date)?.to_rfc3339()))
        }
        other => bail!("cannot shift the non-date value '{}'", other.render()),
    }
}

pub struct DurationEngine {
    period: Period,
}

impl DurationEngine {
    pub fn new(text: &str) -> Result<Self> {
        Ok(Self {
            period: Period::parse(text)?,
        })
    }
}

impl MaskEngine for DurationEngine {
    fn mask(&mut self, entry: Value, _context: &[Record]) -> Result<Value> {
        shift_entry(entry, |date| self.period.shift(date))
    }
}

pub struct RandomDurationEngine {
    min_seconds: i64,
    max_seconds: i64,
    rng: StdRng,
}

impl RandomDurationEngine {
    pub fn new(min: &str, max: &str, seed: u64) -> Result<Self> {
        let min_seconds = Period::parse(min)?.approx_seconds();
        let max_seconds = Period::parse(max)?.approx_seconds();
        if min_seconds > max_seconds {
            bail!("randomDuration: min '{min}' is longer than max '{max}'");
        }
        Ok(Self {
            min_seconds,
            max_seconds,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

impl MaskEngine for RandomDurationEngine {
    fn mask(&mut self, entry: Value, _context: &[Record]) -> Result<Value> {
        let offset = self.rng.random_range(self.min_seconds..=self.max_seconds);
        shift_entry(entry, |date| {
            date.checked_add_signed(Duration::seconds(offset))
                .ok_or_else(|| anyhow!("date shift overflows the representable range"))
        })
    }
}

pub fn factory(rule: &MaskingRule, _seed: u64) -> Result<Option<Box<dyn MaskEngine>>> {
    match &rule.mask.duration {
        Some(text) => Ok(Some(Box::new(DurationEngine::new(text)?))),
        None => Ok(None),
    }
}

pub fn random_factory(rule: &MaskingRule, seed: u64) -> Result<Option<Box<dyn MaskEngine>>> {
    match &rule.mask.random_duration {
        Some(config) => Ok(Some(Box::new(RandomDurationEngine::new(
            &config.min,
            &config.max,
            seed,
        )?))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn periods_parse_their_date_and_time_parts() {
        assert_eq!(
            Period::parse("P1Y2M3DT4H5M6S").unwrap(),
            Period {
                negative: false,
                months: 14,
                days: 3,
                seconds: 4 * 3600 + 5 * 60 + 6,
            }
        );
        assert_eq!(
            Period::parse("-P2D").unwrap(),
            Period {
                negative: true,
                months: 0,
                days: 2,
                seconds: 0,
            }
        );
        assert!(Period::parse("2D").is_err());
        assert!(Period::parse("P").is_err());
        assert!(Period::parse("PT5").is_err());
    }

    #[test]
    fn masking_shifts_timestamps() {
        let mut engine = DurationEngine::new("-P2D").unwrap();
        let masked = engine
            .mask(Value::Timestamp(date("2020-01-10T12:00:00Z")), &[])
            .unwrap();
        assert_eq!(masked, Value::Timestamp(date("2020-01-08T12:00:00Z")));
    }

    #[test]
    fn masking_shifts_rfc3339_strings_in_place() {
        let mut engine = DurationEngine::new("PT1H").unwrap();
        let masked = engine
            .mask(Value::String("2020-01-10T12:00:00+00:00".into()), &[])
            .unwrap();
        assert_eq!(masked, Value::String("2020-01-10T13:00:00+00:00".into()));
    }

    #[test]
    fn non_date_values_are_a_masking_error() {
        let mut engine = DurationEngine::new("P1D").unwrap();
        assert!(engine.mask(Value::Integer(5), &[]).is_err());
    }

    #[test]
    fn random_duration_stays_between_the_periods() {
        let base = date("2020-06-15T00:00:00Z");
        let mut engine = RandomDurationEngine::new("-P10D", "-P1D", 9).unwrap();
        for _ in 0..30 {
            let Value::Timestamp(masked) =
                engine.mask(Value::Timestamp(base), &[]).unwrap()
            else {
                panic!("expected a timestamp");
            };
            assert!(masked < base);
            assert!(masked >= date("2020-06-05T00:00:00Z"));
        }
    }

    #[test]
    fn factories_decline_an_empty_spec() {
        assert!(factory(&MaskingRule::default(), 0).unwrap().is_none());
        assert!(random_factory(&MaskingRule::default(), 0).unwrap().is_none());
    }
}
