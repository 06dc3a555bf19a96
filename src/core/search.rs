//! Keyword query shared by the global search fan-out
//!
//! A query matches a record when any of these hold:
//! - a text field contains the query, case-insensitively
//! - the query is a number equal to a numeric field
//! - the query is a calendar date and a date field falls on that day: a bare
//!   day stored as entered, or a timestamp inside that local day

use crate::core::entity::Record;
use crate::core::error::CrmError;
use crate::core::field::{DateValue, parse_day};
use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use regex::{Regex, RegexBuilder};
use serde_json::Value;

/// Parsed free-text search query
#[derive(Debug, Clone)]
pub struct SearchQuery {
    raw: String,
    escaped: String,
    pattern: Regex,
    number: Option<f64>,
    date: Option<NaiveDate>,
    day: Option<DayRange>,
}

/// Half-open UTC range `[start, end)` covering one local calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayRange {
    /// Bounds of `day` in the given timezone.
    pub fn local(day: NaiveDate, tz: Tz) -> Option<Self> {
        let start = local_midnight(day, tz)?;
        let end = local_midnight(day.checked_add_days(Days::new(1))?, tz)?;
        Some(Self { start, end })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

fn local_midnight(day: NaiveDate, tz: Tz) -> Option<DateTime<Utc>> {
    let naive = day.and_hms_opt(0, 0, 0)?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

impl SearchQuery {
    /// Parse a raw `q` parameter. Blank input is rejected.
    pub fn parse(raw: &str, tz: Tz) -> Result<Self, CrmError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(CrmError::invalid("q", "search query must not be empty"));
        }

        let escaped = regex::escape(raw);
        let pattern = RegexBuilder::new(&escaped)
            .case_insensitive(true)
            .build()
            .map_err(|e| CrmError::invalid("q", e.to_string()))?;

        let number = raw.parse::<f64>().ok().filter(|n| n.is_finite());
        let date = parse_day(raw);
        let day = date.and_then(|day| DayRange::local(day, tz));

        Ok(Self {
            raw: raw.to_string(),
            escaped,
            pattern,
            number,
            date,
            day,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Regex-escaped query, suitable for a database `$regex` clause
    pub fn escaped(&self) -> &str {
        &self.escaped
    }

    pub fn number(&self) -> Option<f64> {
        self.number
    }

    /// Calendar day named by the query
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn day(&self) -> Option<DayRange> {
        self.day
    }

    fn falls_on_day(&self, value: DateValue) -> bool {
        match value {
            DateValue::Day(day) => self.date == Some(day),
            DateValue::At(at) => self.day.is_some_and(|range| range.contains(at)),
        }
    }

    /// Check a serialized record of type `T` against the query.
    pub fn matches<T: Record>(&self, doc: &Value) -> bool {
        let text_hit = T::text_fields().iter().any(|field| {
            doc.get(*field)
                .and_then(Value::as_str)
                .is_some_and(|s| self.pattern.is_match(s))
        });
        if text_hit {
            return true;
        }

        if let Some(number) = self.number {
            let numeric_hit = T::numeric_fields().iter().any(|field| {
                doc.get(*field)
                    .and_then(Value::as_f64)
                    .is_some_and(|n| n == number)
            });
            if numeric_hit {
                return true;
            }
        }

        if self.date.is_some() {
            return T::date_fields().iter().any(|field| {
                doc.get(*field)
                    .and_then(Value::as_str)
                    .and_then(DateValue::parse)
                    .is_some_and(|value| self.falls_on_day(value))
            });
        }

        false
    }
}
