//! Field value types, format checks and lenient payload parsing

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::OnceLock;

/// A polymorphic field value read out of a serialized record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Float(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Null,
}

impl FieldValue {
    /// Read a field out of a JSON document.
    ///
    /// RFC 3339 timestamps and stored `YYYY-MM-DD` days come back as
    /// `DateTime`, a day at midnight UTC, so date columns sort together.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(s) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                    return FieldValue::DateTime(dt.with_timezone(&Utc));
                }
                match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    Ok(day) => FieldValue::DateTime(day.and_time(chrono::NaiveTime::MIN).and_utc()),
                    Err(_) => FieldValue::String(s.clone()),
                }
            }
            Value::Number(n) => n.as_f64().map(FieldValue::Float).unwrap_or(FieldValue::Null),
            Value::Bool(b) => FieldValue::Boolean(*b),
            _ => FieldValue::Null,
        }
    }

    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as a float if possible
    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get the value as a timestamp if possible
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Ordering used by list sorting. Nulls sort first, mismatched kinds compare equal.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::String(a), FieldValue::String(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (FieldValue::Float(a), FieldValue::Float(b)) => a.total_cmp(b),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a.cmp(b),
            (FieldValue::DateTime(a), FieldValue::DateTime(b)) => a.cmp(b),
            (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
            (FieldValue::Null, _) => Ordering::Less,
            (_, FieldValue::Null) => Ordering::Greater,
            _ => Ordering::Equal,
        }
    }
}

/// Whether `input` looks like a deliverable email address
pub fn is_email(input: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok())
        .as_ref()
        .is_some_and(|regex| regex.is_match(input))
}

/// Parse a calendar date in one of the formats the dashboard forms submit.
pub fn parse_day(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
}

/// A business date as the user entered it.
///
/// A bare calendar day stays a day and is never shifted by a timezone; a
/// full timestamp is an instant. Days serialize as `YYYY-MM-DD`, instants as
/// RFC 3339 UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateValue {
    Day(NaiveDate),
    At(DateTime<Utc>),
}

impl DateValue {
    /// RFC 3339 timestamp or a calendar day in one of the form formats.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Some(DateValue::At(dt.with_timezone(&Utc)));
        }
        parse_day(input).map(DateValue::Day)
    }

    /// Calendar day in `tz`; a bare day is that day everywhere.
    pub fn local_day(&self, tz: Tz) -> NaiveDate {
        match self {
            DateValue::Day(day) => *day,
            DateValue::At(at) => at.with_timezone(&tz).date_naive(),
        }
    }

    /// Instant of the value, reading a bare day as local midnight in `tz`.
    pub fn instant(&self, tz: Tz) -> DateTime<Utc> {
        match self {
            DateValue::At(at) => *at,
            DateValue::Day(day) => {
                let midnight = day.and_time(chrono::NaiveTime::MIN);
                tz.from_local_datetime(&midnight)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|| midnight.and_utc())
            }
        }
    }
}

impl From<DateTime<Utc>> for DateValue {
    fn from(at: DateTime<Utc>) -> Self {
        DateValue::At(at)
    }
}

impl From<NaiveDate> for DateValue {
    fn from(day: NaiveDate) -> Self {
        DateValue::Day(day)
    }
}

impl std::fmt::Display for DateValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateValue::Day(day) => write!(f, "{}", day.format("%Y-%m-%d")),
            DateValue::At(at) => f.write_str(&at.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

impl Serialize for DateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateValue::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("not a date: {}", raw)))
    }
}

/// Lenient deserializers for form payloads.
///
/// Dashboard forms post numbers as strings and leave dates blank; these keep
/// a malformed field from rejecting the whole record.
pub mod lenient {
    use super::*;

    /// Number or numeric string. Anything unparseable is 0.
    pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(number_from_value(&value))
    }

    /// `bool` or `"true"` / `"false"`; anything else is false.
    pub fn boolean<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Bool(b) => b,
            Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            _ => false,
        })
    }

    /// Business date: RFC 3339 timestamp or a bare calendar day kept as a
    /// day. Blank or unparseable input is `None`.
    pub fn date<'de, D>(deserializer: D) -> Result<Option<DateValue>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) => DateValue::parse(&s),
            _ => None,
        })
    }

    /// System timestamp. A bare day reads as midnight UTC.
    pub fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) => datetime_from_str(&s),
            _ => None,
        })
    }

    pub(crate) fn number_from_value(value: &Value) -> f64 {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed.filter(|f| f.is_finite()).unwrap_or(0.0)
    }

    pub(crate) fn datetime_from_str(input: &str) -> Option<DateTime<Utc>> {
        DateValue::parse(input).map(|value| value.instant(chrono_tz::UTC))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "lenient::number")]
        amount: f64,
        #[serde(default, deserialize_with = "lenient::date")]
        date: Option<DateValue>,
        #[serde(default, deserialize_with = "lenient::timestamp")]
        seen: Option<DateTime<Utc>>,
        #[serde(default, deserialize_with = "lenient::boolean")]
        active: bool,
    }

    #[test]
    fn test_lenient_number_accepts_numeric_strings() {
        let form: Form = serde_json::from_value(json!({"amount": "1250.5"})).unwrap();
        assert_eq!(form.amount, 1250.5);
    }

    #[test]
    fn test_lenient_number_defaults_garbage_to_zero() {
        let form: Form = serde_json::from_value(json!({"amount": "abc"})).unwrap();
        assert_eq!(form.amount, 0.0);

        let form: Form = serde_json::from_value(json!({"amount": null})).unwrap();
        assert_eq!(form.amount, 0.0);

        let form: Form = serde_json::from_value(json!({})).unwrap();
        assert_eq!(form.amount, 0.0);
    }

    #[test]
    fn test_lenient_date_formats() {
        let form: Form = serde_json::from_value(json!({"date": "2025-03-14"})).unwrap();
        assert_eq!(
            form.date,
            Some(DateValue::Day(NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()))
        );

        let form: Form =
            serde_json::from_value(json!({"date": "2025-03-14T10:15:00+05:30"})).unwrap();
        assert_eq!(form.date.unwrap().to_string(), "2025-03-14T04:45:00Z");

        let form: Form = serde_json::from_value(json!({"date": ""})).unwrap();
        assert!(form.date.is_none());

        let form: Form = serde_json::from_value(json!({"seen": "2025-03-14"})).unwrap();
        assert_eq!(form.seen.unwrap().to_rfc3339(), "2025-03-14T00:00:00+00:00");
    }

    #[test]
    fn test_bare_day_keeps_its_day_in_every_timezone() {
        let due = DateValue::parse("2025-03-13").unwrap();
        let new_york = chrono_tz::America::New_York;
        let day = NaiveDate::from_ymd_opt(2025, 3, 13).unwrap();

        assert_eq!(due.local_day(new_york), day);
        assert_eq!(due.local_day(chrono_tz::Asia::Kolkata), day);
        assert_eq!(due.local_day(chrono_tz::Pacific::Kiritimati), day);
        assert_eq!(due.instant(new_york).to_rfc3339(), "2025-03-13T04:00:00+00:00");
        assert_eq!(serde_json::to_value(due).unwrap(), json!("2025-03-13"));
    }

    #[test]
    fn test_timestamp_local_day_follows_timezone() {
        let at = DateValue::parse("2025-03-13T02:00:00Z").unwrap();
        assert_eq!(
            at.local_day(chrono_tz::America::New_York),
            NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()
        );
        assert_eq!(serde_json::to_value(at).unwrap(), json!("2025-03-13T02:00:00Z"));
    }

    #[test]
    fn test_lenient_boolean() {
        let form: Form = serde_json::from_value(json!({"active": "true"})).unwrap();
        assert!(form.active);
        let form: Form = serde_json::from_value(json!({"active": "nope"})).unwrap();
        assert!(!form.active);
    }

    #[test]
    fn test_field_value_from_json() {
        assert_eq!(
            FieldValue::from_json(&json!("Acme")),
            FieldValue::String("Acme".to_string())
        );
        assert_eq!(FieldValue::from_json(&json!(12)), FieldValue::Float(12.0));
        assert!(FieldValue::from_json(&json!("2025-01-01T00:00:00Z"))
            .as_datetime()
            .is_some());
        assert!(FieldValue::from_json(&json!(null)).is_null());

        let day = FieldValue::from_json(&json!("2025-03-13"));
        let later = FieldValue::from_json(&json!("2025-03-13T09:00:00Z"));
        assert_eq!(day.compare(&later), Ordering::Less);
        assert!(FieldValue::from_json(&json!("13/03/2025")).as_string().is_some());
    }

    #[test]
    fn test_compare_strings_case_insensitive() {
        let a = FieldValue::String("alpha".to_string());
        let b = FieldValue::String("Beta".to_string());
        assert_eq!(a.compare(&b), Ordering::Less);
    }

    #[test]
    fn test_email_check() {
        assert!(is_email("test@example.com"));
        assert!(!is_email("invalid-email"));
        assert!(!is_email("half@"));
    }

    #[test]
    fn test_parse_day_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 7, 4).unwrap();
        assert_eq!(parse_day("2025-07-04"), Some(expected));
        assert_eq!(parse_day("04/07/2025"), Some(expected));
        assert_eq!(parse_day("acme"), None);
    }
}
