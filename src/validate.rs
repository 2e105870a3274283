//! Structural validation of upstream payloads.
//!
//! The body is inspected as a generic JSON value first so that every rule can
//! report a precise reason. Any violation rejects the whole snapshot.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::error::FetchError;
use crate::model::{Historical, Reading, SentimentSnapshot, HISTORICAL_PERIODS};

/// Parse and validate a raw response body.
pub fn parse_snapshot(body: &str, captured_at: DateTime<Utc>) -> Result<SentimentSnapshot, FetchError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(FetchError::validation("empty response body"));
    }
    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| FetchError::validation(format!("body is not valid JSON: {e}")))?;
    validate_snapshot(&value, captured_at)
}

/// Validate an already-decoded document.
pub fn validate_snapshot(doc: &Value, captured_at: DateTime<Utc>) -> Result<SentimentSnapshot, FetchError> {
    let root = doc
        .as_object()
        .ok_or_else(|| FetchError::validation("top-level must be an object"))?;

    let current = match root.get("current") {
        Some(Value::Object(m)) => reading_from(m, "current", captured_at)?,
        Some(_) => return Err(FetchError::validation("current must be an object")),
        None => return Err(FetchError::validation("missing current")),
    };

    let mut historical = Historical::default();
    match root.get("historical") {
        None | Some(Value::Null) => {}
        Some(Value::Object(h)) => {
            for (period, _) in HISTORICAL_PERIODS {
                let reading = match h.get(period) {
                    None | Some(Value::Null) => None,
                    Some(Value::Object(m)) => Some(reading_from(
                        m,
                        &format!("historical.{period}"),
                        captured_at,
                    )?),
                    Some(_) => {
                        return Err(FetchError::validation(format!(
                            "historical.{period} must be an object"
                        )))
                    }
                };
                if let Some(slot) = historical.slot_mut(period) {
                    *slot = reading;
                }
            }
        }
        Some(_) => return Err(FetchError::validation("historical must be an object")),
    }

    Ok(SentimentSnapshot {
        current,
        historical,
    })
}

fn reading_from(
    m: &Map<String, Value>,
    path: &str,
    captured_at: DateTime<Utc>,
) -> Result<Reading, FetchError> {
    let value = m
        .get("value")
        .and_then(Value::as_f64)
        .ok_or_else(|| FetchError::validation(format!("{path}.value must be a number")))?;

    let status = match m.get("status") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        _ => {
            return Err(FetchError::validation(format!(
                "{path}.status must be a non-empty string"
            )))
        }
    };

    let timestamp = match m.get("timestamp") {
        None | Some(Value::Null) => captured_at,
        Some(Value::String(s)) => parse_timestamp(s).ok_or_else(|| {
            FetchError::validation(format!("{path}.timestamp is not a valid date: {s}"))
        })?,
        Some(_) => {
            return Err(FetchError::validation(format!(
                "{path}.timestamp must be a string"
            )))
        }
    };

    Reading::new(value, status, timestamp).map_err(|e| match e {
        FetchError::Validation { reason } => FetchError::validation(format!("{path}: {reason}")),
        other => other,
    })
}

/// Accepts RFC 3339, or a naive ISO-8601 datetime which is taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}
