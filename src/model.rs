//! Readings, snapshots and the user settings record.
//!
//! Field names follow the upstream JSON document so a snapshot can be cached and
//! pushed to the display surface exactly as it was received.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FetchError;

/// Which upstream resource to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    #[default]
    Stock,
    Crypto,
}

impl AssetClass {
    pub const ALL: [AssetClass; 2] = [AssetClass::Stock, AssetClass::Crypto];

    /// Strict parse, used by the settings setter.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "stock" => Some(AssetClass::Stock),
            "crypto" => Some(AssetClass::Crypto),
            _ => None,
        }
    }

    /// Unknown selectors fail closed to `Stock`.
    pub fn parse_or_default(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssetClass::Stock => "stock",
            AssetClass::Crypto => "crypto",
        }
    }

    /// Name shown in the tray tooltip.
    pub fn display_name(self) -> &'static str {
        match self {
            AssetClass::Stock => "Stock Market",
            AssetClass::Crypto => "Crypto",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ko,
}

impl Language {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "en" => Some(Language::En),
            "ko" => Some(Language::Ko),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ko => "ko",
        }
    }
}

/// One sentiment value with its label and time.
///
/// Only constructible through [`Reading::new`], which enforces the range and
/// label rules; the serde impls go through the same check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ReadingRepr", into = "ReadingRepr")]
pub struct Reading {
    value: f64,
    status: String,
    timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct ReadingRepr {
    value: f64,
    status: String,
    timestamp: DateTime<Utc>,
}

impl TryFrom<ReadingRepr> for Reading {
    type Error = FetchError;

    fn try_from(r: ReadingRepr) -> Result<Self, Self::Error> {
        Reading::new(r.value, r.status, r.timestamp)
    }
}

impl From<Reading> for ReadingRepr {
    fn from(r: Reading) -> Self {
        ReadingRepr {
            value: r.value,
            status: r.status,
            timestamp: r.timestamp,
        }
    }
}

impl Reading {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 100.0;

    pub fn new(
        value: f64,
        status: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, FetchError> {
        if !value.is_finite() || !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(FetchError::validation(format!(
                "value {value} outside [0, 100]"
            )));
        }
        let status = status.into();
        if status.trim().is_empty() {
            return Err(FetchError::validation("status must be a non-empty string"));
        }
        Ok(Self {
            value,
            status,
            timestamp,
        })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Integer-rounded value, as shown in the tray and gauge label.
    pub fn rounded(&self) -> i64 {
        self.value.round() as i64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Historical {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<Reading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_week_ago: Option<Reading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_month_ago: Option<Reading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_year_ago: Option<Reading>,
}

/// Periods in display order, paired with their i18n key.
pub const HISTORICAL_PERIODS: [(&str, &str); 4] = [
    ("previous_close", "previousClose"),
    ("one_week_ago", "oneWeekAgo"),
    ("one_month_ago", "oneMonthAgo"),
    ("one_year_ago", "oneYearAgo"),
];

impl Historical {
    pub fn get(&self, period: &str) -> Option<&Reading> {
        match period {
            "previous_close" => self.previous_close.as_ref(),
            "one_week_ago" => self.one_week_ago.as_ref(),
            "one_month_ago" => self.one_month_ago.as_ref(),
            "one_year_ago" => self.one_year_ago.as_ref(),
            _ => None,
        }
    }

    pub(crate) fn slot_mut(&mut self, period: &str) -> Option<&mut Option<Reading>> {
        match period {
            "previous_close" => Some(&mut self.previous_close),
            "one_week_ago" => Some(&mut self.one_week_ago),
            "one_month_ago" => Some(&mut self.one_month_ago),
            "one_year_ago" => Some(&mut self.one_year_ago),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSnapshot {
    pub current: Reading,
    #[serde(default)]
    pub historical: Historical,
}

/// User preferences. Serialized with the keys the display surface uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub launch_at_login: bool,
    pub index_type: AssetClass,
    pub language: Language,
}
