use crate::domain::rates::RateTerm;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// One daily bar as reported by any price adapter, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl RawBar {
    pub fn close_only(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close: Some(close),
            volume: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawSentiment {
    pub date: NaiveDate,
    /// Unvalidated; may lie outside 0..=100.
    pub value: i64,
    pub label: Option<String>,
}

/// A rate field exactly as published: numbers, numeric strings, or placeholders like "N.A.".
#[derive(Debug, Clone, PartialEq)]
pub enum RawRateField {
    Number(f64),
    Text(String),
    Null,
}

impl RawRateField {
    pub fn from_json(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number).unwrap_or(Self::Null),
            serde_json::Value::String(s) => Self::Text(s.clone()),
            _ => Self::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawRateRecord {
    pub as_of_date: NaiveDate,
    /// Terms the upstream did not publish at all are absent.
    pub fields: BTreeMap<RateTerm, RawRateField>,
}
