use crate::catalog::InstrumentGroup;
use crate::domain::rates::RateTerm;
use crate::domain::sentiment::SentimentReading;
use crate::domain::series::DailyPoint;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotStatus {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "ERROR")]
    Error,
}

/// Top-level artifact document. Every artifact carries a status and a generation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot<T> {
    pub status: SnapshotStatus,
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Snapshot<T> {
    pub fn ok(generated_at: DateTime<Utc>, body: T) -> Self {
        Self {
            status: SnapshotStatus::Ok,
            generated_at,
            body,
        }
    }
}

impl Snapshot<ErrorBody> {
    pub fn error(
        generated_at: DateTime<Utc>,
        metric: impl Into<String>,
        error: impl Into<String>,
        attempts: Vec<String>,
    ) -> Self {
        Self {
            status: SnapshotStatus::Error,
            generated_at,
            body: ErrorBody {
                metric: metric.into(),
                error: error.into(),
                attempts,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub metric: String,
    pub error: String,
    /// One line per adapter tried, newest last.
    pub attempts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistoryBody {
    pub window: usize,
    pub series: BTreeMap<String, SeriesEntry>,
    pub errors: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesEntry {
    pub name: String,
    pub group: InstrumentGroup,
    pub source: String,
    pub upstream_symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substituted_by: Option<String>,
    pub stale: bool,
    pub points: Vec<DailyPoint>,
}

impl SeriesEntry {
    pub fn latest(&self) -> Option<&DailyPoint> {
        self.points.last()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentBody {
    #[serde(flatten)]
    pub reading: SentimentReading,
    pub stale: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateBody {
    pub as_of_date: NaiveDate,
    pub rates: BTreeMap<RateTerm, f64>,
    pub source: String,
    pub stale: bool,
    pub age_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreadthBody {
    pub date: NaiveDate,
    pub advancers: usize,
    pub decliners: usize,
    pub neutral: usize,
    pub total_symbols: usize,
    pub threshold_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisBody {
    pub date: String,
    pub model: String,
    pub reference_symbol: String,
    pub trend: String,
    pub analysis: String,
    pub prediction_7_day: String,
    pub confidence: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn error_snapshot_carries_marker_and_message() {
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 1, 0, 0).unwrap();
        let snap = Snapshot::error(at, "sentiment", "all sources failed", vec!["a: x".into()]);
        let v = serde_json::to_value(&snap).unwrap();
        assert_eq!(v["status"], "ERROR");
        assert_eq!(v["metric"], "sentiment");
        assert_eq!(v["error"], "all sources failed");
        assert_eq!(v["generated_at"], "2026-03-02T01:00:00Z");
    }
}
