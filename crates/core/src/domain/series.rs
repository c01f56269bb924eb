use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<u64>,
    /// Null for the first point of a series and whenever the previous close is 0.
    pub change_percent: Option<f64>,
    pub volume_change_percent: Option<f64>,
}

impl DailyPoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
            change_percent: None,
            volume_change_percent: None,
        }
    }
}

/// One tracked instrument and its daily points, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub code: String,
    pub points: Vec<DailyPoint>,
}

impl MetricSeries {
    pub fn new(code: impl Into<String>, points: Vec<DailyPoint>) -> anyhow::Result<Self> {
        let code = code.into();
        anyhow::ensure!(
            dates_strictly_increasing(&points),
            "series {code}: dates must be strictly increasing"
        );
        Ok(Self { code, points })
    }

    pub fn latest(&self) -> Option<&DailyPoint> {
        self.points.last()
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.latest().map(|p| p.date)
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.close)
    }
}

pub fn dates_strictly_increasing(points: &[DailyPoint]) -> bool {
    points.windows(2).all(|w| w[0].date < w[1].date)
}
