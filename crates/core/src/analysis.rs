//! Artifacts derived from the price history of the same run.

use crate::catalog::InstrumentSlot;
use crate::domain::snapshot::{AnalysisBody, BreadthBody, SeriesEntry};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

/// A latest move within +/- this many percent counts as neutral.
pub const BREADTH_THRESHOLD_PERCENT: f64 = 0.1;

pub const TREND_LOOKBACK: usize = 5;
pub const TREND_REFERENCE: &str = "SPY";
const MODEL_NAME: &str = "Rule-Based Analysis Engine";

pub fn compute_breadth(
    slots: &[InstrumentSlot],
    series: &BTreeMap<String, SeriesEntry>,
    date: NaiveDate,
) -> BreadthBody {
    let eligible: Vec<&InstrumentSlot> = slots.iter().filter(|s| s.breadth_eligible()).collect();

    let (mut advancers, mut decliners, mut neutral) = (0, 0, 0);
    for slot in &eligible {
        let Some(change) = series
            .get(&slot.code)
            .and_then(SeriesEntry::latest)
            .and_then(|p| p.change_percent)
        else {
            continue;
        };
        if change > BREADTH_THRESHOLD_PERCENT {
            advancers += 1;
        } else if change < -BREADTH_THRESHOLD_PERCENT {
            decliners += 1;
        } else {
            neutral += 1;
        }
    }

    BreadthBody {
        date,
        advancers,
        decliners,
        neutral,
        total_symbols: eligible.len(),
        threshold_percent: BREADTH_THRESHOLD_PERCENT,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl Trend {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bullish => "Bullish",
            Self::Bearish => "Bearish",
            Self::Neutral => "Neutral",
        }
    }

    const fn prediction(self) -> &'static str {
        match self {
            Self::Bullish => "Slightly Bullish",
            Self::Bearish => "Slightly Bearish",
            Self::Neutral => "Neutral",
        }
    }
}

/// Direction of the last `lookback` closes: last versus first.
pub fn trend_of(closes: &[f64], lookback: usize) -> Option<Trend> {
    let tail = &closes[closes.len().saturating_sub(lookback)..];
    let (first, last) = (tail.first()?, tail.last()?);
    if tail.len() < 2 {
        return None;
    }
    Some(if last > first {
        Trend::Bullish
    } else if last < first {
        Trend::Bearish
    } else {
        Trend::Neutral
    })
}

/// Rule-based short-term outlook for the reference instrument.
/// Returns the reason as `Err` when there is not enough data.
pub fn analyze_trend(
    series: &BTreeMap<String, SeriesEntry>,
    now: DateTime<Utc>,
) -> Result<AnalysisBody, String> {
    let unavailable = || format!("Market data ({TREND_REFERENCE}) is unavailable for analysis.");

    let entry = series.get(TREND_REFERENCE).ok_or_else(unavailable)?;
    let closes: Vec<f64> = entry.points.iter().map(|p| p.close).collect();
    let trend = trend_of(&closes, TREND_LOOKBACK).ok_or_else(unavailable)?;

    let analysis = match trend {
        Trend::Bullish => format!(
            "{} ({TREND_REFERENCE}) has shown a positive trend over the last {TREND_LOOKBACK} trading days, suggesting strong short-term momentum.",
            entry.name
        ),
        Trend::Bearish => format!(
            "{} ({TREND_REFERENCE}) has declined over the last {TREND_LOOKBACK} trading days, indicating potential short-term weakness.",
            entry.name
        ),
        Trend::Neutral => format!(
            "{} ({TREND_REFERENCE}) has been flat over the last {TREND_LOOKBACK} trading days, suggesting a consolidation phase.",
            entry.name
        ),
    };

    Ok(AnalysisBody {
        date: now.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        model: MODEL_NAME.to_string(),
        reference_symbol: TREND_REFERENCE.to_string(),
        trend: trend.as_str().to_string(),
        analysis,
        prediction_7_day: trend.prediction().to_string(),
        confidence: "Medium (Rule-Based)".to_string(),
    })
}
