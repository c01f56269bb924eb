use crate::domain::series::{DailyPoint, MetricSeries};
use crate::ingest::types::RawBar;
use crate::normalize::{round2, ValidationError};
use std::collections::BTreeMap;

/// Percentage change against the previous close, rounded to 2dp.
/// `None` when there is no previous close or it is zero.
pub fn compute_change_percent(current: f64, previous: Option<f64>) -> Option<f64> {
    let previous = previous?;
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return None;
    }
    Some(round2((current - previous) / previous * 100.0))
}

/// Same rule as [`compute_change_percent`], and also `None` when the current volume is 0.
pub fn compute_volume_change_percent(current: Option<u64>, previous: Option<u64>) -> Option<f64> {
    let current = current?;
    if current == 0 {
        return None;
    }
    compute_change_percent(current as f64, previous.map(|p| p as f64))
}

/// Keeps the most recent `n` points, then drops leading points without a change metric.
/// The result never exceeds `n` points and re-truncating it is a no-op.
pub fn truncate_window(points: &[DailyPoint], n: usize) -> Vec<DailyPoint> {
    let start = points.len().saturating_sub(n);
    let window = &points[start..];
    let first_valid = window
        .iter()
        .position(|p| p.change_percent.is_some())
        .unwrap_or(window.len());
    window[first_valid..].to_vec()
}

/// Turns raw bars into a validated series: drops unusable closes, orders by date
/// (last duplicate wins), derives change metrics over the full history, then truncates.
pub fn normalize_bars(
    code: &str,
    bars: Vec<RawBar>,
    window: usize,
) -> Result<MetricSeries, ValidationError> {
    let mut by_date = BTreeMap::new();
    let mut dropped = 0usize;
    for bar in bars {
        match bar.close {
            Some(close) if close.is_finite() && close >= 0.0 => {
                by_date.insert(bar.date, (bar, close));
            }
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        tracing::debug!(code, dropped, "dropped bars without a usable close");
    }

    let mut points: Vec<DailyPoint> = Vec::with_capacity(by_date.len());
    for (date, (bar, close)) in by_date {
        let volume = bar
            .volume
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.round() as u64);
        let prev = points.last();
        let change_percent = compute_change_percent(close, prev.map(|p| p.close));
        let volume_change_percent =
            compute_volume_change_percent(volume, prev.and_then(|p| p.volume));

        points.push(DailyPoint {
            date,
            open: bar.open.filter(|v| v.is_finite()),
            high: bar.high.filter(|v| v.is_finite()),
            low: bar.low.filter(|v| v.is_finite()),
            close,
            volume,
            change_percent,
            volume_change_percent,
        });
    }

    let points = truncate_window(&points, window);
    if points.is_empty() {
        return Err(ValidationError::EmptySeries {
            code: code.to_string(),
        });
    }

    MetricSeries::new(code, points).map_err(|_| ValidationError::EmptySeries {
        code: code.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn day(i: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + Duration::days(i)
    }

    fn bars_from_closes(closes: &[f64]) -> Vec<RawBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| RawBar::close_only(day(i as i64), *c))
            .collect()
    }

    #[test]
    fn change_percent_rules() {
        assert_eq!(compute_change_percent(101.0, None), None);
        assert_eq!(compute_change_percent(101.0, Some(0.0)), None);
        assert_eq!(compute_change_percent(101.0, Some(100.0)), Some(1.0));
        assert_eq!(compute_change_percent(102.0, Some(101.0)), Some(0.99));
        assert_eq!(compute_change_percent(90.0, Some(100.0)), Some(-10.0));
    }

    #[test]
    fn volume_change_is_none_from_zero_current_or_baseline() {
        assert_eq!(compute_volume_change_percent(Some(0), Some(100)), None);
        assert_eq!(compute_volume_change_percent(Some(100), Some(0)), None);
        assert_eq!(compute_volume_change_percent(Some(150), Some(100)), Some(50.0));
        assert_eq!(compute_volume_change_percent(None, Some(100)), None);
    }

    #[test]
    fn change_is_series_adjacent_not_calendar_adjacent() {
        // Gap over a weekend: the change still references the previous bar.
        let bars = vec![
            RawBar::close_only(day(0), 100.0),
            RawBar::close_only(day(3), 110.0),
        ];
        let series = normalize_bars("SPY", bars, 30).unwrap();
        assert_eq!(series.points.len(), 1);
        assert_eq!(series.points[0].change_percent, Some(10.0));
    }

    #[test]
    fn every_point_matches_the_formula() {
        let closes = [50.0, 52.5, 0.0, 10.0, 9.0, 9.9];
        let series = normalize_bars("X", bars_from_closes(&closes), 100).unwrap();
        // First point has no reference and is dropped from the window.
        assert_eq!(series.points.len(), closes.len() - 1);
        for (i, p) in series.points.iter().enumerate() {
            let (cur, prev) = (closes[i + 1], closes[i]);
            let expected = if prev == 0.0 {
                None
            } else {
                Some(((cur - prev) / prev * 100.0 * 100.0).round() / 100.0)
            };
            assert_eq!(p.change_percent, expected, "index {}", i + 1);
        }
    }

    #[test]
    fn thirty_one_flat_closes_yield_thirty_points() {
        let closes: Vec<f64> = (100..=130).map(f64::from).collect();
        let series = normalize_bars("SPY", bars_from_closes(&closes), 30).unwrap();
        assert_eq!(series.points.len(), 30);
        let oldest = &series.points[0];
        assert_eq!(oldest.close, 101.0);
        let oldest_change = oldest.change_percent.unwrap();
        assert!((oldest_change - 0.99).abs() <= 0.011, "{oldest_change}");
        assert_eq!(series.points[1].change_percent, Some(0.99));
        assert_eq!(series.latest().unwrap().close, 130.0);
    }

    #[test]
    fn truncate_is_bounded_and_idempotent() {
        let closes: Vec<f64> = (1..=80).map(|i| if i % 7 == 0 { 0.0 } else { i as f64 }).collect();
        let full = normalize_bars("X", bars_from_closes(&closes), 1000).unwrap().points;

        for n in [1usize, 5, 30, 100] {
            let once = truncate_window(&full, n);
            assert!(once.len() <= n);
            assert_eq!(truncate_window(&once, n), once);
        }
    }

    #[test]
    fn truncate_drops_leading_points_without_change() {
        let closes = [0.0, 5.0, 6.0];
        let mut pts: Vec<DailyPoint> = Vec::new();
        for (i, c) in closes.iter().enumerate() {
            let mut p = DailyPoint::new(day(i as i64), *c);
            p.change_percent = compute_change_percent(*c, pts.last().map(|q| q.close));
            pts.push(p);
        }
        let out = truncate_window(&pts, 3);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].close, 6.0);
    }

    #[test]
    fn drops_bad_closes_sorts_and_dedups() {
        let bars = vec![
            RawBar::close_only(day(2), 12.0),
            RawBar::close_only(day(0), 10.0),
            RawBar {
                close: None,
                ..RawBar::close_only(day(1), 0.0)
            },
            RawBar::close_only(day(2), 11.0),
            RawBar::close_only(day(3), f64::NAN),
        ];
        let series = normalize_bars("X", bars, 30).unwrap();
        assert_eq!(series.points.len(), 1);
        assert_eq!(series.points[0].date, day(2));
        assert_eq!(series.points[0].close, 11.0);
        assert_eq!(series.points[0].change_percent, Some(10.0));
    }

    #[test]
    fn single_bar_is_empty_series() {
        let err = normalize_bars("X", bars_from_closes(&[10.0]), 30).unwrap_err();
        assert_eq!(
            err,
            ValidationError::EmptySeries {
                code: "X".to_string()
            }
        );
    }
}
