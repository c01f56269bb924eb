//! Validation and normalization of raw adapter output into domain records.

pub mod rates;
pub mod sentiment;
pub mod series;

use std::fmt;

pub use rates::{select_freshest_valid_record, validate_rate_record};
pub use sentiment::{normalize_sentiment, validate_sentiment};
pub use series::{
    compute_change_percent, compute_volume_change_percent, normalize_bars, truncate_window,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    NoValidRecord {
        scanned: usize,
    },
    EmptySeries {
        code: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{field} out of range: {value} not in {min}..={max}"),
            Self::NoValidRecord { scanned } => {
                write!(f, "no valid record among {scanned} scanned")
            }
            Self::EmptySeries { code } => write!(f, "series {code} has no usable points"),
        }
    }
}

impl std::error::Error for ValidationError {}

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
