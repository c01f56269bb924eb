use crate::domain::sentiment::{self, SentimentReading};
use crate::ingest::types::RawSentiment;
use crate::normalize::ValidationError;

/// Accepts 0..=100 inclusive. Out-of-range readings are rejected, never clamped.
pub fn validate_sentiment(value: i64) -> Result<u8, ValidationError> {
    if (0..=100).contains(&value) {
        Ok(value as u8)
    } else {
        Err(ValidationError::OutOfRange {
            field: "sentiment",
            value,
            min: 0,
            max: 100,
        })
    }
}

pub fn normalize_sentiment(
    raw: RawSentiment,
    source: &str,
) -> Result<SentimentReading, ValidationError> {
    let value = validate_sentiment(raw.value)?;
    let label = raw
        .label
        .as_deref()
        .map(sentiment::canonical_label)
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| sentiment::classify(value).to_string());

    Ok(SentimentReading {
        date: raw.date,
        value,
        label_zh: sentiment::label_zh(&label).map(str::to_string),
        label,
        source: source.to_string(),
    })
}
