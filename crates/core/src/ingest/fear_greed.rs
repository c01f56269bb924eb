use crate::config::Settings;
use crate::ingest::error::UpstreamError;
use crate::ingest::http;
use crate::ingest::provider::SentimentSource;
use crate::ingest::types::RawSentiment;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;

pub const ALTERNATIVE_ME: &str = "alternative_me_fng";
pub const CNN: &str = "cnn_fear_greed";

/// Crypto fear & greed index from alternative.me.
#[derive(Debug, Clone)]
pub struct AlternativeMeSource {
    http: reqwest::Client,
    base_url: String,
}

impl AlternativeMeSource {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            http: http::build_client(settings.http_timeout)?,
            base_url: settings.fng_base_url.clone(),
        })
    }
}

#[async_trait::async_trait]
impl SentimentSource for AlternativeMeSource {
    fn source_name(&self) -> &'static str {
        ALTERNATIVE_ME
    }

    async fn fetch_latest(&self) -> Result<RawSentiment, UpstreamError> {
        let url = format!("{}/fng/", self.base_url.trim_end_matches('/'));
        let body = http::get_json(&self.http, ALTERNATIVE_ME, &url, &[("limit", "1")]).await?;
        parse_alternative_me(&body)
    }
}

pub fn parse_alternative_me(body: &Value) -> Result<RawSentiment, UpstreamError> {
    if let Some(err) = body
        .pointer("/metadata/error")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        return Err(UpstreamError::no_data(ALTERNATIVE_ME, err));
    }

    let entry = body
        .get("data")
        .and_then(Value::as_array)
        .and_then(|d| d.first())
        .ok_or_else(|| UpstreamError::no_data(ALTERNATIVE_ME, "response has no data entries"))?;

    let value = int_field(entry.get("value"))
        .ok_or_else(|| UpstreamError::parse(ALTERNATIVE_ME, "missing or non-numeric value"))?;
    let ts = int_field(entry.get("timestamp"))
        .ok_or_else(|| UpstreamError::parse(ALTERNATIVE_ME, "missing timestamp"))?;
    let date = DateTime::<Utc>::from_timestamp(ts, 0)
        .ok_or_else(|| UpstreamError::parse(ALTERNATIVE_ME, format!("invalid timestamp {ts}")))?
        .date_naive();

    Ok(RawSentiment {
        date,
        value,
        label: entry
            .get("value_classification")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

/// CNN's stock-market fear & greed gauge. Publishes a float score and a lowercase rating.
#[derive(Debug, Clone)]
pub struct CnnFearGreedSource {
    http: reqwest::Client,
    url: String,
}

impl CnnFearGreedSource {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            http: http::build_client(settings.http_timeout)?,
            url: settings.cnn_fng_url.clone(),
        })
    }
}

#[async_trait::async_trait]
impl SentimentSource for CnnFearGreedSource {
    fn source_name(&self) -> &'static str {
        CNN
    }

    async fn fetch_latest(&self) -> Result<RawSentiment, UpstreamError> {
        let body = http::get_json(&self.http, CNN, &self.url, &[]).await?;
        parse_cnn(&body)
    }
}

pub fn parse_cnn(body: &Value) -> Result<RawSentiment, UpstreamError> {
    let current = body
        .get("fear_and_greed")
        .ok_or_else(|| UpstreamError::parse(CNN, "response has no fear_and_greed section"))?;

    let score = current
        .get("score")
        .and_then(Value::as_f64)
        .ok_or_else(|| UpstreamError::parse(CNN, "missing score"))?;
    let ts = current
        .get("timestamp")
        .and_then(Value::as_str)
        .ok_or_else(|| UpstreamError::parse(CNN, "missing timestamp"))?;
    let date = DateTime::parse_from_rfc3339(ts)
        .map_err(|e| UpstreamError::parse(CNN, format!("bad timestamp {ts:?}: {e}")))?
        .with_timezone(&Utc)
        .date_naive();

    Ok(RawSentiment {
        date,
        value: score.round() as i64,
        label: current
            .get("rating")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

fn int_field(v: Option<&Value>) -> Option<i64> {
    match v? {
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::error::UpstreamErrorKind;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn parses_alternative_me_string_fields() {
        let body = json!({
            "name": "Fear and Greed Index",
            "data": [{
                "value": "27",
                "value_classification": "Fear",
                "timestamp": "1772409600",
                "time_until_update": "3600"
            }],
            "metadata": {"error": null}
        });
        let raw = parse_alternative_me(&body).unwrap();
        assert_eq!(raw.value, 27);
        assert_eq!(raw.label.as_deref(), Some("Fear"));
        assert_eq!(raw.date, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    }

    #[test]
    fn empty_alternative_me_data_is_no_data() {
        let body = json!({"data": [], "metadata": {"error": null}});
        assert_eq!(
            parse_alternative_me(&body).unwrap_err().kind,
            UpstreamErrorKind::NoData
        );
    }

    #[test]
    fn parses_cnn_score_and_rounds() {
        let body = json!({
            "fear_and_greed": {
                "score": 63.6,
                "rating": "greed",
                "timestamp": "2026-03-02T23:59:52+00:00",
                "previous_close": 61.2
            }
        });
        let raw = parse_cnn(&body).unwrap();
        assert_eq!(raw.value, 64);
        assert_eq!(raw.label.as_deref(), Some("greed"));
        assert_eq!(raw.date, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    }

    #[test]
    fn cnn_without_section_is_parse_error() {
        assert_eq!(
            parse_cnn(&json!({"other": 1})).unwrap_err().kind,
            UpstreamErrorKind::ParseError
        );
    }
}
