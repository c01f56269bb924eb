use crate::catalog::InstrumentSlot;
use crate::config::Settings;
use crate::ingest::error::UpstreamError;
use crate::ingest::http::{self, Pacer};
use crate::ingest::provider::PriceSource;
use crate::ingest::types::RawBar;
use anyhow::Result;
use chrono::NaiveDate;
use serde_json::Value;

pub const SOURCE: &str = "alphavantage";

/// `TIME_SERIES_DAILY` from Alpha Vantage. The free tier allows 5 calls per minute,
/// so calls are paced by `ALPHAVANTAGE_REQ_DELAY_MS`.
#[derive(Debug)]
pub struct AlphaVantageSource {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    pacer: Pacer,
}

impl AlphaVantageSource {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_alphavantage_api_key()?.to_string();
        Ok(Self {
            http: http::build_client(settings.http_timeout)?,
            base_url: settings.alphavantage_base_url.clone(),
            api_key,
            pacer: Pacer::new(settings.alphavantage_req_delay),
        })
    }
}

#[async_trait::async_trait]
impl PriceSource for AlphaVantageSource {
    fn source_name(&self) -> &'static str {
        SOURCE
    }

    fn upstream_symbol<'a>(&self, slot: &'a InstrumentSlot) -> Option<&'a str> {
        slot.alphavantage_symbol.as_deref()
    }

    async fn fetch_daily(&self, slot: &InstrumentSlot) -> Result<Vec<RawBar>, UpstreamError> {
        let symbol = self.upstream_symbol(slot).ok_or_else(|| {
            UpstreamError::invalid_symbol(SOURCE, format!("no symbol mapped for {}", slot.code))
        })?;

        self.pacer.wait().await;
        let url = format!("{}/query", self.base_url.trim_end_matches('/'));
        let body = http::get_json(
            &self.http,
            SOURCE,
            &url,
            &[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", "compact"),
                ("apikey", self.api_key.as_str()),
            ],
        )
        .await?;

        parse_time_series(&body)
    }
}

/// Alpha Vantage answers throttling and bad symbols with HTTP 200 and a message body.
pub fn parse_time_series(body: &Value) -> Result<Vec<RawBar>, UpstreamError> {
    if let Some(msg) = body.get("Error Message").and_then(Value::as_str) {
        return Err(UpstreamError::invalid_symbol(SOURCE, msg));
    }
    for key in ["Note", "Information"] {
        if let Some(msg) = body.get(key).and_then(Value::as_str) {
            return Err(UpstreamError::rate_limited(SOURCE, msg));
        }
    }

    let series = body
        .as_object()
        .and_then(|obj| {
            obj.iter()
                .find(|(k, _)| k.starts_with("Time Series"))
                .map(|(_, v)| v)
        })
        .and_then(Value::as_object)
        .ok_or_else(|| UpstreamError::parse(SOURCE, "response has no time series object"))?;

    let mut bars = Vec::with_capacity(series.len());
    for (date, fields) in series {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| UpstreamError::parse(SOURCE, format!("bad date {date:?}: {e}")))?;
        let num = |key: &str| fields.get(key).and_then(parse_num);
        bars.push(RawBar {
            date,
            open: num("1. open"),
            high: num("2. high"),
            low: num("3. low"),
            close: num("4. close"),
            volume: num("5. volume"),
        });
    }

    if bars.is_empty() {
        return Err(UpstreamError::no_data(SOURCE, "time series is empty"));
    }
    // Newest first on the wire.
    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

fn parse_num(v: &Value) -> Option<f64> {
    match v {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}
