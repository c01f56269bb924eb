use crate::catalog::InstrumentSlot;
use crate::config::Settings;
use crate::ingest::error::UpstreamError;
use crate::ingest::http::{self, Pacer};
use crate::ingest::provider::PriceSource;
use crate::ingest::types::RawBar;
use anyhow::Result;
use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;

pub const SOURCE: &str = "yahoo_chart";

/// Daily bars from the Yahoo Finance chart endpoint.
#[derive(Debug)]
pub struct YahooChartSource {
    http: reqwest::Client,
    base_url: String,
    range: String,
    pacer: Pacer,
}

impl YahooChartSource {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            http: http::build_client(settings.http_timeout)?,
            base_url: settings.yahoo_base_url.clone(),
            range: settings.price_lookback_range.clone(),
            pacer: Pacer::new(settings.yahoo_req_delay),
        })
    }

    fn url(&self, symbol: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}",
            self.base_url.trim_end_matches('/'),
            symbol
        )
    }
}

#[async_trait::async_trait]
impl PriceSource for YahooChartSource {
    fn source_name(&self) -> &'static str {
        SOURCE
    }

    fn upstream_symbol<'a>(&self, slot: &'a InstrumentSlot) -> Option<&'a str> {
        slot.yahoo_symbol.as_deref()
    }

    async fn fetch_daily(&self, slot: &InstrumentSlot) -> Result<Vec<RawBar>, UpstreamError> {
        let symbol = self.upstream_symbol(slot).ok_or_else(|| {
            UpstreamError::invalid_symbol(SOURCE, format!("no symbol mapped for {}", slot.code))
        })?;

        self.pacer.wait().await;
        let body = http::get_json(
            &self.http,
            SOURCE,
            &self.url(symbol),
            &[("range", self.range.as_str()), ("interval", "1d")],
        )
        .await?;

        parse_chart(&body)
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartData,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds; bars are stamped at the local session open.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

pub fn parse_chart(body: &Value) -> Result<Vec<RawBar>, UpstreamError> {
    let parsed = ChartResponse::deserialize(body)
        .map_err(|e| UpstreamError::parse(SOURCE, format!("unexpected chart shape: {e}")))?;

    if let Some(err) = parsed.chart.error.filter(|e| !e.is_null()) {
        let description = err
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("unknown chart error");
        return Err(UpstreamError::invalid_symbol(SOURCE, description));
    }

    let result = parsed
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| UpstreamError::no_data(SOURCE, "chart result is empty"))?;

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let at = |v: &Vec<Option<f64>>, i: usize| v.get(i).copied().flatten();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let Some(local) = ts
            .checked_add(result.meta.gmtoffset)
            .and_then(|t| DateTime::from_timestamp(t, 0))
        else {
            return Err(UpstreamError::parse(
                SOURCE,
                format!("invalid timestamp {ts} (gmtoffset {})", result.meta.gmtoffset),
            ));
        };
        bars.push(RawBar {
            date: local.date_naive(),
            open: at(&quote.open, i),
            high: at(&quote.high, i),
            low: at(&quote.low, i),
            close: at(&quote.close, i),
            volume: at(&quote.volume, i),
        });
    }

    if bars.is_empty() {
        return Err(UpstreamError::no_data(SOURCE, "chart has no bars"));
    }
    Ok(bars)
}
