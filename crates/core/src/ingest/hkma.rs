use crate::config::Settings;
use crate::domain::rates::RateTerm;
use crate::ingest::error::UpstreamError;
use crate::ingest::http;
use crate::ingest::provider::RateSource;
use crate::ingest::types::{RawRateField, RawRateRecord};
use anyhow::Result;
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::BTreeMap;

const PAGE_SIZE: &str = "10";

/// One HKMA open-API dataset that publishes HIBOR by term.
#[derive(Debug, Clone, Copy)]
pub struct HkmaDataset {
    pub source_name: &'static str,
    pub path: &'static str,
    pub date_field: &'static str,
    pub term_fields: &'static [(RateTerm, &'static str)],
}

pub const INTERBANK_DAILY: HkmaDataset = HkmaDataset {
    source_name: "hkma_interbank_daily",
    path: "/public/market-data-and-statistics/monthly-statistical-bulletin/er-ir/hk-interbank-ir-daily",
    date_field: "end_of_day",
    term_fields: &[
        (RateTerm::Overnight, "ir_overnight"),
        (RateTerm::OneWeek, "ir_1w"),
        (RateTerm::OneMonth, "ir_1m"),
        (RateTerm::ThreeMonths, "ir_3m"),
        (RateTerm::SixMonths, "ir_6m"),
        (RateTerm::TwelveMonths, "ir_12m"),
    ],
};

pub const DAILY_FIGURES: HkmaDataset = HkmaDataset {
    source_name: "hkma_daily_figures",
    path: "/public/market-data-and-statistics/daily-monetary-statistics/daily-figures-interbank-liquidity",
    date_field: "end_of_date",
    term_fields: &[
        (RateTerm::Overnight, "hibor_overnight"),
        (RateTerm::OneWeek, "hibor_fixing_1w"),
        (RateTerm::OneMonth, "hibor_fixing_1m"),
        (RateTerm::ThreeMonths, "hibor_fixing_3m"),
        (RateTerm::SixMonths, "hibor_fixing_6m"),
        (RateTerm::TwelveMonths, "hibor_fixing_12m"),
    ],
};

#[derive(Debug, Clone)]
pub struct HkmaRateSource {
    http: reqwest::Client,
    base_url: String,
    dataset: HkmaDataset,
}

impl HkmaRateSource {
    pub fn from_settings(settings: &Settings, dataset: HkmaDataset) -> Result<Self> {
        Ok(Self {
            http: http::build_client(settings.http_timeout)?,
            base_url: settings.hkma_base_url.clone(),
            dataset,
        })
    }
}

#[async_trait::async_trait]
impl RateSource for HkmaRateSource {
    fn source_name(&self) -> &'static str {
        self.dataset.source_name
    }

    async fn fetch_records(&self) -> Result<Vec<RawRateRecord>, UpstreamError> {
        let url = format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.dataset.path
        );
        let body = http::get_json(
            &self.http,
            self.dataset.source_name,
            &url,
            &[
                ("pagesize", PAGE_SIZE),
                ("sortby", self.dataset.date_field),
                ("sortorder", "desc"),
            ],
        )
        .await?;
        parse_records(&self.dataset, &body)
    }
}

pub fn parse_records(
    dataset: &HkmaDataset,
    body: &Value,
) -> Result<Vec<RawRateRecord>, UpstreamError> {
    let source = dataset.source_name;

    if body.pointer("/header/success").and_then(Value::as_bool) == Some(false) {
        let msg = body
            .pointer("/header/err_msg")
            .and_then(Value::as_str)
            .unwrap_or("request not successful");
        return Err(UpstreamError::no_data(source, msg));
    }

    let records = body
        .pointer("/result/records")
        .and_then(Value::as_array)
        .ok_or_else(|| UpstreamError::parse(source, "response has no result.records array"))?;

    let mut out = Vec::with_capacity(records.len());
    for rec in records {
        let Some(date_str) = rec.get(dataset.date_field).and_then(Value::as_str) else {
            tracing::warn!(source, "rate record without date; skipping");
            continue;
        };
        let Ok(as_of_date) = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d") else {
            tracing::warn!(source, date = %date_str, "rate record with unparseable date; skipping");
            continue;
        };

        let mut fields = BTreeMap::new();
        for (term, key) in dataset.term_fields {
            if let Some(v) = rec.get(*key) {
                fields.insert(*term, RawRateField::from_json(v));
            }
        }
        out.push(RawRateRecord { as_of_date, fields });
    }

    if out.is_empty() {
        return Err(UpstreamError::no_data(source, "no dated rate records"));
    }
    Ok(out)
}

/// Operator-configured rates used only when every live feed fails.
/// They are reported as of the run date.
#[derive(Debug, Clone)]
pub struct StaticRateSource {
    rates: BTreeMap<RateTerm, f64>,
    as_of_date: NaiveDate,
}

impl StaticRateSource {
    pub fn new(rates: BTreeMap<RateTerm, f64>, as_of_date: NaiveDate) -> Self {
        Self { rates, as_of_date }
    }
}

#[async_trait::async_trait]
impl RateSource for StaticRateSource {
    fn source_name(&self) -> &'static str {
        "static"
    }

    async fn fetch_records(&self) -> Result<Vec<RawRateRecord>, UpstreamError> {
        if self.rates.is_empty() {
            return Err(UpstreamError::no_data("static", "no static rates configured"));
        }
        let fields = self
            .rates
            .iter()
            .map(|(term, rate)| (*term, RawRateField::Number(*rate)))
            .collect();
        Ok(vec![RawRateRecord {
            as_of_date: self.as_of_date,
            fields,
        }])
    }
}
