use chrono::NaiveDate;
use dashsync_core::catalog::{apply_substitutions, default_catalog, split_funds};
use dashsync_core::config::Settings;
use dashsync_core::ingest::alphavantage::{self, AlphaVantageSource};
use dashsync_core::ingest::fear_greed::{self, AlternativeMeSource, CnnFearGreedSource};
use dashsync_core::ingest::hkma::{self, HkmaRateSource, StaticRateSource};
use dashsync_core::ingest::yahoo::{self, YahooChartSource};
use dashsync_core::ingest::{PriceSource, RateSource, SentimentSource};
use dashsync_core::sync::{AdapterChain, SyncPlan};

/// Assembles slots and adapter chains in priority order.
///
/// A source that cannot be built (for example a missing API key) is recorded on its
/// chain and only that chain degrades; construction never aborts the run.
pub fn build_plan(settings: &Settings, run_date: NaiveDate) -> SyncPlan {
    let (market_slots, fund_slots) = build_slots(settings);

    let mut prices: AdapterChain<dyn PriceSource> = AdapterChain::new();
    prices.push_result(
        yahoo::SOURCE,
        YahooChartSource::from_settings(settings)
            .map(|s| Box::new(s) as Box<dyn PriceSource>),
    );
    prices.push_result(
        alphavantage::SOURCE,
        AlphaVantageSource::from_settings(settings)
            .map(|s| Box::new(s) as Box<dyn PriceSource>),
    );

    let mut sentiment: AdapterChain<dyn SentimentSource> = AdapterChain::new();
    sentiment.push_result(
        fear_greed::ALTERNATIVE_ME,
        AlternativeMeSource::from_settings(settings)
            .map(|s| Box::new(s) as Box<dyn SentimentSource>),
    );
    sentiment.push_result(
        fear_greed::CNN,
        CnnFearGreedSource::from_settings(settings)
            .map(|s| Box::new(s) as Box<dyn SentimentSource>),
    );

    let mut rates: AdapterChain<dyn RateSource> = AdapterChain::new();
    for dataset in [hkma::INTERBANK_DAILY, hkma::DAILY_FIGURES] {
        let name = dataset.source_name;
        rates.push_result(
            name,
            HkmaRateSource::from_settings(settings, dataset)
                .map(|s| Box::new(s) as Box<dyn RateSource>),
        );
    }
    if let Some(fixed) = &settings.hibor_static_rates {
        rates.push(Box::new(StaticRateSource::new(fixed.clone(), run_date)));
    }

    tracing::info!(
        market = market_slots.len(),
        funds = fund_slots.len(),
        price_sources = prices.sources.len(),
        sentiment_sources = sentiment.sources.len(),
        rate_sources = rates.sources.len(),
        "sync plan built"
    );

    SyncPlan {
        market_slots,
        fund_slots,
        prices,
        sentiment,
        rates,
    }
}

fn build_slots(
    settings: &Settings,
) -> (
    Vec<dashsync_core::catalog::InstrumentSlot>,
    Vec<dashsync_core::catalog::InstrumentSlot>,
) {
    let mut slots = default_catalog();
    for code in apply_substitutions(&mut slots, &settings.symbol_substitutions) {
        tracing::warn!(slot = %code, "substitution names an unknown slot; ignored");
    }
    split_funds(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashsync_core::domain::rates::RateTerm;
    use std::collections::BTreeMap;

    fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    #[test]
    fn missing_alphavantage_key_only_marks_that_source_unavailable() {
        let settings = Settings::default();
        let plan = build_plan(&settings, run_date());

        assert_eq!(plan.prices.sources.len(), 1);
        assert_eq!(plan.prices.sources[0].source_name(), "yahoo_chart");
        assert_eq!(plan.prices.unavailable.len(), 1);
        assert!(plan.prices.unavailable[0].starts_with("alphavantage: "));
        assert!(plan.prices.unavailable[0].contains("ALPHAVANTAGE_API_KEY"));

        let sentiment: Vec<&str> = plan
            .sentiment
            .sources
            .iter()
            .map(|s| s.source_name())
            .collect();
        assert_eq!(sentiment, ["alternative_me_fng", "cnn_fear_greed"]);
        assert_eq!(plan.rates.sources.len(), 2);
    }

    #[test]
    fn static_rates_are_appended_last() {
        let mut settings = Settings::default();
        settings.hibor_static_rates = Some(BTreeMap::from([(RateTerm::OneMonth, 3.1)]));
        let plan = build_plan(&settings, run_date());

        assert_eq!(plan.rates.sources.len(), 3);
        assert_eq!(plan.rates.sources[2].source_name(), "static");
    }

    #[test]
    fn substitution_rewrites_upstream_symbols() {
        let mut settings = Settings::default();
        settings.symbol_substitutions =
            BTreeMap::from([("VIX".to_string(), "VIXY".to_string())]);
        let (market, funds) = build_slots(&settings);

        let vix = market.iter().find(|s| s.code == "VIX").unwrap();
        assert_eq!(vix.yahoo_symbol.as_deref(), Some("VIXY"));
        assert_eq!(vix.substituted_by.as_deref(), Some("VIXY"));
        assert_eq!(funds.len(), 4);
    }
}
