//! Per-metric orchestration: adapter chain, validation, then one artifact per metric.
//!
//! Every metric produces a file. When all sources for a metric fail, an error snapshot
//! (`status: "ERROR"`) replaces the previous artifact so consumers can tell a broken feed
//! from a missing one.

pub mod chain;

use crate::analysis;
use crate::catalog::InstrumentSlot;
use crate::config::Settings;
use crate::domain::rates::RateTerm;
use crate::domain::snapshot::{
    ErrorBody, PriceHistoryBody, RateBody, SentimentBody, SeriesEntry, Snapshot, SnapshotStatus,
};
use crate::ingest::provider::{PriceSource, RateSource, SentimentSource};
use crate::ingest::retry::RetryPolicy;
use crate::storage::SnapshotSink;
use crate::time::freshness::check_freshness;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

pub use chain::{AdapterChain, ChainFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    Prices,
    Funds,
    Sentiment,
    Rates,
    Breadth,
    Analysis,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Prices,
        Metric::Funds,
        Metric::Sentiment,
        Metric::Rates,
        Metric::Breadth,
        Metric::Analysis,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prices => "prices",
            Self::Funds => "funds",
            Self::Sentiment => "sentiment",
            Self::Rates => "rates",
            Self::Breadth => "breadth",
            Self::Analysis => "analysis",
        }
    }

    pub const fn artifact(self) -> &'static str {
        match self {
            Self::Prices => "market_data_history",
            Self::Funds => "fund_data",
            Self::Sentiment => "fear_greed_index",
            Self::Rates => "hibor_rates",
            Self::Breadth => "market_breadth",
            Self::Analysis => "ai_analysis",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run-wide parameters, built once from [`Settings`].
#[derive(Debug, Clone)]
pub struct SyncContext {
    pub retry: RetryPolicy,
    pub window: usize,
    pub price_freshness_days: i64,
    pub hibor_freshness_days: i64,
    pub required_terms: Vec<RateTerm>,
    pub now: DateTime<Utc>,
}

impl SyncContext {
    pub fn from_settings(settings: &Settings, now: DateTime<Utc>) -> Self {
        Self {
            retry: RetryPolicy::from(settings.fetch),
            window: settings.series_window,
            price_freshness_days: settings.price_freshness_days,
            hibor_freshness_days: settings.hibor_freshness_days,
            required_terms: settings.hibor_required_terms.clone(),
            now,
        }
    }
}

/// Everything a run needs: instrument slots and the adapter chain for each metric.
pub struct SyncPlan {
    pub market_slots: Vec<InstrumentSlot>,
    pub fund_slots: Vec<InstrumentSlot>,
    pub prices: AdapterChain<dyn PriceSource>,
    pub sentiment: AdapterChain<dyn SentimentSource>,
    pub rates: AdapterChain<dyn RateSource>,
}

#[derive(Debug, Clone)]
pub struct ArtifactOutcome {
    pub metric: Metric,
    pub artifact: &'static str,
    pub status: SnapshotStatus,
    pub written: Result<PathBuf, String>,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub outcomes: Vec<ArtifactOutcome>,
}

impl RunReport {
    pub fn write_failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.written.is_err()).count()
    }

    pub fn error_snapshots(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == SnapshotStatus::Error)
            .count()
    }

    pub fn get(&self, metric: Metric) -> Option<&ArtifactOutcome> {
        self.outcomes.iter().find(|o| o.metric == metric)
    }

    fn emit<T: Serialize>(
        &mut self,
        sink: &dyn SnapshotSink,
        metric: Metric,
        snapshot: &Snapshot<T>,
    ) {
        let artifact = metric.artifact();
        let written = serde_json::to_value(snapshot)
            .map_err(|e| format!("serialize {artifact}: {e}"))
            .and_then(|v| sink.write_value(artifact, &v).map_err(|e| e.to_string()));

        if let Err(err) = &written {
            tracing::error!(%metric, %artifact, error = %err, "snapshot write failed");
        }

        self.outcomes.push(ArtifactOutcome {
            metric,
            artifact,
            status: snapshot.status,
            written,
        });
    }

    fn emit_error(
        &mut self,
        sink: &dyn SnapshotSink,
        metric: Metric,
        now: DateTime<Utc>,
        error: String,
        attempts: Vec<String>,
    ) {
        tracing::error!(%metric, error = %error, "metric failed; writing error snapshot");
        let snapshot: Snapshot<ErrorBody> =
            Snapshot::error(now, metric.as_str(), error, attempts);
        self.emit(sink, metric, &snapshot);
    }
}

/// Runs the requested metrics in a fixed order, strictly one after another.
pub async fn run(
    ctx: &SyncContext,
    plan: &SyncPlan,
    sink: &dyn SnapshotSink,
    only: &[Metric],
) -> RunReport {
    let wanted = |m: Metric| only.is_empty() || only.contains(&m);
    let mut report = RunReport::default();

    // Breadth and analysis read the market series of this run.
    let mut market_series = BTreeMap::new();
    if wanted(Metric::Prices) || wanted(Metric::Breadth) || wanted(Metric::Analysis) {
        match sync_price_family(ctx, &plan.prices, &plan.market_slots).await {
            Ok(body) => {
                market_series = body.series.clone();
                if wanted(Metric::Prices) {
                    report.emit(sink, Metric::Prices, &Snapshot::ok(ctx.now, body));
                }
            }
            Err(failure) => {
                if wanted(Metric::Prices) {
                    report.emit_error(
                        sink,
                        Metric::Prices,
                        ctx.now,
                        failure.error,
                        failure.attempts,
                    );
                }
            }
        }
    }

    if wanted(Metric::Funds) {
        match sync_price_family(ctx, &plan.prices, &plan.fund_slots).await {
            Ok(body) => report.emit(sink, Metric::Funds, &Snapshot::ok(ctx.now, body)),
            Err(failure) => {
                report.emit_error(sink, Metric::Funds, ctx.now, failure.error, failure.attempts)
            }
        }
    }

    if wanted(Metric::Sentiment) {
        match chain::fetch_sentiment(ctx, &plan.sentiment).await {
            Ok((reading, stale)) => {
                tracing::info!(
                    value = reading.value,
                    label = %reading.label,
                    source = %reading.source,
                    "sentiment synced"
                );
                let body = SentimentBody { reading, stale };
                report.emit(sink, Metric::Sentiment, &Snapshot::ok(ctx.now, body));
            }
            Err(failure) => report.emit_error(
                sink,
                Metric::Sentiment,
                ctx.now,
                failure.summary(),
                failure.attempts,
            ),
        }
    }

    if wanted(Metric::Rates) {
        match chain::fetch_rates(ctx, &plan.rates).await {
            Ok((quotes, source)) => {
                let body = rate_body(ctx, &quotes, source);
                tracing::info!(
                    as_of_date = %body.as_of_date,
                    source,
                    stale = body.stale,
                    "rates synced"
                );
                report.emit(sink, Metric::Rates, &Snapshot::ok(ctx.now, body));
            }
            Err(failure) => {
                report.emit_error(sink, Metric::Rates, ctx.now, failure.summary(), failure.attempts)
            }
        }
    }

    if wanted(Metric::Breadth) {
        let body =
            analysis::compute_breadth(&plan.market_slots, &market_series, ctx.now.date_naive());
        report.emit(sink, Metric::Breadth, &Snapshot::ok(ctx.now, body));
    }

    if wanted(Metric::Analysis) {
        match analysis::analyze_trend(&market_series, ctx.now) {
            Ok(body) => report.emit(sink, Metric::Analysis, &Snapshot::ok(ctx.now, body)),
            Err(reason) => {
                report.emit_error(sink, Metric::Analysis, ctx.now, reason, Vec::new())
            }
        }
    }

    report
}

/// Failure of a whole price family: no slot produced a series.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyFailure {
    pub error: String,
    /// `"<code>: <chain summary>"` per slot, in catalog order.
    pub attempts: Vec<String>,
}

/// Fetches every slot. Fails only when no slot produced a series.
pub async fn sync_price_family(
    ctx: &SyncContext,
    chain: &AdapterChain<dyn PriceSource>,
    slots: &[InstrumentSlot],
) -> Result<PriceHistoryBody, FamilyFailure> {
    if slots.is_empty() {
        return Err(FamilyFailure {
            error: "no instruments configured".to_string(),
            attempts: Vec::new(),
        });
    }

    let mut series: BTreeMap<String, SeriesEntry> = BTreeMap::new();
    let mut errors = BTreeMap::new();
    let mut attempts = Vec::new();
    let mut last_summary = String::new();

    for slot in slots {
        match chain::fetch_series(ctx, chain, slot).await {
            Ok(entry) => {
                series.insert(slot.code.clone(), entry);
            }
            Err(failure) => {
                let summary = failure.summary();
                tracing::warn!(symbol = %slot.code, error = %summary, "no usable series");
                attempts.push(format!("{}: {summary}", slot.code));
                errors.insert(slot.code.clone(), summary.clone());
                last_summary = summary;
            }
        }
    }

    tracing::info!(
        synced = series.len(),
        failed = errors.len(),
        total = slots.len(),
        "price family synced"
    );

    if series.is_empty() {
        return Err(FamilyFailure {
            error: format!("all {} instruments failed; last: {last_summary}", slots.len()),
            attempts,
        });
    }

    Ok(PriceHistoryBody {
        window: ctx.window,
        series,
        errors,
    })
}

fn rate_body(
    ctx: &SyncContext,
    quotes: &[crate::domain::rates::RateQuote],
    source: &str,
) -> RateBody {
    let as_of_date = quotes
        .first()
        .map(|q| q.as_of_date)
        .unwrap_or_else(|| ctx.now.date_naive());
    let freshness = check_freshness("hibor", as_of_date, ctx.now, ctx.hibor_freshness_days);

    RateBody {
        as_of_date,
        rates: quotes.iter().map(|q| (q.term, q.rate)).collect(),
        source: source.to_string(),
        stale: freshness.stale,
        age_days: freshness.age_days,
    }
}
