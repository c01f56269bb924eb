use crate::catalog::InstrumentSlot;
use crate::domain::rates::RateQuote;
use crate::domain::sentiment::SentimentReading;
use crate::domain::snapshot::SeriesEntry;
use crate::ingest::provider::{PriceSource, RateSource, SentimentSource};
use crate::ingest::retry::with_retry;
use crate::normalize::{normalize_bars, normalize_sentiment, select_freshest_valid_record};
use crate::sync::SyncContext;
use crate::time::freshness::check_freshness;

/// Sources for one logical metric in priority order, plus the ones that could not be built.
pub struct AdapterChain<S: ?Sized> {
    pub sources: Vec<Box<S>>,
    /// `"<source>: <reason>"` for every source left out, e.g. for a missing credential.
    pub unavailable: Vec<String>,
}

impl<S: ?Sized> Default for AdapterChain<S> {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            unavailable: Vec::new(),
        }
    }
}

impl<S: ?Sized> AdapterChain<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: Box<S>) {
        self.sources.push(source);
    }

    /// Records a source that could not be constructed instead of aborting the run.
    pub fn push_result(&mut self, name: &str, source: anyhow::Result<Box<S>>) {
        match source {
            Ok(s) => self.sources.push(s),
            Err(err) => {
                tracing::warn!(source = %name, error = %err, "source unavailable; skipping");
                self.unavailable.push(format!("{name}: {err:#}"));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Failure of a whole chain: one line per source tried (or skipped), oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainFailure {
    pub attempts: Vec<String>,
}

impl ChainFailure {
    fn start<S: ?Sized>(chain: &AdapterChain<S>) -> Self {
        Self {
            attempts: chain.unavailable.clone(),
        }
    }

    pub fn summary(&self) -> String {
        match self.attempts.last() {
            Some(last) if self.attempts.len() > 1 => {
                format!("all {} sources failed; last: {last}", self.attempts.len())
            }
            Some(last) => format!("source failed: {last}"),
            None => "no sources configured".to_string(),
        }
    }
}

pub async fn fetch_series(
    ctx: &SyncContext,
    chain: &AdapterChain<dyn PriceSource>,
    slot: &InstrumentSlot,
) -> Result<SeriesEntry, ChainFailure> {
    let mut failure = ChainFailure::start(chain);

    for source in &chain.sources {
        let name = source.source_name();
        let Some(upstream) = source.upstream_symbol(slot).map(str::to_string) else {
            failure.attempts.push(format!("{name}: no symbol for {}", slot.code));
            continue;
        };

        let label = format!("{name}:{upstream}");
        let bars = match with_retry(&ctx.retry, &label, |_| source.fetch_daily(slot)).await {
            Ok(bars) => bars,
            Err(err) => {
                failure.attempts.push(format!("{name}: {err}"));
                continue;
            }
        };

        match normalize_bars(&slot.code, bars, ctx.window) {
            Ok(series) => {
                let stale = series
                    .latest_date()
                    .map(|d| {
                        check_freshness(&slot.code, d, ctx.now, ctx.price_freshness_days).stale
                    })
                    .unwrap_or(true);
                tracing::debug!(
                    symbol = %slot.code,
                    source = name,
                    points = series.points.len(),
                    "series normalized"
                );
                return Ok(SeriesEntry {
                    name: slot.name.clone(),
                    group: slot.group,
                    source: name.to_string(),
                    upstream_symbol: upstream,
                    substituted_by: slot.substituted_by.clone(),
                    stale,
                    points: series.points,
                });
            }
            Err(err) => {
                tracing::warn!(
                    symbol = %slot.code,
                    source = name,
                    error = %err,
                    "validation failed"
                );
                failure.attempts.push(format!("{name}: {err}"));
            }
        }
    }

    Err(failure)
}

pub async fn fetch_sentiment(
    ctx: &SyncContext,
    chain: &AdapterChain<dyn SentimentSource>,
) -> Result<(SentimentReading, bool), ChainFailure> {
    let mut failure = ChainFailure::start(chain);

    for source in &chain.sources {
        let name = source.source_name();
        let raw = match with_retry(&ctx.retry, name, |_| source.fetch_latest()).await {
            Ok(raw) => raw,
            Err(err) => {
                failure.attempts.push(format!("{name}: {err}"));
                continue;
            }
        };

        match normalize_sentiment(raw, name) {
            Ok(reading) => {
                let stale =
                    check_freshness("sentiment", reading.date, ctx.now, ctx.price_freshness_days)
                        .stale;
                return Ok((reading, stale));
            }
            Err(err) => {
                tracing::warn!(source = name, error = %err, "sentiment rejected");
                failure.attempts.push(format!("{name}: {err}"));
            }
        }
    }

    Err(failure)
}

pub async fn fetch_rates(
    ctx: &SyncContext,
    chain: &AdapterChain<dyn RateSource>,
) -> Result<(Vec<RateQuote>, &'static str), ChainFailure> {
    let mut failure = ChainFailure::start(chain);

    for source in &chain.sources {
        let name = source.source_name();
        let records = match with_retry(&ctx.retry, name, |_| source.fetch_records()).await {
            Ok(records) => records,
            Err(err) => {
                failure.attempts.push(format!("{name}: {err}"));
                continue;
            }
        };

        match select_freshest_valid_record(&records, &ctx.required_terms) {
            Ok(quotes) => return Ok((quotes, name)),
            Err(err) => {
                tracing::warn!(source = name, error = %err, "no complete rate record");
                failure.attempts.push(format!("{name}: {err}"));
            }
        }
    }

    Err(failure)
}
