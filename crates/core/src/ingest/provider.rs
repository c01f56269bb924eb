use crate::catalog::InstrumentSlot;
use crate::ingest::error::UpstreamError;
use crate::ingest::types::{RawBar, RawRateRecord, RawSentiment};

/// Daily price history for one catalog slot.
#[async_trait::async_trait]
pub trait PriceSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    /// The upstream symbol this source would request for `slot`, if it can serve it at all.
    fn upstream_symbol<'a>(&self, slot: &'a InstrumentSlot) -> Option<&'a str>;

    async fn fetch_daily(&self, slot: &InstrumentSlot) -> Result<Vec<RawBar>, UpstreamError>;
}

#[async_trait::async_trait]
pub trait SentimentSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_latest(&self) -> Result<RawSentiment, UpstreamError>;
}

/// Interbank rate records, in whatever order the upstream returns them.
#[async_trait::async_trait]
pub trait RateSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_records(&self) -> Result<Vec<RawRateRecord>, UpstreamError>;
}
