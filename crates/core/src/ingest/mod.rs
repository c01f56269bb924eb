pub mod alphavantage;
pub mod error;
pub mod fear_greed;
pub mod hkma;
pub mod http;
pub mod provider;
pub mod retry;
pub mod types;
pub mod yahoo;

pub use error::{FetchFailure, UpstreamError, UpstreamErrorKind};
pub use provider::{PriceSource, RateSource, SentimentSource};
pub use retry::{with_retry, RetryPolicy};
