use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    RateLimited,
    InvalidSymbol,
    NoData,
    NetworkError,
    ParseError,
    Unauthorized,
}

impl UpstreamErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::InvalidSymbol => "invalid_symbol",
            Self::NoData => "no_data",
            Self::NetworkError => "network_error",
            Self::ParseError => "parse_error",
            Self::Unauthorized => "unauthorized",
        }
    }

    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::NetworkError)
    }
}

/// Error returned by a single adapter call. Adapters never retry; the caller inspects `kind`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamError {
    pub kind: UpstreamErrorKind,
    pub source_name: &'static str,
    pub detail: String,
}

impl UpstreamError {
    pub fn new(
        kind: UpstreamErrorKind,
        source_name: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            source_name,
            detail: detail.into(),
        }
    }

    pub fn network(source_name: &'static str, detail: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::NetworkError, source_name, detail)
    }

    pub fn parse(source_name: &'static str, detail: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::ParseError, source_name, detail)
    }

    pub fn no_data(source_name: &'static str, detail: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::NoData, source_name, detail)
    }

    pub fn invalid_symbol(source_name: &'static str, detail: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::InvalidSymbol, source_name, detail)
    }

    pub fn rate_limited(source_name: &'static str, detail: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::RateLimited, source_name, detail)
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error from {}: {}",
            self.kind.as_str(),
            self.source_name,
            self.detail
        )
    }
}

impl std::error::Error for UpstreamError {}

/// Outcome of a retried call that never succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchFailure {
    /// Every attempt failed with a retryable error.
    TransientFetchFailure { attempts: u32, last: UpstreamError },
    /// The upstream rejected the call in a way retrying cannot fix.
    NonRetryable { attempts: u32, error: UpstreamError },
}

impl FetchFailure {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::TransientFetchFailure { attempts, .. } | Self::NonRetryable { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn upstream(&self) -> &UpstreamError {
        match self {
            Self::TransientFetchFailure { last, .. } => last,
            Self::NonRetryable { error, .. } => error,
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransientFetchFailure { attempts, last } => {
                write!(f, "gave up after {attempts} attempts: {last}")
            }
            Self::NonRetryable { attempts, error } => {
                write!(f, "not retryable (attempt {attempts}): {error}")
            }
        }
    }
}

impl std::error::Error for FetchFailure {}
