use crate::ingest::error::{UpstreamError, UpstreamErrorKind};
use anyhow::Context;
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const USER_AGENT: &str = concat!("dashsync/", env!("CARGO_PKG_VERSION"));

pub fn build_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build upstream http client")
}

/// Maps a non-success status onto the upstream error taxonomy.
pub fn classify_status(status: StatusCode) -> UpstreamErrorKind {
    match status {
        StatusCode::TOO_MANY_REQUESTS => UpstreamErrorKind::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UpstreamErrorKind::Unauthorized,
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
            UpstreamErrorKind::InvalidSymbol
        }
        _ => UpstreamErrorKind::NetworkError,
    }
}

/// GET `url` and decode the body as JSON.
///
/// Transport errors are reported without the request URL, since query strings may carry
/// credentials.
///
/// A body that is not JSON at all (truncated, an HTML error page) is reported as a
/// `NetworkError` so the caller retries it; shape mismatches are the adapter's `ParseError`.
pub async fn get_json(
    http: &reqwest::Client,
    source: &'static str,
    url: &str,
    query: &[(&str, &str)],
) -> Result<Value, UpstreamError> {
    let res = http
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| {
            UpstreamError::network(source, format!("request failed: {}", e.without_url()))
        })?;

    let status = res.status();
    let text = res
        .text()
        .await
        .map_err(|e| {
            UpstreamError::network(source, format!("failed to read body: {}", e.without_url()))
        })?;

    if !status.is_success() {
        return Err(UpstreamError::new(
            classify_status(status),
            source,
            format!("HTTP {status}: {}", snippet(&text)),
        ));
    }

    serde_json::from_str::<Value>(&text).map_err(|e| {
        UpstreamError::network(
            source,
            format!("malformed body ({e}): {}", snippet(&text)),
        )
    })
}

fn snippet(text: &str) -> String {
    const MAX: usize = 200;
    let t = text.trim();
    match t.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &t[..idx]),
        None => t.to_string(),
    }
}

/// Enforces a minimum delay between consecutive calls to one upstream.
#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    pub async fn wait(&self) {
        let wait = {
            let mut guard = match self.last_call.lock() {
                Ok(g) => g,
                Err(poisoned) => poisoned.into_inner(),
            };
            let now = Instant::now();
            let wait = (*guard)
                .map(|last| self.min_interval.saturating_sub(now.duration_since(last)))
                .unwrap_or(Duration::ZERO);
            *guard = Some(now + wait);
            wait
        };
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_statuses() {
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            UpstreamErrorKind::RateLimited
        );
        assert_eq!(
            classify_status(StatusCode::UNAUTHORIZED),
            UpstreamErrorKind::Unauthorized
        );
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND),
            UpstreamErrorKind::InvalidSymbol
        );
        assert_eq!(
            classify_status(StatusCode::BAD_GATEWAY),
            UpstreamErrorKind::NetworkError
        );
    }

    #[test]
    fn snippet_truncates_on_char_boundary() {
        let long = "恒".repeat(300);
        let s = snippet(&long);
        assert!(s.ends_with("..."));
        assert_eq!(s.chars().count(), 203);
    }

    #[tokio::test]
    async fn first_call_is_not_delayed() {
        let pacer = Pacer::new(Duration::from_secs(60));
        let started = Instant::now();
        pacer.wait().await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
