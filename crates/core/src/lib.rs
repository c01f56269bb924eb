pub mod analysis;
pub mod catalog;
pub mod domain;
pub mod ingest;
pub mod normalize;
pub mod storage;
pub mod sync;
pub mod time;

pub mod config {
    use crate::domain::rates::RateTerm;
    use anyhow::Context;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::str::FromStr;
    use std::time::Duration;

    pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";
    pub const DEFAULT_ALPHAVANTAGE_BASE_URL: &str = "https://www.alphavantage.co";
    pub const DEFAULT_FNG_BASE_URL: &str = "https://api.alternative.me";
    pub const DEFAULT_CNN_FNG_URL: &str =
        "https://production.dataviz.cnn.io/index/fearandgreed/graphdata";
    pub const DEFAULT_HKMA_BASE_URL: &str = "https://api.hkma.gov.hk";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub data_dir: PathBuf,
        pub sentry_dsn: Option<String>,
        pub alphavantage_api_key: Option<String>,

        pub http_timeout: Duration,
        pub fetch: FetchSettings,
        pub series_window: usize,
        pub price_lookback_range: String,
        pub price_freshness_days: i64,
        pub hibor_freshness_days: i64,
        pub hibor_required_terms: Vec<RateTerm>,
        pub hibor_static_rates: Option<BTreeMap<RateTerm, f64>>,

        /// Slot code -> upstream symbol that stands in for it.
        pub symbol_substitutions: BTreeMap<String, String>,

        pub yahoo_base_url: String,
        pub yahoo_req_delay: Duration,
        pub alphavantage_base_url: String,
        pub alphavantage_req_delay: Duration,
        pub fng_base_url: String,
        pub cnn_fng_url: String,
        pub hkma_base_url: String,
    }

    #[derive(Debug, Clone, Copy)]
    pub struct FetchSettings {
        pub max_attempts: u32,
        pub base_delay: Duration,
        pub rate_limit_multiplier: u32,
    }

    impl Default for FetchSettings {
        fn default() -> Self {
            Self {
                max_attempts: 3,
                base_delay: Duration::from_secs(5),
                rate_limit_multiplier: 2,
            }
        }
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                data_dir: PathBuf::from("data"),
                sentry_dsn: None,
                alphavantage_api_key: None,
                http_timeout: Duration::from_secs(30),
                fetch: FetchSettings::default(),
                series_window: 30,
                price_lookback_range: "3mo".to_string(),
                price_freshness_days: 5,
                hibor_freshness_days: 5,
                hibor_required_terms: vec![
                    RateTerm::OneMonth,
                    RateTerm::ThreeMonths,
                    RateTerm::SixMonths,
                ],
                hibor_static_rates: None,
                symbol_substitutions: BTreeMap::new(),
                yahoo_base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
                yahoo_req_delay: Duration::from_millis(500),
                alphavantage_base_url: DEFAULT_ALPHAVANTAGE_BASE_URL.to_string(),
                alphavantage_req_delay: Duration::from_millis(12_000),
                fng_base_url: DEFAULT_FNG_BASE_URL.to_string(),
                cnn_fng_url: DEFAULT_CNN_FNG_URL.to_string(),
                hkma_base_url: DEFAULT_HKMA_BASE_URL.to_string(),
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let defaults = Self::default();

            let fetch = FetchSettings {
                max_attempts: parse_env("FETCH_MAX_ATTEMPTS")?
                    .unwrap_or(defaults.fetch.max_attempts),
                base_delay: parse_env::<u64>("FETCH_BASE_DELAY_SECS")?
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.fetch.base_delay),
                rate_limit_multiplier: parse_env("RATE_LIMIT_BACKOFF_MULTIPLIER")?
                    .unwrap_or(defaults.fetch.rate_limit_multiplier),
            };
            anyhow::ensure!(fetch.max_attempts >= 1, "FETCH_MAX_ATTEMPTS must be >= 1");

            let series_window = parse_env("SERIES_WINDOW")?.unwrap_or(defaults.series_window);
            anyhow::ensure!(series_window >= 1, "SERIES_WINDOW must be >= 1");

            let hibor_required_terms = match env_nonempty("HIBOR_REQUIRED_TERMS") {
                Some(s) => parse_terms(&s).context("invalid HIBOR_REQUIRED_TERMS")?,
                None => defaults.hibor_required_terms,
            };

            let hibor_static_rates = env_nonempty("HIBOR_STATIC_RATES")
                .map(|s| parse_static_rates(&s))
                .transpose()
                .context("invalid HIBOR_STATIC_RATES")?;

            let symbol_substitutions = env_nonempty("SYMBOL_SUBSTITUTIONS")
                .map(|s| parse_substitutions(&s))
                .transpose()
                .context("invalid SYMBOL_SUBSTITUTIONS")?
                .unwrap_or_default();

            Ok(Self {
                data_dir: env_nonempty("DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.data_dir),
                sentry_dsn: env_nonempty("SENTRY_DSN"),
                alphavantage_api_key: env_nonempty("ALPHAVANTAGE_API_KEY"),
                http_timeout: parse_env::<u64>("HTTP_TIMEOUT_SECS")?
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.http_timeout),
                fetch,
                series_window,
                price_lookback_range: env_nonempty("PRICE_LOOKBACK_RANGE")
                    .unwrap_or(defaults.price_lookback_range),
                price_freshness_days: parse_env("PRICE_FRESHNESS_DAYS")?
                    .unwrap_or(defaults.price_freshness_days),
                hibor_freshness_days: parse_env("HIBOR_FRESHNESS_DAYS")?
                    .unwrap_or(defaults.hibor_freshness_days),
                hibor_required_terms,
                hibor_static_rates,
                symbol_substitutions,
                yahoo_base_url: env_nonempty("YAHOO_BASE_URL").unwrap_or(defaults.yahoo_base_url),
                yahoo_req_delay: parse_env::<u64>("YAHOO_REQ_DELAY_MS")?
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.yahoo_req_delay),
                alphavantage_base_url: env_nonempty("ALPHAVANTAGE_BASE_URL")
                    .unwrap_or(defaults.alphavantage_base_url),
                alphavantage_req_delay: parse_env::<u64>("ALPHAVANTAGE_REQ_DELAY_MS")?
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.alphavantage_req_delay),
                fng_base_url: env_nonempty("FNG_BASE_URL").unwrap_or(defaults.fng_base_url),
                cnn_fng_url: env_nonempty("CNN_FNG_URL").unwrap_or(defaults.cnn_fng_url),
                hkma_base_url: env_nonempty("HKMA_BASE_URL").unwrap_or(defaults.hkma_base_url),
            })
        }

        pub fn require_alphavantage_api_key(&self) -> anyhow::Result<&str> {
            self.alphavantage_api_key
                .as_deref()
                .context("ALPHAVANTAGE_API_KEY is required")
        }
    }

    fn env_nonempty(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn parse_env<T>(key: &str) -> anyhow::Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let Some(raw) = env_nonempty(key) else {
            return Ok(None);
        };
        raw.parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{key} is not valid ({raw:?}): {e}"))
    }

    pub fn parse_terms(s: &str) -> anyhow::Result<Vec<RateTerm>> {
        let mut out = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let term = RateTerm::parse(part)
                .with_context(|| format!("unknown rate term {part:?}"))?;
            if !out.contains(&term) {
                out.push(term);
            }
        }
        anyhow::ensure!(!out.is_empty(), "at least one rate term is required");
        Ok(out)
    }

    pub fn parse_static_rates(s: &str) -> anyhow::Result<BTreeMap<RateTerm, f64>> {
        let mut out = BTreeMap::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (term, rate) = part
                .split_once('=')
                .with_context(|| format!("expected TERM=RATE, got {part:?}"))?;
            let term = RateTerm::parse(term.trim())
                .with_context(|| format!("unknown rate term {term:?}"))?;
            let rate = rate
                .trim()
                .parse::<f64>()
                .with_context(|| format!("rate for {term} is not a number"))?;
            anyhow::ensure!(rate > 0.0, "rate for {term} must be positive");
            out.insert(term, rate);
        }
        Ok(out)
    }

    pub fn parse_substitutions(s: &str) -> anyhow::Result<BTreeMap<String, String>> {
        let mut out = BTreeMap::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (slot, upstream) = part
                .split_once('=')
                .with_context(|| format!("expected SLOT=SYMBOL, got {part:?}"))?;
            let (slot, upstream) = (slot.trim(), upstream.trim());
            anyhow::ensure!(
                !slot.is_empty() && !upstream.is_empty(),
                "empty side in substitution {part:?}"
            );
            out.insert(slot.to_ascii_uppercase(), upstream.to_string());
        }
        Ok(out)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn parses_term_list_and_dedups() {
            let terms = parse_terms("1M, 3m,6M,1M").unwrap();
            assert_eq!(
                terms,
                vec![RateTerm::OneMonth, RateTerm::ThreeMonths, RateTerm::SixMonths]
            );
            assert!(parse_terms("2M").is_err());
            assert!(parse_terms(" , ").is_err());
        }

        #[test]
        fn parses_static_rates() {
            let rates = parse_static_rates("1M=4.85,3M=5.05,6M=5.20").unwrap();
            assert_eq!(rates.get(&RateTerm::ThreeMonths).copied(), Some(5.05));
            assert!(parse_static_rates("1M=0").is_err());
            assert!(parse_static_rates("1M").is_err());
        }

        #[test]
        fn parses_substitutions_with_uppercase_slots() {
            let subs = parse_substitutions("vmmxx=VMFXX, SWVXX = SNVXX").unwrap();
            assert_eq!(subs.get("VMMXX").map(String::as_str), Some("VMFXX"));
            assert_eq!(subs.get("SWVXX").map(String::as_str), Some("SNVXX"));
            assert!(parse_substitutions("VMMXX=").is_err());
        }
    }
}
