use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Freshness {
    pub age_days: i64,
    pub stale: bool,
}

/// Compares a reported date against the run time. Staleness is logged, never fatal.
pub fn check_freshness(
    what: &str,
    as_of_date: NaiveDate,
    now: DateTime<Utc>,
    max_age_days: i64,
) -> Freshness {
    let age_days = (now.date_naive() - as_of_date).num_days();
    let stale = age_days > max_age_days;
    if stale {
        tracing::warn!(
            %what,
            %as_of_date,
            age_days,
            max_age_days,
            "data is stale"
        );
    }
    Freshness { age_days, stale }
}
