use crate::domain::rates::{RateQuote, RateTerm};
use crate::ingest::types::{RawRateField, RawRateRecord};
use crate::normalize::ValidationError;

const PLACEHOLDERS: &[&str] = &["N.A.", "N.A", "NA", "N/A", "-", "--"];

fn parse_rate(field: &RawRateField) -> Option<f64> {
    let v = match field {
        RawRateField::Number(n) => *n,
        RawRateField::Text(s) => {
            let t = s.trim();
            if t.is_empty() || PLACEHOLDERS.iter().any(|p| t.eq_ignore_ascii_case(p)) {
                return None;
            }
            t.parse::<f64>().ok()?
        }
        RawRateField::Null => return None,
    };
    (v.is_finite() && v > 0.0).then_some(v)
}

/// Quotes for `required_terms`, or `None` if any of them is missing, a placeholder,
/// or not a positive number. Values are passed through unmodified.
pub fn validate_rate_record(
    record: &RawRateRecord,
    required_terms: &[RateTerm],
) -> Option<Vec<RateQuote>> {
    required_terms
        .iter()
        .map(|term| {
            let rate = parse_rate(record.fields.get(term)?)?;
            Some(RateQuote {
                term: *term,
                rate,
                as_of_date: record.as_of_date,
            })
        })
        .collect()
}

/// Scans newest-first and returns the first record whose required terms are all valid.
pub fn select_freshest_valid_record(
    records: &[RawRateRecord],
    required_terms: &[RateTerm],
) -> Result<Vec<RateQuote>, ValidationError> {
    let mut ordered: Vec<&RawRateRecord> = records.iter().collect();
    ordered.sort_by(|a, b| b.as_of_date.cmp(&a.as_of_date));

    for (idx, record) in ordered.iter().enumerate() {
        match validate_rate_record(record, required_terms) {
            Some(quotes) => {
                if idx > 0 {
                    tracing::info!(
                        skipped = idx,
                        as_of_date = %record.as_of_date,
                        "newer rate records incomplete; using older record"
                    );
                }
                return Ok(quotes);
            }
            None => {
                tracing::debug!(as_of_date = %record.as_of_date, "rate record incomplete");
            }
        }
    }

    Err(ValidationError::NoValidRecord {
        scanned: records.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    const TERMS: [RateTerm; 3] = [RateTerm::OneMonth, RateTerm::ThreeMonths, RateTerm::SixMonths];

    fn record(day: u32, fields: &[(RateTerm, RawRateField)]) -> RawRateRecord {
        RawRateRecord {
            as_of_date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            fields: fields.iter().cloned().collect::<BTreeMap<_, _>>(),
        }
    }

    fn num(v: f64) -> RawRateField {
        RawRateField::Number(v)
    }

    fn text(s: &str) -> RawRateField {
        RawRateField::Text(s.to_string())
    }

    #[test]
    fn accepts_complete_positive_record() {
        let rec = record(
            2,
            &[
                (RateTerm::OneMonth, num(4.21)),
                (RateTerm::ThreeMonths, text("4.35")),
                (RateTerm::SixMonths, num(4.5)),
                (RateTerm::Overnight, text("N.A.")),
            ],
        );
        let quotes = validate_rate_record(&rec, &TERMS).unwrap();
        assert_eq!(quotes.len(), 3);
        assert_eq!(quotes[1].term, RateTerm::ThreeMonths);
        assert_eq!(quotes[1].rate, 4.35);
    }

    #[test]
    fn rejects_missing_placeholder_zero_or_negative_terms() {
        let base = [
            (RateTerm::OneMonth, num(4.21)),
            (RateTerm::ThreeMonths, num(4.35)),
        ];
        for bad in [
            None,
            Some(text("N.A.")),
            Some(text("")),
            Some(text("abc")),
            Some(RawRateField::Null),
            Some(num(0.0)),
            Some(num(-0.1)),
        ] {
            let mut fields = base.to_vec();
            if let Some(b) = bad.clone() {
                fields.push((RateTerm::SixMonths, b));
            }
            assert!(
                validate_rate_record(&record(2, &fields), &TERMS).is_none(),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn backtracks_to_third_record() {
        let complete = [
            (RateTerm::OneMonth, num(4.1)),
            (RateTerm::ThreeMonths, num(4.2)),
            (RateTerm::SixMonths, num(4.3)),
        ];
        let records = vec![
            record(4, &complete[..2]),
            record(
                3,
                &[
                    (RateTerm::OneMonth, num(4.0)),
                    (RateTerm::ThreeMonths, num(4.0)),
                    (RateTerm::SixMonths, text("N.A.")),
                ],
            ),
            record(2, &complete),
        ];

        let quotes = select_freshest_valid_record(&records, &TERMS).unwrap();
        assert_eq!(quotes.len(), 3);
        for q in &quotes {
            assert_eq!(q.as_of_date, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        }
        let rates: Vec<f64> = quotes.iter().map(|q| q.rate).collect();
        assert_eq!(rates, vec![4.1, 4.2, 4.3]);
    }

    #[test]
    fn orders_by_date_before_scanning() {
        let older = record(1, &[(RateTerm::OneMonth, num(1.0))]);
        let newer = record(5, &[(RateTerm::OneMonth, num(2.0))]);
        let quotes =
            select_freshest_valid_record(&[older, newer], &[RateTerm::OneMonth]).unwrap();
        assert_eq!(quotes[0].rate, 2.0);
    }

    #[test]
    fn no_valid_record_reports_scan_count() {
        let records = vec![record(2, &[]), record(1, &[])];
        assert_eq!(
            select_freshest_valid_record(&records, &TERMS),
            Err(ValidationError::NoValidRecord { scanned: 2 })
        );
    }
}
