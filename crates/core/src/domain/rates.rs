use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RateTerm {
    #[serde(rename = "overnight")]
    Overnight,
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "12M")]
    TwelveMonths,
}

impl RateTerm {
    pub const ALL: [RateTerm; 6] = [
        RateTerm::Overnight,
        RateTerm::OneWeek,
        RateTerm::OneMonth,
        RateTerm::ThreeMonths,
        RateTerm::SixMonths,
        RateTerm::TwelveMonths,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overnight => "overnight",
            Self::OneWeek => "1W",
            Self::OneMonth => "1M",
            Self::ThreeMonths => "3M",
            Self::SixMonths => "6M",
            Self::TwelveMonths => "12M",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ON" | "O/N" | "OVERNIGHT" => Some(Self::Overnight),
            "1W" => Some(Self::OneWeek),
            "1M" => Some(Self::OneMonth),
            "3M" => Some(Self::ThreeMonths),
            "6M" => Some(Self::SixMonths),
            "12M" | "1Y" => Some(Self::TwelveMonths),
            _ => None,
        }
    }
}

impl fmt::Display for RateTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    pub term: RateTerm,
    /// Always > 0.
    pub rate: f64,
    pub as_of_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn parses_aliases() {
        assert_eq!(RateTerm::parse("o/n"), Some(RateTerm::Overnight));
        assert_eq!(RateTerm::parse("1y"), Some(RateTerm::TwelveMonths));
        assert_eq!(RateTerm::parse("2M"), None);
    }

    #[test]
    fn serializes_as_map_keys_in_tenor_order() {
        let mut m = BTreeMap::new();
        m.insert(RateTerm::SixMonths, 5.2);
        m.insert(RateTerm::OneMonth, 4.85);
        let s = serde_json::to_string(&m).unwrap();
        assert_eq!(s, r#"{"1M":4.85,"6M":5.2}"#);
    }
}
