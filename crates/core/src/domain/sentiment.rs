use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReading {
    pub date: NaiveDate,
    /// 0..=100 inclusive.
    pub value: u8,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_zh: Option<String>,
    pub source: String,
}

/// Traditional Chinese label for the five canonical fear & greed buckets.
pub fn label_zh(label: &str) -> Option<&'static str> {
    match label.trim().to_ascii_lowercase().as_str() {
        "extreme fear" => Some("極度恐懼"),
        "fear" => Some("恐懼"),
        "neutral" => Some("中性"),
        "greed" => Some("貪婪"),
        "extreme greed" => Some("極度貪婪"),
        _ => None,
    }
}

/// Bucket label for providers that only publish a score.
pub fn classify(value: u8) -> &'static str {
    match value {
        0..=24 => "Extreme Fear",
        25..=44 => "Fear",
        45..=55 => "Neutral",
        56..=75 => "Greed",
        _ => "Extreme Greed",
    }
}

/// Normalizes provider spellings ("extreme greed", "EXTREME_GREED") to title case.
pub fn canonical_label(raw: &str) -> String {
    raw.replace('_', " ")
        .split_whitespace()
        .map(|w| {
            let lower = w.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_known_labels_case_insensitively() {
        assert_eq!(label_zh("Extreme Fear"), Some("極度恐懼"));
        assert_eq!(label_zh("greed"), Some("貪婪"));
        assert_eq!(label_zh("Panic"), None);
    }

    #[test]
    fn canonicalizes_provider_spellings() {
        assert_eq!(canonical_label("extreme greed"), "Extreme Greed");
        assert_eq!(canonical_label("EXTREME_FEAR"), "Extreme Fear");
        assert_eq!(canonical_label(" neutral "), "Neutral");
    }

    #[test]
    fn classifies_scores_at_bucket_edges() {
        assert_eq!(classify(0), "Extreme Fear");
        assert_eq!(classify(25), "Fear");
        assert_eq!(classify(50), "Neutral");
        assert_eq!(classify(75), "Greed");
        assert_eq!(classify(100), "Extreme Greed");
    }
}
