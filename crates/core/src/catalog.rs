use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentGroup {
    Index,
    Sector,
    Thematic,
    Crypto,
    Fund,
}

/// A logical slot on the dashboard, independent of which upstream currently serves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentSlot {
    /// Key the dashboard reads.
    pub code: String,
    pub name: String,
    pub group: InstrumentGroup,
    pub yahoo_symbol: Option<String>,
    pub alphavantage_symbol: Option<String>,
    /// Set when configuration maps this slot onto a different instrument.
    pub substituted_by: Option<String>,
}

impl InstrumentSlot {
    fn new(
        code: &str,
        name: &str,
        group: InstrumentGroup,
        yahoo: &str,
        alphavantage: Option<&str>,
    ) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            group,
            yahoo_symbol: Some(yahoo.to_string()),
            alphavantage_symbol: alphavantage.map(str::to_string),
            substituted_by: None,
        }
    }

    /// Counts toward advancers/decliners. Volatility, crypto and funds are excluded.
    pub fn breadth_eligible(&self) -> bool {
        !matches!(self.group, InstrumentGroup::Crypto | InstrumentGroup::Fund) && self.code != "VIX"
    }
}

pub fn default_catalog() -> Vec<InstrumentSlot> {
    use InstrumentGroup::*;

    vec![
        InstrumentSlot::new("SPY", "標普500 ETF", Index, "SPY", Some("SPY")),
        InstrumentSlot::new("QQQ", "納指100 ETF", Index, "QQQ", Some("QQQ")),
        InstrumentSlot::new("DIA", "道瓊斯 ETF", Index, "DIA", Some("DIA")),
        InstrumentSlot::new("VIX", "波動率指數", Index, "^VIX", None),
        InstrumentSlot::new("HSI", "恒生指數", Index, "^HSI", None),
        InstrumentSlot::new("N225", "日經225指數", Index, "^N225", None),
        InstrumentSlot::new("GSPC", "標普500指數", Index, "^GSPC", None),
        InstrumentSlot::new("IXIC", "納斯達克綜合指數", Index, "^IXIC", None),
        InstrumentSlot::new("BTC-USD", "比特幣", Crypto, "BTC-USD", None),
        InstrumentSlot::new("XLK", "科技", Sector, "XLK", Some("XLK")),
        InstrumentSlot::new("XLC", "通訊服務", Sector, "XLC", Some("XLC")),
        InstrumentSlot::new("XLY", "非必需消費", Sector, "XLY", Some("XLY")),
        InstrumentSlot::new("XLP", "必需消費", Sector, "XLP", Some("XLP")),
        InstrumentSlot::new("XLV", "醫療保健", Sector, "XLV", Some("XLV")),
        InstrumentSlot::new("XLF", "金融", Sector, "XLF", Some("XLF")),
        InstrumentSlot::new("XLE", "能源", Sector, "XLE", Some("XLE")),
        InstrumentSlot::new("XLI", "工業", Sector, "XLI", Some("XLI")),
        InstrumentSlot::new("XLB", "原材料", Sector, "XLB", Some("XLB")),
        InstrumentSlot::new("XLU", "公用事業", Sector, "XLU", Some("XLU")),
        InstrumentSlot::new("VNQ", "房地產", Sector, "VNQ", Some("VNQ")),
        InstrumentSlot::new("GLD", "黃金", Thematic, "GLD", Some("GLD")),
        InstrumentSlot::new("ROBO", "機械人", Thematic, "ROBO", Some("ROBO")),
        InstrumentSlot::new("SMH", "半導體", Thematic, "SMH", Some("SMH")),
        InstrumentSlot::new("IWM", "羅素2000 ETF", Thematic, "IWM", Some("IWM")),
        InstrumentSlot::new("VFIAX", "先鋒標普500指數基金", Fund, "VFIAX", Some("VFIAX")),
        InstrumentSlot::new("VMMXX", "先鋒貨幣市場基金", Fund, "VMMXX", Some("VMMXX")),
        InstrumentSlot::new("SWVXX", "嘉信貨幣市場基金", Fund, "SWVXX", Some("SWVXX")),
        InstrumentSlot::new(
            "FXNAX",
            "富達美國債券指數基金",
            Fund,
            "FXNAX",
            Some("FXNAX"),
        ),
    ]
}

/// Applies configured substitutions. Unknown slot codes are returned so the caller can warn.
pub fn apply_substitutions(
    slots: &mut [InstrumentSlot],
    substitutions: &BTreeMap<String, String>,
) -> Vec<String> {
    let mut unknown = Vec::new();
    for (code, upstream) in substitutions {
        let Some(slot) = slots.iter_mut().find(|s| &s.code == code) else {
            unknown.push(code.clone());
            continue;
        };
        tracing::warn!(
            slot = %slot.code,
            upstream = %upstream,
            "slot is served by a substitute instrument"
        );
        slot.yahoo_symbol = Some(upstream.clone());
        slot.alphavantage_symbol = Some(upstream.clone());
        slot.substituted_by = Some(upstream.clone());
    }
    unknown
}

pub fn split_funds(slots: Vec<InstrumentSlot>) -> (Vec<InstrumentSlot>, Vec<InstrumentSlot>) {
    slots
        .into_iter()
        .partition(|s| s.group != InstrumentGroup::Fund)
}
