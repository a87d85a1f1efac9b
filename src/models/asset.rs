//! Canonical merged asset record
//!
//! A `CanonicalAsset` is created by the first source that reports a symbol and
//! is then filled forward by lower-priority sources. Numeric fields use `0.0`
//! for "unknown", so a field is fillable exactly when it is zero, non-finite,
//! or (for text and series) empty.

use super::{ScoreBreakdown, SourceId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Normalize a ticker symbol into the cross-source join key
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Normalize a display name for the secondary identity lookup
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Chronological price windows, oldest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub last_7_days: Vec<f64>,
    pub last_30_days: Vec<f64>,
    pub last_90_days: Vec<f64>,
}

impl PriceHistory {
    /// Longest available window (90d, else 30d, else 7d)
    pub fn longest(&self) -> &[f64] {
        if !self.last_90_days.is_empty() {
            &self.last_90_days
        } else if !self.last_30_days.is_empty() {
            &self.last_30_days
        } else {
            &self.last_7_days
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeHistory {
    pub last_7_days: Vec<f64>,
    pub last_30_days: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TvlHistory {
    pub last_7_days: Vec<f64>,
    pub last_30_days: Vec<f64>,
}

/// Merge-fillable fields. Each fill is recorded in the asset's provenance table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetField {
    Id,
    Name,
    Category,
    Image,
    MarketCapRank,
    Price,
    MarketCap,
    Volume24h,
    Tvl,
    Tvl7dChange,
    Liquidity,
    Change1h,
    Change24h,
    Change7d,
    Change30d,
    Change90d,
    VolumeChange24h,
    MarketCapDominance,
    Ath,
    AthChange,
    FullyDilutedValue,
    CirculatingSupply,
    TotalSupply,
    MaxSupply,
    Sparkline,
}

/// A value contributed by one source for one field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Rank(u32),
    Series(Vec<f64>),
}

impl FieldValue {
    /// Contributions carrying no information never fill anything
    pub fn is_informative(&self) -> bool {
        match self {
            FieldValue::Number(v) => v.is_finite() && *v != 0.0,
            FieldValue::Text(s) => !s.trim().is_empty(),
            FieldValue::Rank(r) => *r > 0,
            FieldValue::Series(s) => !s.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalAsset {
    // Identity
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub category: String,
    pub image: String,
    /// Provider-reported market-cap rank, 0 when unknown
    pub market_cap_rank: u32,
    /// Output rank after scoring and sorting, 0 until assigned
    pub rank: u32,

    // Live metrics
    pub price: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
    pub tvl: f64,
    pub liquidity: f64,

    // Changes (%)
    pub change_1h: f64,
    pub change_24h: f64,
    pub change_7d: f64,
    pub change_30d: f64,
    pub change_90d: f64,
    pub volume_change_24h: f64,
    pub market_cap_dominance: f64,

    // Supply & valuation
    pub ath: f64,
    pub ath_change: f64,
    #[serde(rename = "fdv")]
    pub fully_diluted_value: f64,
    pub circulating_supply: f64,
    pub total_supply: f64,
    pub max_supply: f64,

    pub sparkline: Vec<f64>,
    pub volatility_7d: f64,
    pub tvl_7d_change: f64,
    pub tvl_30d_change: f64,

    // Order book depth within 1% / 5% of mid, USD
    pub orderbook_depth_1: f64,
    pub orderbook_depth_5: f64,

    // Holder & contract risk attributes
    pub top10_holders_ratio: f64,
    pub holder_count: u64,
    pub is_verified: bool,
    pub audit_status: String,
    pub contract_age_days: u32,

    pub price_history: PriceHistory,
    pub volume_history: VolumeHistory,
    pub tvl_history: TvlHistory,

    pub trust_score: f64,
    pub score_breakdown: ScoreBreakdown,

    /// Which source filled each field
    pub provenance: BTreeMap<AssetField, SourceId>,
}

impl CanonicalAsset {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            ..Default::default()
        }
    }

    fn number(&self, field: AssetField) -> Option<f64> {
        let v = match field {
            AssetField::Price => self.price,
            AssetField::MarketCap => self.market_cap,
            AssetField::Volume24h => self.volume_24h,
            AssetField::Tvl => self.tvl,
            AssetField::Tvl7dChange => self.tvl_7d_change,
            AssetField::Liquidity => self.liquidity,
            AssetField::Change1h => self.change_1h,
            AssetField::Change24h => self.change_24h,
            AssetField::Change7d => self.change_7d,
            AssetField::Change30d => self.change_30d,
            AssetField::Change90d => self.change_90d,
            AssetField::VolumeChange24h => self.volume_change_24h,
            AssetField::MarketCapDominance => self.market_cap_dominance,
            AssetField::Ath => self.ath,
            AssetField::AthChange => self.ath_change,
            AssetField::FullyDilutedValue => self.fully_diluted_value,
            AssetField::CirculatingSupply => self.circulating_supply,
            AssetField::TotalSupply => self.total_supply,
            AssetField::MaxSupply => self.max_supply,
            _ => return None,
        };
        Some(v)
    }

    fn number_mut(&mut self, field: AssetField) -> Option<&mut f64> {
        let slot = match field {
            AssetField::Price => &mut self.price,
            AssetField::MarketCap => &mut self.market_cap,
            AssetField::Volume24h => &mut self.volume_24h,
            AssetField::Tvl => &mut self.tvl,
            AssetField::Tvl7dChange => &mut self.tvl_7d_change,
            AssetField::Liquidity => &mut self.liquidity,
            AssetField::Change1h => &mut self.change_1h,
            AssetField::Change24h => &mut self.change_24h,
            AssetField::Change7d => &mut self.change_7d,
            AssetField::Change30d => &mut self.change_30d,
            AssetField::Change90d => &mut self.change_90d,
            AssetField::VolumeChange24h => &mut self.volume_change_24h,
            AssetField::MarketCapDominance => &mut self.market_cap_dominance,
            AssetField::Ath => &mut self.ath,
            AssetField::AthChange => &mut self.ath_change,
            AssetField::FullyDilutedValue => &mut self.fully_diluted_value,
            AssetField::CirculatingSupply => &mut self.circulating_supply,
            AssetField::TotalSupply => &mut self.total_supply,
            AssetField::MaxSupply => &mut self.max_supply,
            _ => return None,
        };
        Some(slot)
    }

    fn text_mut(&mut self, field: AssetField) -> Option<&mut String> {
        match field {
            AssetField::Id => Some(&mut self.id),
            AssetField::Name => Some(&mut self.name),
            AssetField::Category => Some(&mut self.category),
            AssetField::Image => Some(&mut self.image),
            _ => None,
        }
    }

    /// True when `field` holds no usable value and may be filled
    pub fn is_empty(&self, field: AssetField) -> bool {
        match field {
            AssetField::Id => self.id.trim().is_empty(),
            AssetField::Name => self.name.trim().is_empty(),
            AssetField::Category => self.category.trim().is_empty(),
            AssetField::Image => self.image.trim().is_empty(),
            AssetField::MarketCapRank => self.market_cap_rank == 0,
            AssetField::Sparkline => self.sparkline.is_empty(),
            other => self
                .number(other)
                .map(|v| v == 0.0 || !v.is_finite())
                .unwrap_or(true),
        }
    }

    /// Fill `field` from `source` if it is still empty.
    ///
    /// Returns true when the value was written. A populated field is never
    /// overwritten, and mismatched value kinds are ignored.
    pub fn fill(&mut self, field: AssetField, value: FieldValue, source: SourceId) -> bool {
        if !value.is_informative() || !self.is_empty(field) {
            return false;
        }

        let written = match (field, value) {
            (AssetField::MarketCapRank, FieldValue::Rank(r)) => {
                self.market_cap_rank = r;
                true
            }
            (AssetField::Sparkline, FieldValue::Series(s)) => {
                self.sparkline = s;
                true
            }
            (f, FieldValue::Text(s)) => match self.text_mut(f) {
                Some(slot) => {
                    *slot = s.trim().to_string();
                    true
                }
                None => false,
            },
            (f, FieldValue::Number(v)) => match self.number_mut(f) {
                Some(slot) => {
                    *slot = v;
                    true
                }
                None => false,
            },
            _ => false,
        };

        if written {
            self.provenance.insert(field, source);
        }
        written
    }

    /// Fill every field in `contributions`, in order
    pub fn fill_all<I>(&mut self, contributions: I, source: SourceId) -> usize
    where
        I: IntoIterator<Item = (AssetField, FieldValue)>,
    {
        let mut written = 0;
        for (field, value) in contributions {
            if self.fill(field, value, source) {
                written += 1;
            }
        }
        written
    }

    /// Match on id, symbol or name, case-insensitively
    pub fn matches_identifier(&self, needle: &str) -> bool {
        let needle = needle.trim();
        !needle.is_empty()
            && (self.id.eq_ignore_ascii_case(needle)
                || self.symbol.eq_ignore_ascii_case(needle)
                || self.name.eq_ignore_ascii_case(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("  btc "), "BTC");
        assert_eq!(normalize_symbol("Eth"), "ETH");
        assert_eq!(normalize_name(" Bitcoin "), "bitcoin");
    }

    #[test]
    fn test_fill_forward_never_overrides() {
        let mut asset = CanonicalAsset::new("btc");
        assert_eq!(asset.symbol, "BTC");

        assert!(asset.fill(AssetField::Price, FieldValue::Number(100.0), SourceId::CoinMarketCap));
        assert!(!asset.fill(AssetField::Price, FieldValue::Number(200.0), SourceId::CoinGecko));
        assert_eq!(asset.price, 100.0);
        assert_eq!(asset.provenance[&AssetField::Price], SourceId::CoinMarketCap);
    }

    #[test]
    fn test_uninformative_values_are_skipped() {
        let mut asset = CanonicalAsset::new("ETH");
        assert!(!asset.fill(AssetField::Tvl, FieldValue::Number(0.0), SourceId::DefiLlama));
        assert!(!asset.fill(AssetField::Tvl, FieldValue::Number(f64::NAN), SourceId::DefiLlama));
        assert!(!asset.fill(AssetField::Name, FieldValue::Text("  ".into()), SourceId::CoinGecko));
        assert!(asset.provenance.is_empty());

        // Non-finite existing values count as empty
        asset.tvl = f64::INFINITY;
        assert!(asset.fill(AssetField::Tvl, FieldValue::Number(5.0), SourceId::DefiLlama));
        assert_eq!(asset.tvl, 5.0);
    }

    #[test]
    fn test_mismatched_kind_is_ignored() {
        let mut asset = CanonicalAsset::new("SOL");
        assert!(!asset.fill(AssetField::Price, FieldValue::Text("1.0".into()), SourceId::Messari));
        assert!(!asset.fill(AssetField::Name, FieldValue::Number(1.0), SourceId::Messari));
        assert_eq!(asset.price, 0.0);
    }

    #[test]
    fn test_fill_all_counts_written_fields() {
        let mut asset = CanonicalAsset::new("SOL");
        asset.name = "Solana".into();
        let written = asset.fill_all(
            vec![
                (AssetField::Name, FieldValue::Text("Other".into())),
                (AssetField::MarketCapRank, FieldValue::Rank(5)),
                (AssetField::Sparkline, FieldValue::Series(vec![1.0, 2.0])),
            ],
            SourceId::CoinGecko,
        );
        assert_eq!(written, 2);
        assert_eq!(asset.name, "Solana");
        assert_eq!(asset.market_cap_rank, 5);
    }

    #[test]
    fn test_matches_identifier() {
        let mut asset = CanonicalAsset::new("BTC");
        asset.id = "bitcoin".into();
        asset.name = "Bitcoin".into();
        assert!(asset.matches_identifier("btc"));
        assert!(asset.matches_identifier("BITCOIN"));
        assert!(!asset.matches_identifier(""));
        assert!(!asset.matches_identifier("eth"));
    }

    #[test]
    fn test_longest_price_window() {
        let mut history = PriceHistory::default();
        assert!(history.longest().is_empty());
        history.last_7_days = vec![1.0; 7];
        assert_eq!(history.longest().len(), 7);
        history.last_30_days = vec![1.0; 30];
        assert_eq!(history.longest().len(), 30);
    }
}
