//! Provider response shapes
//!
//! Each provider is decoded into its own payload type. Numeric fields are
//! `Option<f64>` because every provider sends `null` for unknown figures.

use super::SourceId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// CoinMarketCap
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinMarketCapResponse {
    #[serde(default)]
    pub data: Vec<CoinMarketCapCoin>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoinMarketCapCoin {
    pub id: u64,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub cmc_rank: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub circulating_supply: Option<f64>,
    pub total_supply: Option<f64>,
    pub max_supply: Option<f64>,
    #[serde(default)]
    pub quote: CoinMarketCapQuote,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoinMarketCapQuote {
    #[serde(rename = "USD", default)]
    pub usd: CoinMarketCapUsd,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoinMarketCapUsd {
    pub price: Option<f64>,
    pub volume_24h: Option<f64>,
    pub volume_change_24h: Option<f64>,
    pub percent_change_1h: Option<f64>,
    pub percent_change_24h: Option<f64>,
    pub percent_change_7d: Option<f64>,
    pub percent_change_30d: Option<f64>,
    pub percent_change_90d: Option<f64>,
    pub market_cap: Option<f64>,
    pub market_cap_dominance: Option<f64>,
    pub fully_diluted_market_cap: Option<f64>,
}

// ---------------------------------------------------------------------------
// CoinGecko
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoinGeckoMarket {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: Option<String>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub market_cap_rank: Option<u32>,
    pub fully_diluted_valuation: Option<f64>,
    pub total_volume: Option<f64>,
    pub ath: Option<f64>,
    pub ath_change_percentage: Option<f64>,
    pub price_change_percentage_1h_in_currency: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
    pub price_change_percentage_7d_in_currency: Option<f64>,
    pub price_change_percentage_30d_in_currency: Option<f64>,
    pub sparkline_in_7d: Option<CoinGeckoSparkline>,
    pub circulating_supply: Option<f64>,
    pub total_supply: Option<f64>,
    pub max_supply: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoinGeckoSparkline {
    #[serde(default)]
    pub price: Vec<f64>,
}

impl CoinGeckoMarket {
    pub fn sparkline(&self) -> &[f64] {
        self.sparkline_in_7d
            .as_ref()
            .map(|s| s.price.as_slice())
            .unwrap_or(&[])
    }
}

/// `GET /global`
#[derive(Debug, Clone, Deserialize)]
pub struct CoinGeckoGlobalResponse {
    pub data: CoinGeckoGlobalData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoinGeckoGlobalData {
    #[serde(default)]
    pub total_market_cap: BTreeMap<String, f64>,
    #[serde(default)]
    pub total_volume: BTreeMap<String, f64>,
    #[serde(default)]
    pub market_cap_percentage: BTreeMap<String, f64>,
    #[serde(default)]
    pub market_cap_change_percentage_24h_usd: f64,
}

// ---------------------------------------------------------------------------
// DeFiLlama
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefiLlamaProtocol {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    pub tvl: Option<f64>,
    pub category: Option<String>,
    pub change_7d: Option<f64>,
}

// ---------------------------------------------------------------------------
// DexScreener
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DexScreenerResponse {
    #[serde(default)]
    pub pairs: Option<Vec<DexScreenerPair>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DexScreenerPair {
    #[serde(rename = "baseToken", default)]
    pub base_token: DexBaseToken,
    #[serde(default)]
    pub liquidity: Option<DexLiquidity>,
    #[serde(default)]
    pub volume: Option<DexVolume>,
    #[serde(rename = "priceUsd")]
    pub price_usd: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DexBaseToken {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DexLiquidity {
    pub usd: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DexVolume {
    pub h24: Option<f64>,
}

impl DexScreenerResponse {
    pub fn pairs(&self) -> &[DexScreenerPair] {
        self.pairs.as_deref().unwrap_or(&[])
    }

    /// Summed USD liquidity across all pairs
    pub fn total_liquidity(&self) -> f64 {
        self.pairs()
            .iter()
            .filter_map(|p| p.liquidity.as_ref().and_then(|l| l.usd))
            .filter(|v| v.is_finite())
            .sum()
    }

    /// Summed 24h volume across all pairs
    pub fn total_volume_24h(&self) -> f64 {
        self.pairs()
            .iter()
            .filter_map(|p| p.volume.as_ref().and_then(|v| v.h24))
            .filter(|v| v.is_finite())
            .sum()
    }

    /// Price quoted by the first pair, when it parses
    pub fn first_price(&self) -> Option<f64> {
        self.pairs()
            .first()
            .and_then(|p| p.price_usd.as_deref())
            .and_then(|s| s.parse::<f64>().ok())
    }

    /// Only the pairs where `address` is the base token. A token lookup
    /// also returns pools that quote it against something else.
    pub fn for_base_token(&self, address: &str) -> DexScreenerResponse {
        let pairs = self
            .pairs()
            .iter()
            .filter(|p| p.base_token.address.eq_ignore_ascii_case(address))
            .cloned()
            .collect();
        DexScreenerResponse { pairs: Some(pairs) }
    }

    /// Base token name of the first pair
    pub fn base_name(&self) -> Option<&str> {
        self.pairs()
            .first()
            .map(|p| p.base_token.name.as_str())
            .filter(|n| !n.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Messari
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessariResponse {
    #[serde(default)]
    pub data: Vec<MessariAsset>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessariAsset {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub market_data: Option<MessariMarketData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessariMarketData {
    pub price_usd: Option<f64>,
    pub volume_last_24_hours: Option<f64>,
    pub market_cap_usd: Option<f64>,
}

// ---------------------------------------------------------------------------
// Per-source payload
// ---------------------------------------------------------------------------

/// Decoded result of one source fetch
#[derive(Debug, Clone)]
pub enum SourcePayload {
    CoinMarketCap(Vec<CoinMarketCapCoin>),
    CoinGecko(Vec<CoinGeckoMarket>),
    DefiLlama(Vec<DefiLlamaProtocol>),
    /// Keyed by upper-cased base token symbol
    DexScreener(BTreeMap<String, DexScreenerResponse>),
    Messari(Vec<MessariAsset>),
}

impl SourcePayload {
    pub fn source(&self) -> SourceId {
        match self {
            SourcePayload::CoinMarketCap(_) => SourceId::CoinMarketCap,
            SourcePayload::CoinGecko(_) => SourceId::CoinGecko,
            SourcePayload::DefiLlama(_) => SourceId::DefiLlama,
            SourcePayload::DexScreener(_) => SourceId::DexScreener,
            SourcePayload::Messari(_) => SourceId::Messari,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SourcePayload::CoinMarketCap(v) => v.len(),
            SourcePayload::CoinGecko(v) => v.len(),
            SourcePayload::DefiLlama(v) => v.len(),
            SourcePayload::DexScreener(v) => v.len(),
            SourcePayload::Messari(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
