use serde::{Deserialize, Serialize};
use std::fmt;

/// Market data providers known to the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceId {
    CoinMarketCap,
    CoinGecko,
    DefiLlama,
    DexScreener,
    Messari,
}

impl SourceId {
    pub const ALL: [SourceId; 5] = [
        SourceId::CoinMarketCap,
        SourceId::CoinGecko,
        SourceId::DefiLlama,
        SourceId::DexScreener,
        SourceId::Messari,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::CoinMarketCap => "CoinMarketCap",
            SourceId::CoinGecko => "CoinGecko",
            SourceId::DefiLlama => "DeFiLlama",
            SourceId::DexScreener => "DexScreener",
            SourceId::Messari => "Messari",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "coinmarketcap" | "cmc" => Ok(SourceId::CoinMarketCap),
            "coingecko" | "cg" => Ok(SourceId::CoinGecko),
            "defillama" => Ok(SourceId::DefiLlama),
            "dexscreener" | "dex" => Ok(SourceId::DexScreener),
            "messari" => Ok(SourceId::Messari),
            _ => Err(format!(
                "Invalid source: {}. Valid options: coinmarketcap, coingecko, defillama, dexscreener, messari",
                s
            )),
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
