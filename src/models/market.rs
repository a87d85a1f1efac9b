use super::payloads::CoinGeckoGlobalData;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Global market statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketStats {
    pub total_market_cap: f64,
    pub total_volume: f64,
    pub market_cap_percentage: BTreeMap<String, f64>,
    pub market_cap_change_24h: f64,
    pub btc_dominance: f64,
    pub eth_dominance: f64,
}

impl From<CoinGeckoGlobalData> for MarketStats {
    fn from(data: CoinGeckoGlobalData) -> Self {
        let usd = |m: &BTreeMap<String, f64>| m.get("usd").copied().unwrap_or(0.0);
        let dominance = |key: &str| data.market_cap_percentage.get(key).copied().unwrap_or(0.0);

        Self {
            total_market_cap: usd(&data.total_market_cap),
            total_volume: usd(&data.total_volume),
            btc_dominance: dominance("btc"),
            eth_dominance: dominance("eth"),
            market_cap_change_24h: data.market_cap_change_percentage_24h_usd,
            market_cap_percentage: data.market_cap_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::payloads::CoinGeckoGlobalResponse;

    #[test]
    fn test_from_coingecko_global() {
        let body = r#"{"data":{"total_market_cap":{"usd":2.5e12,"eur":2.3e12},
            "total_volume":{"usd":9.0e10},
            "market_cap_percentage":{"btc":52.1,"eth":17.3},
            "market_cap_change_percentage_24h_usd":-1.25}}"#;
        let resp: CoinGeckoGlobalResponse = serde_json::from_str(body).unwrap();
        let stats = MarketStats::from(resp.data);

        assert_eq!(stats.total_market_cap, 2.5e12);
        assert_eq!(stats.total_volume, 9.0e10);
        assert_eq!(stats.btc_dominance, 52.1);
        assert_eq!(stats.eth_dominance, 17.3);
        assert_eq!(stats.market_cap_change_24h, -1.25);
        assert_eq!(stats.market_cap_percentage.len(), 2);
    }
}
