use crate::constants::{CACHE_KEY_MARKET_STATS, MARKET_STATS_CACHE_SECS};
use crate::error::Result;
use crate::models::MarketStats;
use crate::services::cache::TtlCache;
use crate::services::http_client::HttpClient;
use crate::services::sources::CoinGeckoFetcher;
use std::time::Duration;

/// Global market statistics, cached for [`MARKET_STATS_CACHE_SECS`]
pub struct MarketStatsService {
    fetcher: CoinGeckoFetcher,
    cache: TtlCache<MarketStats>,
}

impl MarketStatsService {
    pub fn new(client: HttpClient, coingecko_url: &str) -> Self {
        Self {
            fetcher: CoinGeckoFetcher::new(client, coingecko_url),
            cache: TtlCache::new(Duration::from_secs(MARKET_STATS_CACHE_SECS)),
        }
    }

    pub async fn current(&self) -> Result<MarketStats> {
        self.cache
            .get_or_try_insert_with(CACHE_KEY_MARKET_STATS, || self.fetcher.fetch_global())
            .await
    }

    pub async fn cached_items(&self) -> usize {
        self.cache.len().await
    }

    #[cfg(test)]
    async fn seed(&self, stats: MarketStats) {
        self.cache.insert(CACHE_KEY_MARKET_STATS, stats).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_service() -> MarketStatsService {
        let client = HttpClient::new(Duration::from_millis(200), 1).unwrap();
        MarketStatsService::new(client, "http://127.0.0.1:9")
    }

    #[tokio::test]
    async fn test_cached_stats_served_without_fetch() {
        let service = offline_service();
        service
            .seed(MarketStats {
                total_market_cap: 2.5e12,
                btc_dominance: 52.0,
                ..Default::default()
            })
            .await;

        let stats = service.current().await.unwrap();
        assert_eq!(stats.btc_dominance, 52.0);
        assert_eq!(service.cached_items().await, 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_not_cached() {
        let service = offline_service();
        assert!(service.current().await.is_err());
        assert_eq!(service.cached_items().await, 0);
    }
}
