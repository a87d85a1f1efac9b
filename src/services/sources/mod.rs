//! Market data sources
//!
//! One fetcher per provider. Each decodes its provider's response shape into
//! a [`SourcePayload`] and never merges anything itself.

mod coingecko;
mod coinmarketcap;
mod defillama;
mod dexscreener;
mod messari;

pub use coingecko::CoinGeckoFetcher;
pub use coinmarketcap::CoinMarketCapFetcher;
pub use defillama::DefiLlamaFetcher;
pub use dexscreener::DexScreenerFetcher;
pub use messari::MessariFetcher;

use crate::error::Result;
use crate::models::{AppConfig, SourceId, SourcePayload};
use crate::services::http_client::HttpClient;
use crate::services::orchestrator::FetchContext;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Fetch capability for one named provider
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    fn source(&self) -> SourceId;

    async fn fetch(&self, ctx: &FetchContext) -> Result<SourcePayload>;
}

pub type SharedFetcher = Arc<dyn SourceFetcher>;

/// Build the fetchers enabled by `config`.
///
/// Keyed providers (CoinMarketCap, Messari) are skipped when their key is absent.
pub fn default_fetchers(config: &AppConfig, client: &HttpClient) -> Vec<SharedFetcher> {
    let mut fetchers: Vec<SharedFetcher> = Vec::new();

    match &config.coinmarketcap.api_key {
        Some(key) => fetchers.push(Arc::new(CoinMarketCapFetcher::new(
            client.clone(),
            &config.coinmarketcap.base_url,
            key,
        ))),
        None => info!("CMC_API_KEY not set, CoinMarketCap source disabled"),
    }

    fetchers.push(Arc::new(CoinGeckoFetcher::new(
        client.clone(),
        &config.coingecko.base_url,
    )));
    fetchers.push(Arc::new(DefiLlamaFetcher::new(
        client.clone(),
        &config.defillama.base_url,
    )));
    fetchers.push(Arc::new(DexScreenerFetcher::new(
        client.clone(),
        &config.dexscreener.base_url,
    )));

    match &config.messari.api_key {
        Some(key) => fetchers.push(Arc::new(MessariFetcher::new(
            client.clone(),
            &config.messari.base_url,
            key,
        ))),
        None => info!("MESSARI_API_KEY not set, Messari source disabled"),
    }

    fetchers
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_keyed_sources_need_keys() {
        let client = HttpClient::new(Duration::from_secs(1), 1).unwrap();
        let mut config = AppConfig::default();

        let sources: Vec<SourceId> = default_fetchers(&config, &client)
            .iter()
            .map(|f| f.source())
            .collect();
        assert_eq!(
            sources,
            vec![SourceId::CoinGecko, SourceId::DefiLlama, SourceId::DexScreener]
        );

        config.coinmarketcap.api_key = Some("cmc".into());
        config.messari.api_key = Some("messari".into());
        assert_eq!(default_fetchers(&config, &client).len(), 5);
    }
}
