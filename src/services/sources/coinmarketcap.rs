use super::SourceFetcher;
use crate::constants::CMC_LISTING_LIMIT;
use crate::error::Result;
use crate::models::payloads::CoinMarketCapResponse;
use crate::models::{SourceId, SourcePayload};
use crate::services::http_client::HttpClient;
use crate::services::orchestrator::FetchContext;
use async_trait::async_trait;
use tracing::{info, instrument};

/// Primary listings source: `GET /v1/cryptocurrency/listings/latest`
pub struct CoinMarketCapFetcher {
    client: HttpClient,
    base_url: String,
    api_key: String,
}

impl CoinMarketCapFetcher {
    pub fn new(client: HttpClient, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn listings_url(&self) -> String {
        format!(
            "{}/v1/cryptocurrency/listings/latest?limit={}",
            self.base_url, CMC_LISTING_LIMIT
        )
    }
}

#[async_trait]
impl SourceFetcher for CoinMarketCapFetcher {
    fn source(&self) -> SourceId {
        SourceId::CoinMarketCap
    }

    #[instrument(skip_all, name = "coinmarketcap")]
    async fn fetch(&self, _ctx: &FetchContext) -> Result<SourcePayload> {
        let response: CoinMarketCapResponse = self
            .client
            .get_json(
                self.source(),
                &self.listings_url(),
                &[("X-CMC_PRO_API_KEY", self.api_key.as_str())],
            )
            .await?;

        info!("Fetched {} listings from CoinMarketCap", response.data.len());
        Ok(SourcePayload::CoinMarketCap(response.data))
    }
}
