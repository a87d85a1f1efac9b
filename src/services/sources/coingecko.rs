use super::SourceFetcher;
use crate::constants::{COINGECKO_PAGES, COINGECKO_PER_PAGE};
use crate::error::{AppError, Result};
use crate::models::payloads::{CoinGeckoGlobalResponse, CoinGeckoMarket};
use crate::models::{MarketStats, SourceId, SourcePayload};
use crate::services::http_client::HttpClient;
use crate::services::orchestrator::FetchContext;
use async_trait::async_trait;
use futures::future::join_all;
use tracing::{info, instrument, warn};

/// Broad-market source: `GET /coins/markets`, several pages per cycle
pub struct CoinGeckoFetcher {
    client: HttpClient,
    base_url: String,
}

impl CoinGeckoFetcher {
    pub fn new(client: HttpClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn markets_url(&self, page: u32) -> String {
        format!(
            "{}/coins/markets?vs_currency=usd&order=market_cap_desc&per_page={}&page={}&sparkline=true&price_change_percentage=1h,7d,30d",
            self.base_url, COINGECKO_PER_PAGE, page
        )
    }

    async fn fetch_page(&self, page: u32) -> Result<Vec<CoinGeckoMarket>> {
        self.client
            .get_json(self.source(), &self.markets_url(page), &[])
            .await
    }

    /// Global market statistics from `GET /global`
    pub async fn fetch_global(&self) -> Result<MarketStats> {
        let url = format!("{}/global", self.base_url);
        let response: CoinGeckoGlobalResponse =
            self.client.get_json(self.source(), &url, &[]).await?;
        Ok(MarketStats::from(response.data))
    }
}

#[async_trait]
impl SourceFetcher for CoinGeckoFetcher {
    fn source(&self) -> SourceId {
        SourceId::CoinGecko
    }

    /// A failed page is skipped; the source only fails when every page fails.
    #[instrument(skip_all, name = "coingecko")]
    async fn fetch(&self, _ctx: &FetchContext) -> Result<SourcePayload> {
        let pages: Vec<u32> = (1..=COINGECKO_PAGES).collect();
        let results = join_all(pages.iter().map(|&page| self.fetch_page(page))).await;

        let mut markets = Vec::new();
        let mut first_error: Option<AppError> = None;
        let mut failed_pages = 0;

        for (page, result) in pages.iter().zip(results) {
            match result {
                Ok(mut batch) => markets.append(&mut batch),
                Err(e) => {
                    warn!("CoinGecko page {} failed: {}", page, e);
                    failed_pages += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        if failed_pages == pages.len() {
            return Err(first_error.unwrap_or(AppError::SourceUnavailable {
                provider: SourceId::CoinGecko,
                reason: "no pages fetched".to_string(),
            }));
        }

        info!(
            "Fetched {} markets from CoinGecko ({} page(s) failed)",
            markets.len(),
            failed_pages
        );
        Ok(SourcePayload::CoinGecko(markets))
    }
}
