use super::SourceFetcher;
use crate::constants::MESSARI_ASSET_LIMIT;
use crate::error::Result;
use crate::models::payloads::MessariResponse;
use crate::models::{SourceId, SourcePayload};
use crate::services::http_client::HttpClient;
use crate::services::orchestrator::FetchContext;
use async_trait::async_trait;
use tracing::{info, instrument};

/// Fundamentals source: `GET /v2/assets`
pub struct MessariFetcher {
    client: HttpClient,
    base_url: String,
    api_key: String,
}

impl MessariFetcher {
    pub fn new(client: HttpClient, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl SourceFetcher for MessariFetcher {
    fn source(&self) -> SourceId {
        SourceId::Messari
    }

    #[instrument(skip_all, name = "messari")]
    async fn fetch(&self, _ctx: &FetchContext) -> Result<SourcePayload> {
        let url = format!("{}/v2/assets?limit={}", self.base_url, MESSARI_ASSET_LIMIT);
        let response: MessariResponse = self
            .client
            .get_json(
                self.source(),
                &url,
                &[("X-Messari-API-Key", self.api_key.as_str())],
            )
            .await?;

        info!("Fetched {} assets from Messari", response.data.len());
        Ok(SourcePayload::Messari(response.data))
    }
}
