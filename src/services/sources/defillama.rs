use super::SourceFetcher;
use crate::error::Result;
use crate::models::payloads::DefiLlamaProtocol;
use crate::models::{SourceId, SourcePayload};
use crate::services::http_client::HttpClient;
use crate::services::orchestrator::FetchContext;
use async_trait::async_trait;
use tracing::{info, instrument};

/// TVL source: `GET /protocols`
pub struct DefiLlamaFetcher {
    client: HttpClient,
    base_url: String,
}

impl DefiLlamaFetcher {
    pub fn new(client: HttpClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SourceFetcher for DefiLlamaFetcher {
    fn source(&self) -> SourceId {
        SourceId::DefiLlama
    }

    #[instrument(skip_all, name = "defillama")]
    async fn fetch(&self, _ctx: &FetchContext) -> Result<SourcePayload> {
        let url = format!("{}/protocols", self.base_url);
        let protocols: Vec<DefiLlamaProtocol> =
            self.client.get_json(self.source(), &url, &[]).await?;

        info!("Fetched {} protocols from DeFiLlama", protocols.len());
        Ok(SourcePayload::DefiLlama(protocols))
    }
}
