use super::SourceFetcher;
use crate::constants::DEXSCREENER_TOKEN_ADDRESSES;
use crate::error::{AppError, Result};
use crate::models::payloads::DexScreenerResponse;
use crate::models::{normalize_symbol, SourceId, SourcePayload};
use crate::services::http_client::HttpClient;
use crate::services::orchestrator::FetchContext;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// DEX liquidity source: `GET /dex/tokens/{address}` per configured token
pub struct DexScreenerFetcher {
    client: HttpClient,
    base_url: String,
    addresses: Vec<String>,
}

impl DexScreenerFetcher {
    pub fn new(client: HttpClient, base_url: &str) -> Self {
        Self::with_addresses(
            client,
            base_url,
            DEXSCREENER_TOKEN_ADDRESSES.iter().map(|a| a.to_string()).collect(),
        )
    }

    pub fn with_addresses(client: HttpClient, base_url: &str, addresses: Vec<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            addresses,
        }
    }
}

/// Key responses by the symbol of the token each one was queried for.
/// Pairs where that token is only the quote side are dropped, as are
/// responses with no remaining pairs. The first response for a symbol wins.
fn key_by_symbol(
    responses: impl IntoIterator<Item = (String, DexScreenerResponse)>,
) -> BTreeMap<String, DexScreenerResponse> {
    let mut keyed = BTreeMap::new();
    for (address, response) in responses {
        let own = response.for_base_token(&address);
        let symbol = match own.pairs().first() {
            Some(pair) => normalize_symbol(&pair.base_token.symbol),
            None => {
                debug!("DexScreener {}: no pairs with it as base token", address);
                continue;
            }
        };
        if symbol.is_empty() {
            continue;
        }
        keyed.entry(symbol).or_insert(own);
    }
    keyed
}

#[async_trait]
impl SourceFetcher for DexScreenerFetcher {
    fn source(&self) -> SourceId {
        SourceId::DexScreener
    }

    #[instrument(skip_all, name = "dexscreener")]
    async fn fetch(&self, _ctx: &FetchContext) -> Result<SourcePayload> {
        let requests = self.addresses.iter().map(|address| {
            let url = format!("{}/dex/tokens/{}", self.base_url, address);
            async move {
                let result: Result<DexScreenerResponse> =
                    self.client.get_json(self.source(), &url, &[]).await;
                (address, result)
            }
        });

        let mut responses = Vec::new();
        let mut last_error: Option<AppError> = None;
        for (address, result) in join_all(requests).await {
            match result {
                Ok(response) => {
                    debug!("DexScreener {}: {} pair(s)", address, response.pairs().len());
                    responses.push((address.clone(), response));
                }
                Err(e) => {
                    warn!("DexScreener lookup for {} failed: {}", address, e);
                    last_error = Some(e);
                }
            }
        }

        if responses.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        let keyed = key_by_symbol(responses);
        info!("Fetched DexScreener pairs for {} token(s)", keyed.len());
        Ok(SourcePayload::DexScreener(keyed))
    }
}
