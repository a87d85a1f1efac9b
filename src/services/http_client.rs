//! Provider HTTP client
//!
//! Thin wrapper over `reqwest` shared by every source fetcher:
//! - Per-request timeout
//! - Exponential backoff with jitter on network errors, 429 and 5xx
//! - Other 4xx statuses fail immediately
//! - Body decode failures surface as `MalformedPayload` for the calling source

use crate::constants::USER_AGENT;
use crate::error::AppError;
use crate::models::SourceId;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Backoff delays are capped at this many seconds
const MAX_BACKOFF_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
}

impl HttpClient {
    pub fn new(timeout: Duration, max_retries: u32) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_retries: max_retries.max(1),
        })
    }

    /// GET `url` and decode the JSON body as `T`
    ///
    /// # Arguments
    /// * `source` - Provider the request belongs to, used for error attribution
    /// * `headers` - Extra headers (API keys)
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        source: SourceId,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let body = self.get_text(source, url, headers).await?;
        decode_body(source, &body)
    }

    /// POST a JSON body and decode the JSON answer as `T`
    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, AppError>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Network(format!("HTTP {}: {}", status, text)));
        }
        Ok(response.json::<T>().await?)
    }

    /// GET `url` with retry, returning the raw body on success
    pub async fn get_text(
        &self,
        source: SourceId,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<String, AppError> {
        let mut last_error = String::from("no attempt made");

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                info!(
                    source = %source,
                    "Retry backoff: attempt {}/{}, waiting {:.1}s",
                    attempt + 1,
                    self.max_retries,
                    delay.as_secs_f64()
                );
                sleep(delay).await;
            }

            let mut request = self.client.get(url).header("Accept", "application/json");
            for (name, value) in headers {
                request = request.header(*name, *value);
            }

            debug!(source = %source, "GET {}", url);
            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) => {
                    warn!(source = %source, "Request failed (attempt {}): {}", attempt + 1, e);
                    last_error = e.to_string();
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                match response.text().await {
                    Ok(body) => return Ok(body),
                    Err(e) => {
                        warn!(source = %source, "Failed to read body (attempt {}): {}", attempt + 1, e);
                        last_error = e.to_string();
                        continue;
                    }
                }
            }

            if is_retryable(status) {
                warn!(source = %source, "HTTP {} (attempt {}), retrying", status, attempt + 1);
                last_error = format!("HTTP {}", status);
                continue;
            }

            // Other client errors are final
            return Err(AppError::SourceUnavailable {
                provider: source,
                reason: format!("HTTP {}", status),
            });
        }

        Err(AppError::SourceUnavailable {
            provider: source,
            reason: format!("max retries exceeded: {}", last_error),
        })
    }
}

/// Decode a provider body, attributing failures to `source`
fn decode_body<T: DeserializeOwned>(source: SourceId, body: &str) -> Result<T, AppError> {
    serde_json::from_str::<T>(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        warn!(source = %source, "JSON decode error: {} (body: {})", e, preview);
        AppError::MalformedPayload {
            provider: source,
            reason: e.to_string(),
        }
    })
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// `2^(attempt-1)` seconds plus up to one second of jitter
fn backoff_delay(attempt: u32) -> Duration {
    let base = 2.0_f64.powi(attempt.saturating_sub(1) as i32);
    let delay = Duration::from_secs_f64(base + rand::random::<f64>());
    delay.min(Duration::from_secs(MAX_BACKOFF_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_backoff_delay_grows_and_caps() {
        let first = backoff_delay(1);
        assert!(first >= Duration::from_secs(1) && first < Duration::from_secs(2));

        let third = backoff_delay(3);
        assert!(third >= Duration::from_secs(4) && third < Duration::from_secs(5));

        assert_eq!(backoff_delay(20), Duration::from_secs(MAX_BACKOFF_SECS));
    }

    #[test]
    fn test_bad_body_is_malformed_payload() {
        use crate::models::payloads::DefiLlamaProtocol;

        let err = decode_body::<Vec<DefiLlamaProtocol>>(SourceId::DefiLlama, r#"{"error":"oops"}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::MalformedPayload { provider: SourceId::DefiLlama, .. }
        ));
        assert!(err.is_source_failure());

        let err = decode_body::<serde_json::Value>(SourceId::CoinGecko, "<html>").unwrap_err();
        assert!(matches!(err, AppError::MalformedPayload { .. }));

        let ok: Vec<DefiLlamaProtocol> =
            decode_body(SourceId::DefiLlama, r#"[{"name":"Lido","symbol":"LDO","tvl":1.0}]"#).unwrap();
        assert_eq!(ok[0].symbol, "LDO");
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_get_json_live() {
        let client = HttpClient::new(Duration::from_secs(10), 1).unwrap();
        let value: serde_json::Value = client
            .get_json(SourceId::CoinGecko, "https://api.coingecko.com/api/v3/ping", &[])
            .await
            .unwrap();
        assert!(value.get("gecko_says").is_some());
    }
}
