//! AI asset analysis
//!
//! Builds a structured prompt from an asset's metrics, sends it to a
//! [`TextGenerator`] and caches the answer per symbol.

use crate::error::{AppError, Result};
use crate::models::{normalize_symbol, AnalysisReport, AnalysisRequest, AppConfig};
use crate::services::cache::TtlCache;
use crate::services::http_client::HttpClient;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Text completion capability
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

pub type SharedGenerator = Arc<dyn TextGenerator>;

// ---------------------------------------------------------------------------
// Gemini REST client
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<PartIn<'a>>,
}

#[derive(Debug, Serialize)]
struct PartIn<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartOut>,
}

#[derive(Debug, Default, Deserialize)]
struct PartOut {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .filter(|t| !t.trim().is_empty())
    }
}

pub struct GeminiClient {
    client: HttpClient,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(client: HttpClient, base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// `None` when no API key is configured
    pub fn from_config(config: &AppConfig, client: &HttpClient) -> Option<Self> {
        config.gemini_api_key.as_deref().map(|key| {
            Self::new(
                client.clone(),
                &config.gemini_api_url,
                &config.gemini_model,
                key,
            )
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![PartIn { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                top_p: 0.9,
                max_output_tokens: 5000,
            },
        };

        let response: GenerateResponse = self
            .client
            .post_json(&self.endpoint(), &body)
            .await
            .map_err(|e| AppError::Analysis(format!("generation failed: {}", e)))?;

        response
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| AppError::Analysis("empty response from model".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Analysis service
// ---------------------------------------------------------------------------

pub struct AnalysisService {
    generator: SharedGenerator,
    cache: TtlCache<AnalysisReport>,
}

impl AnalysisService {
    pub fn new(generator: SharedGenerator, cache_ttl: Duration) -> Self {
        Self {
            generator,
            cache: TtlCache::new(cache_ttl),
        }
    }

    pub async fn cached_items(&self) -> usize {
        self.cache.len().await
    }

    /// Analyse one asset. Returns the report and whether it came from cache.
    #[instrument(skip_all, fields(symbol = %request.symbol))]
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<(AnalysisReport, bool)> {
        request.validate().map_err(AppError::InvalidInput)?;

        let key = format!("analysis_{}", normalize_symbol(&request.symbol));
        let generated = AtomicBool::new(false);

        let report = self
            .cache
            .get_or_try_insert_with(&key, || async {
                generated.store(true, Ordering::Relaxed);
                info!("Generating analysis for {} ({})", request.name, request.symbol);

                let answer = self.generator.generate(&build_prompt(request)).await?;
                Ok(AnalysisReport {
                    analysis: strip_code_fences(&answer),
                    generated_at: Utc::now(),
                })
            })
            .await?;

        Ok((report, !generated.load(Ordering::Relaxed)))
    }
}

/// Remove a surrounding Markdown code fence (```json ... ```)
pub fn strip_code_fences(text: &str) -> String {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest;
    } else if let Some(rest) = body.strip_prefix("```") {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim().to_string()
}

fn guarded_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 && denominator.is_finite() && numerator.is_finite() {
        Some(numerator / denominator)
    } else {
        None
    }
}

fn format_ratio(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_else(|| "n/a".to_string())
}

/// Prompt asking for a single JSON document
pub fn build_prompt(req: &AnalysisRequest) -> String {
    let fdv = if req.total_supply > 0.0 {
        req.price * req.total_supply
    } else {
        req.market_cap
    };
    let circulating_pct = guarded_ratio(req.circulating_supply, req.max_supply).map(|r| r * 100.0);
    let velocity = guarded_ratio(req.volume_24h, req.market_cap);
    let liquidity_ratio = guarded_ratio(req.liquidity, req.market_cap).map(|r| r * 100.0);

    format!(
        r#"You are AlphaAgent, a senior crypto market analyst. Analyse the token below and propose a concrete trading strategy.

Answer with a single JSON document and nothing else:

{{
  "summary": "one-line assessment (under 30 words)",
  "growth_potential": {{ "score": 0-100, "reason": "core reason" }},
  "technical_analysis": {{
    "trend": "Uptrend | Downtrend | Accumulation | Distribution",
    "strength": "Very Strong | Strong | Weak | Neutral",
    "key_levels": "nearest support and resistance"
  }},
  "risk_analysis": {{ "level": "Low | Medium | High | Extreme", "concerns": ["...", "..."] }},
  "recommendation": {{ "action": "BUY | ACCUMULATE | HOLD | SELL | WATCH", "entry_zone": "...", "target": "..." }},
  "trading_plan": {{
    "buy_strategy": "...",
    "sell_targets": ["TP1", "TP2", "TP3"],
    "stop_loss": "...",
    "time_horizon": "Short | Medium | Long term"
  }},
  "insights": ["liquidity and volume vs market cap", "what 30d/90d moves say about flows", "correlation with the broad market"]
}}

MARKET DATA:
- Token: {name} ({symbol}) | Rank: #{rank}
- Price: ${price:.6}
- Change: 24h {c24:.2}% | 7d {c7:.2}%
- Medium term: 30d {c30:.2}% | 90d {c90:.2}%
- Market cap: ${mcap:.2} | FDV: ${fdv:.2}
- Circulating supply: {circ}% of max
- Volume 24h: ${vol:.2} (Vol/Mcap: {velocity})
- Liquidity: ${liq:.2} ({liq_ratio}% of Mcap) | TVL: ${tvl:.2}
- Holders: {holders}
- Trust score: {score:.1}/100

RULES:
1. If liquidity is under 1% of market cap, warn about liquidity risk.
2. If FDV is far above market cap, warn about token inflation.
3. Derive TP/SL levels from the current price and the 7d/30d moves."#,
        name = req.name,
        symbol = req.symbol,
        rank = req.rank,
        price = req.price,
        c24 = req.change_24h,
        c7 = req.change_7d,
        c30 = req.change_30d,
        c90 = req.change_90d,
        mcap = req.market_cap,
        fdv = fdv,
        circ = format_ratio(circulating_pct, 1),
        vol = req.volume_24h,
        velocity = format_ratio(velocity, 4),
        liq = req.liquidity,
        liq_ratio = format_ratio(liquidity_ratio, 2),
        tvl = req.tvl,
        holders = req.holder_count,
        score = req.trust_score,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct CannedGenerator {
        answer: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(AppError::Analysis("quota exceeded".to_string()))
        }
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            symbol: "sol".into(),
            name: "Solana".into(),
            price: 150.0,
            market_cap: 70e9,
            volume_24h: 3e9,
            ..Default::default()
        }
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```  "), "{}");
        assert_eq!(strip_code_fences("{\"plain\":true}"), "{\"plain\":true}");
    }

    #[test]
    fn test_prompt_guards_zero_denominators() {
        let prompt = build_prompt(&AnalysisRequest {
            symbol: "X".into(),
            name: "Unknown".into(),
            ..Default::default()
        });
        assert!(prompt.contains("Vol/Mcap: n/a"));
        assert!(prompt.contains("Circulating supply: n/a% of max"));
        assert!(!prompt.contains("NaN"));

        let prompt = build_prompt(&request());
        assert!(prompt.contains("Solana (sol)"));
        assert!(prompt.contains("Vol/Mcap: 0.0429"));
    }

    #[tokio::test]
    async fn test_analysis_cached_per_symbol() {
        let generator = Arc::new(CannedGenerator {
            answer: "```json\n{\"summary\":\"ok\"}\n```".into(),
            calls: AtomicUsize::new(0),
        });
        let service = AnalysisService::new(generator.clone(), Duration::from_secs(60));

        let (first, cached) = service.analyze(&request()).await.unwrap();
        assert!(!cached);
        assert_eq!(first.analysis, "{\"summary\":\"ok\"}");

        // Same symbol, different case
        let mut again = request();
        again.symbol = "SOL".into();
        let (second, cached) = service.analyze(&again).await.unwrap();
        assert!(cached);
        assert_eq!(second, first);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_request_and_generator_failure() {
        let service = AnalysisService::new(Arc::new(FailingGenerator), Duration::from_secs(60));

        let missing = AnalysisRequest::default();
        assert!(matches!(
            service.analyze(&missing).await,
            Err(AppError::InvalidInput(_))
        ));

        assert!(matches!(
            service.analyze(&request()).await,
            Err(AppError::Analysis(_))
        ));
        assert_eq!(service.cached_items().await, 0);
    }

    #[test]
    fn test_gemini_response_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"hello"}]}}]}"#;
        let response: GenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.first_text(), Some("hello"));

        let empty: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.first_text(), None);
    }
}
