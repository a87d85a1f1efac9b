use crate::constants::*;
use crate::utils::{get_env, get_env_duration, get_env_opt, get_env_parsed};
use std::time::Duration;

/// Base URL and optional API key for one provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl ProviderConfig {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim().trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

/// Runtime configuration, loaded from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,

    /// Snapshot cache lifetime
    pub token_cache_duration: Duration,
    /// Per-symbol analysis cache lifetime
    pub analysis_cache_duration: Duration,

    /// Deadline for one whole fetch cycle
    pub fetch_timeout: Duration,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    pub http_max_retries: u32,

    pub coinmarketcap: ProviderConfig,
    pub coingecko: ProviderConfig,
    pub defillama: ProviderConfig,
    pub dexscreener: ProviderConfig,
    pub messari: ProviderConfig,

    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_api_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            token_cache_duration: Duration::from_secs(5 * 60),
            analysis_cache_duration: Duration::from_secs(60 * 60),
            fetch_timeout: Duration::from_secs(20),
            http_timeout: Duration::from_secs(10),
            http_max_retries: 3,
            coinmarketcap: ProviderConfig::new(DEFAULT_CMC_API_URL, None),
            coingecko: ProviderConfig::new(DEFAULT_COINGECKO_API_URL, None),
            defillama: ProviderConfig::new(DEFAULT_DEFILLAMA_API_URL, None),
            dexscreener: ProviderConfig::new(DEFAULT_DEXSCREENER_API_URL, None),
            messari: ProviderConfig::new(DEFAULT_MESSARI_API_URL, None),
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_api_url: DEFAULT_GEMINI_API_URL.to_string(),
        }
    }
}

impl AppConfig {
    /// Load from environment variables, every key falling back to its default.
    /// Call `dotenv::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            port: get_env_parsed("PORT", defaults.port),
            token_cache_duration: get_env_duration(
                "TOKEN_CACHE_DURATION",
                defaults.token_cache_duration,
            ),
            analysis_cache_duration: get_env_duration(
                "ANALYSIS_CACHE_DURATION",
                defaults.analysis_cache_duration,
            ),
            fetch_timeout: get_env_duration("FETCH_TIMEOUT", defaults.fetch_timeout),
            http_timeout: get_env_duration("HTTP_TIMEOUT", defaults.http_timeout),
            http_max_retries: get_env_parsed("HTTP_MAX_RETRIES", defaults.http_max_retries),
            coinmarketcap: ProviderConfig::new(
                get_env("CMC_API_URL", DEFAULT_CMC_API_URL),
                get_env_opt("CMC_API_KEY"),
            ),
            coingecko: ProviderConfig::new(
                get_env("COINGECKO_API_URL", DEFAULT_COINGECKO_API_URL),
                None,
            ),
            defillama: ProviderConfig::new(
                get_env("DEFILLAMA_API_URL", DEFAULT_DEFILLAMA_API_URL),
                None,
            ),
            dexscreener: ProviderConfig::new(
                get_env("DEXSCREENER_API_URL", DEFAULT_DEXSCREENER_API_URL),
                None,
            ),
            messari: ProviderConfig::new(
                get_env("MESSARI_API_URL", DEFAULT_MESSARI_API_URL),
                get_env_opt("MESSARI_API_KEY"),
            ),
            gemini_api_key: get_env_opt("GEMINI_API_KEY"),
            gemini_model: get_env("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            gemini_api_url: get_env("GEMINI_API_URL", DEFAULT_GEMINI_API_URL),
        }
    }
}
