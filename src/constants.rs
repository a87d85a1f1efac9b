//! Provider Endpoints and Pipeline Constants
//!
//! Default base URLs for every market data provider, plus the fixed request
//! parameters the fetchers use. All base URLs can be overridden from the
//! environment (see `AppConfig`).

/// Default CoinMarketCap Pro API base URL
pub const DEFAULT_CMC_API_URL: &str = "https://pro-api.coinmarketcap.com";

/// Default CoinGecko API base URL
pub const DEFAULT_COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// Default DeFiLlama API base URL
pub const DEFAULT_DEFILLAMA_API_URL: &str = "https://api.llama.fi";

/// Default DexScreener API base URL
pub const DEFAULT_DEXSCREENER_API_URL: &str = "https://api.dexscreener.com/latest";

/// Default Messari API base URL
pub const DEFAULT_MESSARI_API_URL: &str = "https://data.messari.io/api";

/// Default Gemini REST API base URL
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default Gemini model
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Listings requested from CoinMarketCap in one call
pub const CMC_LISTING_LIMIT: usize = 2000;

/// CoinGecko market pages fetched per cycle (250 coins per page)
pub const COINGECKO_PAGES: u32 = 4;
pub const COINGECKO_PER_PAGE: u32 = 250;

/// Assets requested from Messari in one call
pub const MESSARI_ASSET_LIMIT: usize = 500;

/// Solana token addresses looked up on DexScreener (SOL, BONK, USDC)
pub const DEXSCREENER_TOKEN_ADDRESSES: &[&str] = &[
    "So11111111111111111111111111111111111111112",
    "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263",
    "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
];

/// CoinMarketCap coin logo URL template, `{id}` is the numeric CMC id
pub const CMC_IMAGE_URL_TEMPLATE: &str = "https://s2.coinmarketcap.com/static/img/coins/64x64/{id}.png";

/// Cache keys
pub const CACHE_KEY_SNAPSHOT: &str = "assets_all";
pub const CACHE_KEY_MARKET_STATS: &str = "market_stats";

/// Global market stats are refreshed at most this often
pub const MARKET_STATS_CACHE_SECS: u64 = 600;

/// Capacity of the per-cycle fetch result channel
pub const FETCH_CHANNEL_CAPACITY: usize = 8;

/// User agent sent to every provider
pub const USER_AGENT: &str = concat!("alphaagent/", env!("CARGO_PKG_VERSION"));
