pub mod aggregator;
pub mod analysis;
pub mod cache;
pub mod http_client;
pub mod market_stats;
pub mod merger;
pub mod orchestrator;
pub mod scoring;
pub mod sources;

pub use aggregator::{rank_assets, AssetAggregator, AssetSnapshot};
pub use analysis::{AnalysisService, GeminiClient, SharedGenerator, TextGenerator};
pub use cache::TtlCache;
pub use http_client::HttpClient;
pub use market_stats::MarketStatsService;
pub use merger::{MergeEngine, MergePolicy, SourcePolicy};
pub use orchestrator::{
    CancelHandle, FetchContext, FetchOrchestrator, FetchOutcome, FetchReport, SourceFailure,
};
pub use scoring::{ScoringConfig, ScoringEngine};
pub use sources::{default_fetchers, SharedFetcher, SourceFetcher};
