mod analysis;
mod app_config;
mod asset;
mod filter;
mod market;
mod score;
mod source;
pub mod indicators;
pub mod payloads;

pub use analysis::{AnalysisReport, AnalysisRequest};
pub use app_config::{AppConfig, ProviderConfig};
pub use asset::{
    normalize_name, normalize_symbol, AssetField, CanonicalAsset, FieldValue, PriceHistory,
    TvlHistory, VolumeHistory,
};
pub use filter::{FilterParams, FilteredPage, SortKey, DEFAULT_LIMIT, MAX_LIMIT};
pub use market::MarketStats;
pub use payloads::SourcePayload;
pub use score::{
    CategoryWeights, Grade, RiskLevel, ScoreBreakdown, ScoreDetails, TechnicalSnapshot, Trend,
};
pub use source::SourceId;

use std::collections::HashMap;

/// Decoded payloads of one fetch cycle (source -> payload)
pub type SourceResults = HashMap<SourceId, SourcePayload>;
