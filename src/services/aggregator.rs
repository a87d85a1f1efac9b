use crate::constants::CACHE_KEY_SNAPSHOT;
use crate::error::{AppError, Result};
use crate::models::{AppConfig, CanonicalAsset, FilterParams, FilteredPage};
use crate::services::cache::TtlCache;
use crate::services::http_client::HttpClient;
use crate::services::merger::MergeEngine;
use crate::services::orchestrator::{FetchContext, FetchOrchestrator, FetchReport};
use crate::services::scoring::ScoringEngine;
use crate::services::sources::{default_fetchers, SharedFetcher};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// One scored, ranked view of the market
#[derive(Debug, Clone, Serialize)]
pub struct AssetSnapshot {
    pub assets: Vec<CanonicalAsset>,
    pub generated_at: DateTime<Utc>,
    pub report: FetchReport,
}

impl AssetSnapshot {
    /// Find by id, symbol or name (case-insensitive)
    pub fn find(&self, identifier: &str) -> Option<&CanonicalAsset> {
        self.assets.iter().find(|a| a.matches_identifier(identifier))
    }
}

/// Service running fetch -> merge -> score -> rank, cached as one snapshot
pub struct AssetAggregator {
    orchestrator: FetchOrchestrator,
    merger: MergeEngine,
    scorer: ScoringEngine,
    cache: TtlCache<Arc<AssetSnapshot>>,
    fetch_timeout: Duration,
}

impl AssetAggregator {
    pub fn new(
        fetchers: Vec<SharedFetcher>,
        merger: MergeEngine,
        scorer: ScoringEngine,
        cache_ttl: Duration,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            orchestrator: FetchOrchestrator::new(fetchers),
            merger,
            scorer,
            cache: TtlCache::new(cache_ttl),
            fetch_timeout,
        }
    }

    /// Default merge policy and scoring weights, fetchers enabled by `config`
    pub fn from_config(config: &AppConfig, client: &HttpClient) -> Self {
        Self::new(
            default_fetchers(config, client),
            MergeEngine::default(),
            ScoringEngine::default(),
            config.token_cache_duration,
            config.fetch_timeout,
        )
    }

    pub fn sources(&self) -> Vec<crate::models::SourceId> {
        self.orchestrator.sources()
    }

    /// Fresh cached snapshots (0 or 1)
    pub async fn cached_items(&self) -> usize {
        self.cache.len().await
    }

    /// Cached snapshot, rebuilt at most once per TTL window
    pub async fn snapshot(&self) -> Result<Arc<AssetSnapshot>> {
        self.cache
            .get_or_try_insert_with(CACHE_KEY_SNAPSHOT, || async {
                let (ctx, _cancel) = FetchContext::new(self.fetch_timeout);
                self.build_snapshot(&ctx).await.map(Arc::new)
            })
            .await
    }

    /// Rebuild the snapshot now and replace the cached one
    pub async fn refresh(&self) -> Result<Arc<AssetSnapshot>> {
        let (ctx, _cancel) = FetchContext::new(self.fetch_timeout);
        let snapshot = Arc::new(self.build_snapshot(&ctx).await?);
        self.cache
            .insert(CACHE_KEY_SNAPSHOT, Arc::clone(&snapshot))
            .await;
        Ok(snapshot)
    }

    /// Run one uncached pipeline cycle under `ctx`
    #[instrument(skip_all)]
    pub async fn build_snapshot(&self, ctx: &FetchContext) -> Result<AssetSnapshot> {
        let outcome = self.orchestrator.fetch_all(ctx).await?;

        let mut assets = self.merger.merge(&outcome.payloads);
        self.scorer.score_all(&mut assets);
        rank_assets(&mut assets);

        info!(
            asset_count = assets.len(),
            sources = outcome.report.succeeded.len(),
            elapsed_ms = outcome.report.elapsed_ms,
            "Snapshot built"
        );

        Ok(AssetSnapshot {
            assets,
            generated_at: Utc::now(),
            report: outcome.report,
        })
    }

    /// Filtered, sorted page of the current snapshot
    pub async fn list(&self, params: &FilterParams) -> Result<(FilteredPage, Arc<AssetSnapshot>)> {
        let snapshot = self.snapshot().await?;
        let page = params
            .apply(&snapshot.assets)
            .map_err(AppError::InvalidInput)?;
        Ok((page, snapshot))
    }

    pub async fn find(&self, identifier: &str) -> Result<CanonicalAsset> {
        let snapshot = self.snapshot().await?;
        snapshot
            .find(identifier)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Token '{}' not found", identifier)))
    }
}

/// Sort by total score desc, then market cap desc, then symbol, and assign 1-based ranks
pub fn rank_assets(assets: &mut [CanonicalAsset]) {
    assets.sort_by(|a, b| {
        b.trust_score
            .partial_cmp(&a.trust_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                b.market_cap
                    .partial_cmp(&a.market_cap)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    for (i, asset) in assets.iter_mut().enumerate() {
        asset.rank = (i + 1) as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(symbol: &str, score: f64, market_cap: f64) -> CanonicalAsset {
        let mut a = CanonicalAsset::new(symbol);
        a.trust_score = score;
        a.market_cap = market_cap;
        a
    }

    #[test]
    fn test_rank_assets_ordering() {
        let mut assets = vec![
            asset("CCC", 70.0, 10.0),
            asset("BBB", 80.0, 5.0),
            asset("AAA", 70.0, 10.0),
            asset("DDD", 70.0, 50.0),
        ];
        rank_assets(&mut assets);

        let symbols: Vec<&str> = assets.iter().map(|a| a.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BBB", "DDD", "AAA", "CCC"]);
        let ranks: Vec<u32> = assets.iter().map(|a| a.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_snapshot_find() {
        let mut btc = asset("BTC", 90.0, 1.0);
        btc.id = "bitcoin".into();
        btc.name = "Bitcoin".into();
        let snapshot = AssetSnapshot {
            assets: vec![btc],
            generated_at: Utc::now(),
            report: FetchReport::default(),
        };

        assert!(snapshot.find("btc").is_some());
        assert!(snapshot.find("BITCOIN").is_some());
        assert!(snapshot.find("eth").is_none());
    }
}
