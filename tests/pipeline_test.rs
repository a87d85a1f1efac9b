//! End-to-end pipeline tests with in-process fetchers (no network)

use alphaagent::models::payloads::{
    CoinGeckoMarket, CoinMarketCapCoin, CoinMarketCapQuote, CoinMarketCapUsd, DefiLlamaProtocol,
};
use alphaagent::models::{FilterParams, SourceId, SourcePayload};
use alphaagent::services::{
    AssetAggregator, FetchContext, MergeEngine, ScoringEngine, SharedFetcher, SourceFetcher,
};
use alphaagent::AppError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct FakeFetcher {
    source: SourceId,
    payload: Option<SourcePayload>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl SourceFetcher for FakeFetcher {
    fn source(&self) -> SourceId {
        self.source
    }

    async fn fetch(&self, _ctx: &FetchContext) -> alphaagent::Result<SourcePayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.payload.clone().ok_or(AppError::SourceUnavailable {
            provider: self.source,
            reason: "provider down".to_string(),
        })
    }
}

fn fake(source: SourceId, payload: Option<SourcePayload>) -> (SharedFetcher, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let fetcher: SharedFetcher = Arc::new(FakeFetcher {
        source,
        payload,
        delay: Duration::from_millis(10),
        calls: Arc::clone(&calls),
    });
    (fetcher, calls)
}

fn cmc_coin(symbol: &str, name: &str, rank: u32, price: f64, mcap: f64, volume: f64) -> CoinMarketCapCoin {
    CoinMarketCapCoin {
        id: rank as u64,
        symbol: symbol.to_string(),
        name: name.to_string(),
        slug: name.to_lowercase(),
        cmc_rank: Some(rank),
        quote: CoinMarketCapQuote {
            usd: CoinMarketCapUsd {
                price: Some(price),
                market_cap: Some(mcap),
                volume_24h: Some(volume),
                percent_change_7d: Some(6.0),
                percent_change_30d: Some(12.0),
                ..Default::default()
            },
        },
        ..Default::default()
    }
}

fn cmc_payload() -> SourcePayload {
    SourcePayload::CoinMarketCap(vec![
        cmc_coin("BTC", "Bitcoin", 1, 60_000.0, 1.2e12, 3.0e10),
        cmc_coin("ETH", "Ethereum", 2, 3_000.0, 3.6e11, 1.5e10),
        cmc_coin("DEAD", "Dead Coin", 900, 0.0, 0.0, 0.0),
    ])
}

fn gecko_payload() -> SourcePayload {
    SourcePayload::CoinGecko(vec![
        CoinGeckoMarket {
            id: "bitcoin".into(),
            symbol: "btc".into(),
            name: "Bitcoin".into(),
            // Lower priority: must not override CMC's price
            current_price: Some(1.0),
            market_cap_rank: Some(1),
            ..Default::default()
        },
        CoinGeckoMarket {
            id: "solana".into(),
            symbol: "sol".into(),
            name: "Solana".into(),
            current_price: Some(150.0),
            market_cap: Some(7.0e10),
            total_volume: Some(3.0e9),
            market_cap_rank: Some(5),
            ..Default::default()
        },
    ])
}

fn llama_payload() -> SourcePayload {
    SourcePayload::DefiLlama(vec![DefiLlamaProtocol {
        name: "Ethereum".into(),
        symbol: "ETH".into(),
        tvl: Some(5.0e10),
        category: Some("Chain".into()),
        ..Default::default()
    }])
}

fn aggregator(fetchers: Vec<SharedFetcher>) -> AssetAggregator {
    AssetAggregator::new(
        fetchers,
        MergeEngine::default(),
        ScoringEngine::default(),
        Duration::from_secs(60),
        Duration::from_secs(5),
    )
}

#[tokio::test]
async fn test_full_cycle_merges_scores_and_ranks() {
    let (cmc, _) = fake(SourceId::CoinMarketCap, Some(cmc_payload()));
    let (cg, _) = fake(SourceId::CoinGecko, Some(gecko_payload()));
    let (llama, _) = fake(SourceId::DefiLlama, Some(llama_payload()));
    let aggregator = aggregator(vec![cmc, cg, llama]);

    let snapshot = aggregator.snapshot().await.unwrap();

    // Zero-price asset never reaches the output
    assert!(snapshot.find("DEAD").is_none());
    assert_eq!(snapshot.assets.len(), 3);

    let btc = snapshot.find("btc").unwrap();
    assert_eq!(btc.price, 60_000.0);
    assert_eq!(btc.provenance[&alphaagent::models::AssetField::Price], SourceId::CoinMarketCap);
    assert_eq!(btc.id, "bitcoin");

    let eth = snapshot.find("ethereum").unwrap();
    assert_eq!(eth.tvl, 5.0e10);
    assert!(eth.score_breakdown.effective_weights.tvl > 0.0);

    // Secondary source introduced an asset the primary lacks
    assert!(snapshot.find("SOL").is_some());

    for (i, asset) in snapshot.assets.iter().enumerate() {
        assert_eq!(asset.rank as usize, i + 1);
        assert!(asset.trust_score >= 0.0 && asset.trust_score <= 100.0);
        assert_eq!(asset.trust_score, asset.score_breakdown.total_score);
    }
    for pair in snapshot.assets.windows(2) {
        assert!(pair[0].trust_score >= pair[1].trust_score);
    }

    assert_eq!(snapshot.report.succeeded.len(), 3);
    assert!(snapshot.report.failed.is_empty());
}

#[tokio::test]
async fn test_single_surviving_source_still_produces_result() {
    let (cmc, _) = fake(SourceId::CoinMarketCap, None);
    let (cg, _) = fake(SourceId::CoinGecko, Some(gecko_payload()));
    let (llama, _) = fake(SourceId::DefiLlama, None);
    let aggregator = aggregator(vec![cmc, cg, llama]);

    let snapshot = aggregator.snapshot().await.unwrap();
    assert_eq!(snapshot.report.succeeded, vec![SourceId::CoinGecko]);
    assert_eq!(snapshot.report.failed.len(), 2);
    assert!(snapshot.find("SOL").is_some());
    assert!(snapshot.find("BTC").is_some());
}

#[tokio::test]
async fn test_all_sources_failing_is_no_data() {
    let (cmc, _) = fake(SourceId::CoinMarketCap, None);
    let (cg, _) = fake(SourceId::CoinGecko, None);
    let aggregator = aggregator(vec![cmc, cg]);

    assert!(matches!(
        aggregator.snapshot().await,
        Err(AppError::NoDataAvailable)
    ));
    // Failure is not cached
    assert_eq!(aggregator.cached_items().await, 0);
}

#[tokio::test]
async fn test_concurrent_requests_share_one_cycle() {
    let (cg, calls) = fake(SourceId::CoinGecko, Some(gecko_payload()));
    let aggregator = Arc::new(aggregator(vec![cg]));

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let aggregator = Arc::clone(&aggregator);
            tokio::spawn(async move { aggregator.snapshot().await.map(|s| s.assets.len()) })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 2);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Explicit refresh runs a new cycle
    aggregator.refresh().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_expired_snapshot_not_counted() {
    let (cg, calls) = fake(SourceId::CoinGecko, Some(gecko_payload()));
    let aggregator = AssetAggregator::new(
        vec![cg],
        MergeEngine::default(),
        ScoringEngine::default(),
        Duration::from_millis(50),
        Duration::from_secs(5),
    );

    aggregator.snapshot().await.unwrap();
    assert_eq!(aggregator.cached_items().await, 1);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(aggregator.cached_items().await, 0);

    // Next request rebuilds
    aggregator.snapshot().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(aggregator.cached_items().await, 1);
}

#[tokio::test]
async fn test_repeated_cycles_are_deterministic() {
    let (cmc, _) = fake(SourceId::CoinMarketCap, Some(cmc_payload()));
    let (cg, _) = fake(SourceId::CoinGecko, Some(gecko_payload()));
    let (llama, _) = fake(SourceId::DefiLlama, Some(llama_payload()));
    let aggregator = aggregator(vec![llama, cg, cmc]);

    let first = aggregator.refresh().await.unwrap();
    let second = aggregator.refresh().await.unwrap();
    assert_eq!(first.assets, second.assets);
}

#[tokio::test]
async fn test_list_and_find() {
    let (cmc, _) = fake(SourceId::CoinMarketCap, Some(cmc_payload()));
    let (cg, _) = fake(SourceId::CoinGecko, Some(gecko_payload()));
    let aggregator = aggregator(vec![cmc, cg]);

    let params = FilterParams {
        search: Some("eth".into()),
        ..Default::default()
    };
    let (page, _) = aggregator.list(&params).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].symbol, "ETH");

    let bad = FilterParams {
        sort: Some("bogus".into()),
        ..Default::default()
    };
    assert!(matches!(
        aggregator.list(&bad).await,
        Err(AppError::InvalidInput(_))
    ));

    assert!(matches!(
        aggregator.find("nope").await,
        Err(AppError::NotFound(_))
    ));
}
