use alphaagent::models::payloads::{
    CoinGeckoMarket, CoinMarketCapCoin, CoinMarketCapQuote, CoinMarketCapUsd,
};
use alphaagent::models::{CanonicalAsset, Grade, SourceId, SourcePayload, SourceResults};
use alphaagent::services::{MergeEngine, ScoringEngine};
use proptest::prelude::*;

fn metric() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), 0.0..1e12f64]
}

fn series(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0..1e6f64, 0..max_len)
}

prop_compose! {
    fn arb_asset()(
        (price, market_cap, volume, tvl, liquidity) in
            (metric(), metric(), metric(), metric(), metric()),
        changes in prop::array::uniform4(-100.0..500.0f64),
        rank in 0u32..3000,
        top10 in 0.0..100.0f64,
        holders in 0u64..200_000,
        verified in any::<bool>(),
        age in 0u32..2000,
        (prices, volumes, tvls) in (series(100), series(10), series(40)),
        depth in (metric(), metric()),
    ) -> CanonicalAsset {
        let mut asset = CanonicalAsset::new("PROP");
        asset.price = price;
        asset.market_cap = market_cap;
        asset.volume_24h = volume;
        asset.tvl = tvl;
        asset.liquidity = liquidity;
        asset.change_24h = changes[0];
        asset.change_7d = changes[1];
        asset.change_30d = changes[2];
        asset.change_90d = changes[3];
        asset.market_cap_rank = rank;
        asset.top10_holders_ratio = top10;
        asset.holder_count = holders;
        asset.is_verified = verified;
        asset.audit_status = if verified { "Passed".into() } else { String::new() };
        asset.contract_age_days = age;
        asset.price_history.last_30_days = prices;
        asset.volume_history.last_7_days = volumes;
        asset.tvl_history.last_30_days = tvls;
        asset.orderbook_depth_1 = depth.0;
        asset.orderbook_depth_5 = depth.1;
        asset
    }
}

fn in_unit_range(v: f64) -> bool {
    v.is_finite() && (0.0..=100.0).contains(&v)
}

proptest! {
    #[test]
    fn score_and_confidence_are_bounded(asset in arb_asset()) {
        let breakdown = ScoringEngine::default().score(&asset);

        prop_assert!(in_unit_range(breakdown.total_score), "total {}", breakdown.total_score);
        prop_assert!(in_unit_range(breakdown.confidence), "confidence {}", breakdown.confidence);
        for sub in [
            breakdown.liquidity_score,
            breakdown.volume_score,
            breakdown.tvl_score,
            breakdown.trend_score,
            breakdown.market_health_score,
            breakdown.risk_score,
        ] {
            prop_assert!(in_unit_range(sub), "sub-score {}", sub);
        }
        prop_assert_eq!(breakdown.grade, Grade::from_score(breakdown.total_score));
    }

    #[test]
    fn effective_weights_conserve_total(asset in arb_asset()) {
        let engine = ScoringEngine::default();
        let weights = engine.effective_weights(&asset);
        let nominal = engine.config().weights.total();

        prop_assert!((weights.total() - nominal).abs() < 1e-9);
        prop_assert!(weights.as_array().iter().all(|w| *w >= 0.0));
        prop_assert_eq!(weights.tvl == 0.0, asset.tvl <= 0.0);
        prop_assert_eq!(weights.liquidity == 0.0, asset.liquidity <= 0.0);
    }

    #[test]
    fn more_liquidity_never_lowers_liquidity_score(
        asset in arb_asset(),
        low in metric(),
        extra in 0.0..1e12f64,
    ) {
        let engine = ScoringEngine::default();

        let mut thin = asset.clone();
        thin.liquidity = low;
        let mut deep = asset;
        deep.liquidity = low + extra;

        let thin_score = engine.score(&thin).liquidity_score;
        let deep_score = engine.score(&deep).liquidity_score;
        prop_assert!(deep_score >= thin_score, "{} < {}", deep_score, thin_score);
    }

    #[test]
    fn higher_priority_source_wins_conflicts(
        primary_price in 0.01..1e6f64,
        secondary_price in 0.01..1e6f64,
        secondary_mcap in 1.0..1e12f64,
    ) {
        let mut payloads = SourceResults::new();
        payloads.insert(
            SourceId::CoinGecko,
            SourcePayload::CoinGecko(vec![CoinGeckoMarket {
                id: "token".into(),
                symbol: "tkn".into(),
                name: "Token".into(),
                current_price: Some(secondary_price),
                market_cap: Some(secondary_mcap),
                ..Default::default()
            }]),
        );
        payloads.insert(
            SourceId::CoinMarketCap,
            SourcePayload::CoinMarketCap(vec![CoinMarketCapCoin {
                id: 1,
                symbol: "TKN".into(),
                name: "Token".into(),
                quote: CoinMarketCapQuote {
                    usd: CoinMarketCapUsd {
                        price: Some(primary_price),
                        ..Default::default()
                    },
                },
                ..Default::default()
            }]),
        );

        let engine = MergeEngine::default();
        let merged = engine.merge(&payloads);
        prop_assert_eq!(merged.len(), 1);
        prop_assert_eq!(merged[0].price, primary_price);

        // Merging again yields the same records
        prop_assert_eq!(engine.merge(&payloads), merged);
    }
}
