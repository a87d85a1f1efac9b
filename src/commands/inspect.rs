use crate::error::{AppError, Result};
use crate::models::{AppConfig, CanonicalAsset};
use crate::services::{AssetAggregator, HttpClient};
use crate::utils::format_usd;

pub async fn run(config: AppConfig, identifier: &str, json: bool) -> Result<()> {
    let client = HttpClient::new(config.http_timeout, config.http_max_retries)?;
    let aggregator = AssetAggregator::from_config(&config, &client);
    let asset = aggregator.find(identifier).await?;

    if json {
        let out = serde_json::to_string_pretty(&asset).map_err(AppError::from)?;
        println!("{}", out);
    } else {
        print!("{}", render(&asset));
    }
    Ok(())
}

fn render(asset: &CanonicalAsset) -> String {
    let b = &asset.score_breakdown;
    let w = &b.effective_weights;
    let d = &b.details;
    let mut out = String::new();

    out.push_str(&format!(
        "🔹 {} ({}) | rank #{} | market cap rank #{}\n",
        asset.name, asset.symbol, asset.rank, asset.market_cap_rank
    ));
    out.push_str(&format!(
        "   Price ${:.6} | Mcap {} | Vol 24h {} | Liquidity {} | TVL {}\n\n",
        asset.price,
        format_usd(asset.market_cap),
        format_usd(asset.volume_24h),
        format_usd(asset.liquidity),
        format_usd(asset.tvl)
    ));

    out.push_str(&format!(
        "   Trust score {:.2} (grade {}) | confidence {:.0}\n\n",
        b.total_score, b.grade, b.confidence
    ));

    out.push_str("   CATEGORY        SCORE  WEIGHT\n");
    for (name, score, weight) in [
        ("liquidity", b.liquidity_score, w.liquidity),
        ("volume", b.volume_score, w.volume),
        ("tvl", b.tvl_score, w.tvl),
        ("trend", b.trend_score, w.trend),
        ("market health", b.market_health_score, w.market_health),
        ("risk", b.risk_score, w.risk),
    ] {
        out.push_str(&format!("   {:<14} {:>6.2} {:>7.2}\n", name, score, weight));
    }

    out.push_str(&format!(
        "\n   Trend 7d/30d/90d: {:?} / {:?} / {:?}\n",
        d.short_term_trend, d.medium_term_trend, d.long_term_trend
    ));
    out.push_str(&format!(
        "   Risk: rug-pull {} | centralization {} | smart contract {}\n",
        d.rug_pull_risk, d.centralization_risk, d.smart_contract_risk
    ));

    if !asset.provenance.is_empty() {
        out.push_str("\n   Provenance:\n");
        for (field, source) in &asset.provenance {
            out.push_str(&format!("     {:<22} {}\n", format!("{:?}", field), source));
        }
    }

    out
}
