use crate::error::{AppError, Result};
use crate::models::{AppConfig, CanonicalAsset, FilterParams};
use crate::services::{AssetAggregator, HttpClient};
use crate::utils::format_usd;

pub async fn run(config: AppConfig, limit: usize, min_score: Option<f64>, json: bool) -> Result<()> {
    let client = HttpClient::new(config.http_timeout, config.http_max_retries)?;
    let aggregator = AssetAggregator::from_config(&config, &client);

    if !json {
        println!("⏳ Fetching from {} source(s)...", aggregator.sources().len());
    }

    let params = FilterParams {
        limit: Some(limit),
        min_score,
        ..Default::default()
    };
    let (page, snapshot) = aggregator.list(&params).await?;

    if json {
        let out = serde_json::to_string_pretty(&page.data).map_err(AppError::from)?;
        println!("{}", out);
        return Ok(());
    }

    println!(
        "✅ {} assets scored in {} ms ({} source(s) ok, {} failed)\n",
        snapshot.assets.len(),
        snapshot.report.elapsed_ms,
        snapshot.report.succeeded.len(),
        snapshot.report.failed.len()
    );
    for failure in &snapshot.report.failed {
        println!("⚠️  {}: {}", failure.source, failure.reason);
    }

    println!(
        "{:>5}  {:<10} {:<24} {:>14} {:>10} {:>7} {:>5} {:>5}",
        "RANK", "SYMBOL", "NAME", "PRICE", "MCAP", "SCORE", "GRADE", "CONF"
    );
    for asset in &page.data {
        println!("{}", format_row(asset));
    }
    println!("\nShowing {} of {} matching assets", page.data.len(), page.total);

    Ok(())
}

fn format_row(asset: &CanonicalAsset) -> String {
    let name: String = asset.name.chars().take(24).collect();
    format!(
        "{:>5}  {:<10} {:<24} {:>14.6} {:>10} {:>7.2} {:>5} {:>5.0}",
        asset.rank,
        asset.symbol,
        name,
        asset.price,
        format_usd(asset.market_cap),
        asset.trust_score,
        asset.score_breakdown.grade,
        asset.score_breakdown.confidence
    )
}
