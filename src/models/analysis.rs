use super::asset::CanonicalAsset;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/analyze`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisRequest {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
    pub tvl: f64,
    pub trust_score: f64,
    pub change_24h: f64,
    pub change_7d: f64,
    pub change_30d: f64,
    pub change_90d: f64,
    pub liquidity: f64,
    pub rank: u32,
    pub holder_count: u64,
    pub circulating_supply: f64,
    pub max_supply: f64,
    pub total_supply: f64,
}

impl AnalysisRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.symbol.trim().is_empty() {
            return Err("symbol is required".to_string());
        }
        if self.name.trim().is_empty() {
            return Err("name is required".to_string());
        }
        Ok(())
    }
}

impl From<&CanonicalAsset> for AnalysisRequest {
    fn from(asset: &CanonicalAsset) -> Self {
        Self {
            symbol: asset.symbol.clone(),
            name: asset.name.clone(),
            price: asset.price,
            market_cap: asset.market_cap,
            volume_24h: asset.volume_24h,
            tvl: asset.tvl,
            trust_score: asset.trust_score,
            change_24h: asset.change_24h,
            change_7d: asset.change_7d,
            change_30d: asset.change_30d,
            change_90d: asset.change_90d,
            liquidity: asset.liquidity,
            rank: asset.rank,
            holder_count: asset.holder_count,
            circulating_supply: asset.circulating_supply,
            max_supply: asset.max_supply,
            total_supply: asset.total_supply,
        }
    }
}

/// Generated analysis text and when it was produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub analysis: String,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_body_decodes_with_defaults() {
        let req: AnalysisRequest =
            serde_json::from_str(r#"{"symbol":"SOL","name":"Solana","price":150.5}"#).unwrap();
        assert_eq!(req.price, 150.5);
        assert_eq!(req.market_cap, 0.0);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_symbol_and_name() {
        let mut req = AnalysisRequest {
            name: "Solana".into(),
            ..Default::default()
        };
        assert!(req.validate().is_err());
        req.symbol = "SOL".into();
        req.name = "  ".into();
        assert!(req.validate().is_err());
    }
}
