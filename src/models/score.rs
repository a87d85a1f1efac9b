use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative risk level used by the risk category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Numeric weight of a level: Low 1.0, Medium 0.6, High 0.2
    pub fn weight(&self) -> f64 {
        match self {
            RiskLevel::Low => 1.0,
            RiskLevel::Medium => 0.6,
            RiskLevel::High => 0.2,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        };
        f.write_str(s)
    }
}

/// Letter grade bucket for a composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
    #[default]
    F,
}

impl Grade {
    /// S >= 90, A >= 80, B >= 70, C >= 60, D >= 50, else F
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => Grade::S,
            s if s >= 80.0 => Grade::A,
            s if s >= 70.0 => Grade::B,
            s if s >= 60.0 => Grade::C,
            s if s >= 50.0 => Grade::D,
            _ => Grade::F,
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_uppercase().as_str() {
            "S" => Ok(Grade::S),
            "A" => Ok(Grade::A),
            "B" => Ok(Grade::B),
            "C" => Ok(Grade::C),
            "D" => Ok(Grade::D),
            "F" => Ok(Grade::F),
            _ => Err(format!("Invalid grade: {}. Valid options: S, A, B, C, D, F", s)),
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Trend classification for one timeframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    StrongUptrend,
    Uptrend,
    #[default]
    Sideways,
    Downtrend,
    StrongDowntrend,
}

/// Category weights, in points. Defaults sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub liquidity: f64,
    pub volume: f64,
    pub tvl: f64,
    pub trend: f64,
    pub market_health: f64,
    pub risk: f64,
}

impl CategoryWeights {
    pub fn total(&self) -> f64 {
        self.liquidity + self.volume + self.tvl + self.trend + self.market_health + self.risk
    }

    pub fn as_array(&self) -> [f64; 6] {
        [
            self.liquidity,
            self.volume,
            self.tvl,
            self.trend,
            self.market_health,
            self.risk,
        ]
    }
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            liquidity: 25.0,
            volume: 20.0,
            tvl: 20.0,
            trend: 20.0,
            market_health: 10.0,
            risk: 5.0,
        }
    }
}

/// Technical readings computed from the price history at scoring time.
/// `None` means the series was too short for the indicator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub samples: usize,
    pub rsi_14: Option<f64>,
    pub sma_7: Option<f64>,
    pub sma_30: Option<f64>,
    pub ema_12: Option<f64>,
    pub ema_26: Option<f64>,
    pub macd: Option<f64>,
    pub volatility_30d: Option<f64>,
    pub sharpe_ratio: Option<f64>,
}

/// Per-category inputs and intermediate readings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreDetails {
    // Liquidity
    pub liquidity_ratio: f64,
    pub liquidity_depth: f64,

    // Volume
    pub volume_to_mcap_ratio: f64,
    pub volume_consistency: f64,
    pub volume_7d_growth: f64,

    // TVL
    pub tvl_to_mcap_ratio: f64,
    pub tvl_7d_growth: f64,
    pub tvl_30d_growth: f64,
    pub tvl_volatility: f64,

    // Trend & momentum
    pub short_term_trend: Trend,
    pub medium_term_trend: Trend,
    pub long_term_trend: Trend,
    pub volatility_30d: f64,
    pub sharpe_ratio: f64,
    pub rsi: f64,
    pub technicals: TechnicalSnapshot,

    // Market health
    pub top10_holders_percent: f64,
    pub unique_holders: u64,
    pub market_cap_rank: u32,

    // Risk
    pub rug_pull_risk: RiskLevel,
    pub centralization_risk: RiskLevel,
    pub smart_contract_risk: RiskLevel,
}

/// Scored result attached to each asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub liquidity_score: f64,
    pub volume_score: f64,
    pub tvl_score: f64,
    pub trend_score: f64,
    pub market_health_score: f64,
    pub risk_score: f64,

    pub total_score: f64,
    pub grade: Grade,
    pub confidence: f64,

    /// Weights after redistribution for missing categories
    pub effective_weights: CategoryWeights,
    pub details: ScoreDetails,
}

impl Default for ScoreBreakdown {
    fn default() -> Self {
        Self {
            liquidity_score: 0.0,
            volume_score: 0.0,
            tvl_score: 0.0,
            trend_score: 0.0,
            market_health_score: 0.0,
            risk_score: 0.0,
            total_score: 0.0,
            grade: Grade::F,
            confidence: 0.0,
            effective_weights: CategoryWeights::default(),
            details: ScoreDetails::default(),
        }
    }
}
