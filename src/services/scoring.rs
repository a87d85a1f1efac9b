//! Trust Scoring Engine
//!
//! Scores one canonical asset at a time. Six category sub-scores (0-100) are
//! computed from fixed step functions, weighted by [`ScoringConfig`], and
//! summed into a composite score with a rank boost.
//!
//! # Categories
//!
//! | Category      | Base weight | Inputs                                              |
//! |---------------|-------------|-----------------------------------------------------|
//! | Liquidity     | 25          | liquidity / market cap, order book depth            |
//! | Volume        | 20          | volume / market cap, 7d consistency, 7d growth      |
//! | TVL           | 20          | TVL / market cap, TVL growth, TVL stability         |
//! | Trend         | 20          | 7d/30d/90d trend, volatility, RSI / SMA / MACD       |
//! | Market health | 10          | top-10 holder share, rank tier, holder count        |
//! | Risk          | 5           | rug-pull, centralization, smart-contract risk       |
//!
//! # Dynamic Reweighting
//! When TVL is absent its weight moves to volume / trend / market health
//! (40 / 40 / 20). When liquidity is absent its weight moves to volume / risk
//! (60 / 40). Redistribution happens before the weighted sum and preserves
//! the total weight.
//!
//! # Confidence
//! Starts at 100 and loses a fixed penalty for each thin input. It measures how
//! much data backs the score, not how good the asset is.

use crate::error::{AppError, Result};
use crate::models::indicators::{
    calculate_ema, calculate_macd, calculate_mean, calculate_percent_change, calculate_returns,
    calculate_rsi, calculate_sharpe_ratio, calculate_sma, calculate_std_dev, calculate_volatility,
    has_samples,
};
use crate::models::{
    CanonicalAsset, CategoryWeights, Grade, RiskLevel, ScoreBreakdown, ScoreDetails,
    TechnicalSnapshot, Trend,
};
use tracing::debug;

const RSI_PERIOD: usize = 14;
const WEIGHT_EPSILON: f64 = 1e-9;

// Band scores used when a technical reading is unavailable
const UNKNOWN_VOLATILITY_BAND: f64 = 0.6;
const UNKNOWN_RSI_BAND: f64 = 0.7;
const UNKNOWN_SMA_BAND: f64 = 0.5;
const UNKNOWN_MACD_BAND: f64 = 0.7;
const UNKNOWN_HOLDER_DISTRIBUTION_BAND: f64 = 0.85;

/// Weights, redistribution shares and baselines for the engine
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub weights: CategoryWeights,
    /// Fractions of the TVL weight given to other categories when TVL is absent
    pub tvl_shares: CategoryWeights,
    /// Fractions of the liquidity weight given to other categories when liquidity is absent
    pub liquidity_shares: CategoryWeights,
    /// Assets ranked at or above this get the liquidity baseline
    pub liquidity_baseline_rank: u32,
    pub liquidity_baseline: f64,
    /// Assets ranked at or above this get the TVL baseline
    pub tvl_baseline_rank: u32,
    pub tvl_baseline: f64,
    /// (rank threshold, boost) pairs, first match wins
    pub rank_boosts: Vec<(u32, f64)>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: CategoryWeights::default(),
            tvl_shares: CategoryWeights {
                liquidity: 0.0,
                volume: 0.4,
                tvl: 0.0,
                trend: 0.4,
                market_health: 0.2,
                risk: 0.0,
            },
            liquidity_shares: CategoryWeights {
                liquidity: 0.0,
                volume: 0.6,
                tvl: 0.0,
                trend: 0.0,
                market_health: 0.0,
                risk: 0.4,
            },
            liquidity_baseline_rank: 500,
            liquidity_baseline: 50.0,
            tvl_baseline_rank: 100,
            tvl_baseline: 40.0,
            rank_boosts: vec![(50, 5.0), (100, 2.5)],
        }
    }
}

impl ScoringConfig {
    pub fn builder() -> ScoringConfigBuilder {
        ScoringConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let weights = self.weights.as_array();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(AppError::Config(
                "category weights must be finite and non-negative".to_string(),
            ));
        }
        if self.weights.total() <= 0.0 {
            return Err(AppError::Config("category weights sum to zero".to_string()));
        }

        for (name, shares) in [("tvl", &self.tvl_shares), ("liquidity", &self.liquidity_shares)] {
            if shares.as_array().iter().any(|s| !s.is_finite() || *s < 0.0) {
                return Err(AppError::Config(format!(
                    "{} redistribution shares must be finite and non-negative",
                    name
                )));
            }
            if (shares.total() - 1.0).abs() > 1e-6 {
                return Err(AppError::Config(format!(
                    "{} redistribution shares must sum to 1, got {}",
                    name,
                    shares.total()
                )));
            }
            // Redistributed weight must land on categories that are never zeroed
            if shares.tvl != 0.0 || shares.liquidity != 0.0 {
                return Err(AppError::Config(format!(
                    "{} redistribution shares may not target tvl or liquidity",
                    name
                )));
            }
        }

        if self
            .rank_boosts
            .iter()
            .any(|(_, boost)| !boost.is_finite() || *boost < 0.0)
        {
            return Err(AppError::Config("rank boosts must be non-negative".to_string()));
        }

        Ok(())
    }
}

pub struct ScoringConfigBuilder {
    config: ScoringConfig,
}

impl ScoringConfigBuilder {
    pub fn weights(mut self, weights: CategoryWeights) -> Self {
        self.config.weights = weights;
        self
    }

    pub fn tvl_shares(mut self, shares: CategoryWeights) -> Self {
        self.config.tvl_shares = shares;
        self
    }

    pub fn liquidity_shares(mut self, shares: CategoryWeights) -> Self {
        self.config.liquidity_shares = shares;
        self
    }

    pub fn liquidity_baseline(mut self, max_rank: u32, score: f64) -> Self {
        self.config.liquidity_baseline_rank = max_rank;
        self.config.liquidity_baseline = score.clamp(0.0, 60.0);
        self
    }

    pub fn tvl_baseline(mut self, max_rank: u32, score: f64) -> Self {
        self.config.tvl_baseline_rank = max_rank;
        self.config.tvl_baseline = score.clamp(0.0, 50.0);
        self
    }

    pub fn rank_boosts(mut self, boosts: Vec<(u32, f64)>) -> Self {
        self.config.rank_boosts = boosts;
        self
    }

    pub fn build(self) -> Result<ScoringConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn has_value(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if has_value(numerator) && has_value(denominator) {
        Some(numerator / denominator)
    } else {
        None
    }
}

fn in_rank(rank: u32, max_rank: u32) -> bool {
    rank > 0 && rank <= max_rank
}

/// Move `share` fractions of `amount` onto the other categories
fn redistribute(weights: &mut CategoryWeights, amount: f64, shares: &CategoryWeights) {
    weights.liquidity += amount * shares.liquidity;
    weights.volume += amount * shares.volume;
    weights.tvl += amount * shares.tvl;
    weights.trend += amount * shares.trend;
    weights.market_health += amount * shares.market_health;
    weights.risk += amount * shares.risk;
}

/// Classify a percentage change against timeframe-scaled thresholds
fn classify_trend(change: f64, strong: f64, normal: f64) -> Trend {
    match change {
        c if c >= strong => Trend::StrongUptrend,
        c if c >= normal => Trend::Uptrend,
        c if c <= -strong => Trend::StrongDowntrend,
        c if c <= -normal => Trend::Downtrend,
        _ => Trend::Sideways,
    }
}

/// Compute technical readings from the longest available price window.
/// Readings the series is too short for are `None`.
pub fn technical_snapshot(asset: &CanonicalAsset) -> TechnicalSnapshot {
    let series = asset.price_history.longest();
    let len = series.len();
    let reading = |required: usize, f: &dyn Fn() -> f64| {
        if has_samples(series, required) {
            Some(f())
        } else {
            None
        }
    };

    let volatility_30d = if len >= 30 {
        Some(calculate_volatility(&series[len - 30..]))
    } else if has_value(asset.volatility_7d) {
        Some(asset.volatility_7d)
    } else {
        None
    };

    let returns = calculate_returns(series);
    let sharpe_ratio = if returns.len() >= 2 {
        Some(calculate_sharpe_ratio(&returns, 0.0))
    } else {
        None
    };

    TechnicalSnapshot {
        samples: len,
        // Latest reading: the trailing period + 1 samples
        rsi_14: reading(RSI_PERIOD + 1, &|| {
            calculate_rsi(&series[len - (RSI_PERIOD + 1)..], RSI_PERIOD)
        }),
        sma_7: reading(7, &|| calculate_sma(series, 7)),
        sma_30: reading(30, &|| calculate_sma(series, 30)),
        ema_12: reading(12, &|| calculate_ema(series, 12)),
        ema_26: reading(26, &|| calculate_ema(series, 26)),
        macd: reading(26, &|| calculate_macd(series)),
        volatility_30d,
        sharpe_ratio,
    }
}

/// Stateless scorer parameterized by a [`ScoringConfig`]
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Category weights after redistributing absent TVL and liquidity
    pub fn effective_weights(&self, asset: &CanonicalAsset) -> CategoryWeights {
        let mut weights = self.config.weights;

        if !has_value(asset.tvl) {
            let amount = weights.tvl;
            weights.tvl = 0.0;
            redistribute(&mut weights, amount, &self.config.tvl_shares);
        }

        if !has_value(asset.liquidity) {
            let amount = weights.liquidity;
            weights.liquidity = 0.0;
            redistribute(&mut weights, amount, &self.config.liquidity_shares);
        }

        debug_assert!((weights.total() - self.config.weights.total()).abs() < WEIGHT_EPSILON * 100.0);
        weights
    }

    /// Score one asset. Never fails: every input has a guarded fallback.
    pub fn score(&self, asset: &CanonicalAsset) -> ScoreBreakdown {
        let mut details = ScoreDetails {
            technicals: technical_snapshot(asset),
            ..Default::default()
        };

        let liquidity_score = self.liquidity_score(asset, &mut details);
        let volume_score = self.volume_score(asset, &mut details);
        let tvl_score = self.tvl_score(asset, &mut details);
        let trend_score = self.trend_score(asset, &mut details);
        let market_health_score = self.market_health_score(asset, &mut details);
        let risk_score = self.risk_score(asset, &mut details);

        let weights = self.effective_weights(asset);
        let weighted = (liquidity_score / 100.0) * weights.liquidity
            + (volume_score / 100.0) * weights.volume
            + (tvl_score / 100.0) * weights.tvl
            + (trend_score / 100.0) * weights.trend
            + (market_health_score / 100.0) * weights.market_health
            + (risk_score / 100.0) * weights.risk;

        let boost = self
            .config
            .rank_boosts
            .iter()
            .find(|(max_rank, _)| in_rank(asset.market_cap_rank, *max_rank))
            .map(|(_, boost)| *boost)
            .unwrap_or(0.0);

        let total_score = if (weighted + boost).is_finite() {
            (weighted + boost).clamp(0.0, 100.0)
        } else {
            0.0
        };

        ScoreBreakdown {
            liquidity_score,
            volume_score,
            tvl_score,
            trend_score,
            market_health_score,
            risk_score,
            total_score,
            grade: Grade::from_score(total_score),
            confidence: Self::confidence(asset),
            effective_weights: weights,
            details,
        }
    }

    /// Score every asset in place
    pub fn score_all(&self, assets: &mut [CanonicalAsset]) {
        for asset in assets.iter_mut() {
            let breakdown = self.score(asset);
            asset.trust_score = breakdown.total_score;
            asset.score_breakdown = breakdown;
        }
        debug!("Scored {} assets", assets.len());
    }

    // ---------------------------------------------------------------------
    // 1. Liquidity: 60 ratio + 40 depth
    // ---------------------------------------------------------------------

    fn liquidity_score(&self, asset: &CanonicalAsset, details: &mut ScoreDetails) -> f64 {
        let mut ratio_part: f64 = match ratio(asset.liquidity, asset.market_cap) {
            Some(r) => {
                details.liquidity_ratio = r;
                let band = match r {
                    r if r >= 0.05 => 1.0,
                    r if r >= 0.02 => 0.9,
                    r if r >= 0.005 => 0.7,
                    _ => 0.4,
                };
                band * 60.0
            }
            None => 0.0,
        };

        // Top-ranked assets have CEX liquidity DEX data does not capture
        if in_rank(asset.market_cap_rank, self.config.liquidity_baseline_rank) {
            ratio_part = ratio_part.max(self.config.liquidity_baseline);
        }

        let depth = Self::depth_score(asset);
        details.liquidity_depth = depth;

        ratio_part + depth * 40.0
    }

    /// Order book depth as % of market cap, banded. Without order book data,
    /// pooled DEX liquidity stands in for depth.
    fn depth_score(asset: &CanonicalAsset) -> f64 {
        if !has_value(asset.market_cap) {
            return 0.0;
        }

        let has_book = has_value(asset.orderbook_depth_1) || has_value(asset.orderbook_depth_5);
        let depth_pct = if has_book {
            let d1 = asset.orderbook_depth_1.max(0.0) / asset.market_cap * 100.0;
            let d5 = asset.orderbook_depth_5.max(0.0) / asset.market_cap * 100.0;
            d1 * 0.7 + d5 * 0.3
        } else if has_value(asset.liquidity) {
            asset.liquidity / asset.market_cap * 100.0
        } else {
            0.0
        };

        match depth_pct {
            d if d >= 5.0 => 1.0,
            d if d >= 3.0 => 0.85,
            d if d >= 1.0 => 0.7,
            d if d >= 0.5 => 0.5,
            _ => 0.3,
        }
    }

    // ---------------------------------------------------------------------
    // 2. Volume: 50 ratio + 25 consistency + 25 growth
    // ---------------------------------------------------------------------

    fn volume_score(&self, asset: &CanonicalAsset, details: &mut ScoreDetails) -> f64 {
        let mut total = 0.0;

        if let Some(r) = ratio(asset.volume_24h, asset.market_cap) {
            details.volume_to_mcap_ratio = r;
            let band = match r {
                r if r >= 0.20 => 1.0,
                r if r >= 0.10 => 0.9,
                r if r >= 0.02 => 0.7,
                _ => 0.4,
            };
            total += band * 50.0;
        }

        let consistency = Self::volume_consistency(&asset.volume_history.last_7_days);
        details.volume_consistency = consistency;
        total += consistency * 25.0;

        let growth = Self::volume_growth(&asset.volume_history.last_7_days);
        details.volume_7d_growth = growth;
        let growth_band = match growth {
            g if g >= 30.0 => 1.0,
            g if g >= 10.0 => 0.9,
            g if g >= -5.0 => 0.75,
            _ => 0.4,
        };
        total += growth_band * 25.0;

        total
    }

    /// Inverse coefficient of variation, banded. Fewer than 7 samples is 0.5.
    fn volume_consistency(last_7_days: &[f64]) -> f64 {
        if last_7_days.len() < 7 {
            return 0.5;
        }
        let mean = calculate_mean(last_7_days);
        if mean <= 0.0 || !mean.is_finite() {
            return 0.0;
        }
        let cv = calculate_std_dev(last_7_days, mean) / mean;

        match cv {
            cv if cv <= 0.2 => 1.0,
            cv if cv <= 0.4 => 0.85,
            cv if cv <= 0.6 => 0.7,
            cv if cv <= 0.8 => 0.5,
            _ => 0.3,
        }
    }

    /// Mean of the last three days against the first three, in percent
    fn volume_growth(last_7_days: &[f64]) -> f64 {
        if last_7_days.len() < 7 {
            return 0.0;
        }
        let n = last_7_days.len();
        let early = calculate_mean(&last_7_days[..3]);
        let recent = calculate_mean(&last_7_days[n - 3..]);
        calculate_percent_change(early, recent)
    }

    // ---------------------------------------------------------------------
    // 3. TVL: 50 ratio + 25 growth + 25 stability
    // ---------------------------------------------------------------------

    fn tvl_score(&self, asset: &CanonicalAsset, details: &mut ScoreDetails) -> f64 {
        let mut total = 0.0;

        match ratio(asset.tvl, asset.market_cap) {
            Some(r) => {
                details.tvl_to_mcap_ratio = r;
                let band = match r {
                    r if r >= 0.5 => 1.0,
                    r if r >= 0.2 => 0.9,
                    r if r >= 0.05 => 0.7,
                    _ => 0.4,
                };
                total += band * 50.0;
            }
            None if in_rank(asset.market_cap_rank, self.config.tvl_baseline_rank) => {
                total += self.config.tvl_baseline;
            }
            None => {}
        }

        let (growth_7d, growth_30d) = Self::tvl_growth(asset);
        details.tvl_7d_growth = growth_7d;
        details.tvl_30d_growth = growth_30d;
        let growth = growth_7d * 0.7 + growth_30d * 0.3;
        let growth_band = match growth {
            g if g >= 10.0 => 1.0,
            g if g >= 0.0 => 0.8,
            g if g >= -10.0 => 0.5,
            _ => 0.3,
        };
        total += growth_band * 25.0;

        // Fewer than 30 samples counts as high uncertainty
        let volatility = if asset.tvl_history.last_30_days.len() >= 30 {
            calculate_volatility(&asset.tvl_history.last_30_days)
        } else {
            50.0
        };
        details.tvl_volatility = volatility;
        let stability_band = match volatility {
            v if v <= 10.0 => 1.0,
            v if v <= 25.0 => 0.8,
            _ => 0.5,
        };
        total += stability_band * 25.0;

        total
    }

    /// Reported TVL changes, derived from the history when not reported
    fn tvl_growth(asset: &CanonicalAsset) -> (f64, f64) {
        let from_history = |series: &[f64]| match (series.first(), series.last()) {
            (Some(&first), Some(&last)) if series.len() >= 2 => {
                calculate_percent_change(first, last)
            }
            _ => 0.0,
        };

        let growth_7d = if asset.tvl_7d_change.is_finite() && asset.tvl_7d_change != 0.0 {
            asset.tvl_7d_change
        } else {
            from_history(&asset.tvl_history.last_7_days)
        };
        let growth_30d = if asset.tvl_30d_change.is_finite() && asset.tvl_30d_change != 0.0 {
            asset.tvl_30d_change
        } else {
            from_history(&asset.tvl_history.last_30_days)
        };

        (growth_7d, growth_30d)
    }

    // ---------------------------------------------------------------------
    // 4. Trend & momentum: 50 trend + 25 volatility + 25 momentum
    // ---------------------------------------------------------------------

    fn trend_score(&self, asset: &CanonicalAsset, details: &mut ScoreDetails) -> f64 {
        let trend = Self::multi_timeframe_trend(asset, details);
        let volatility = Self::volatility_band(details);
        let momentum = Self::momentum(asset, details);

        trend * 50.0 + volatility * 25.0 + momentum * 25.0
    }

    fn multi_timeframe_trend(asset: &CanonicalAsset, details: &mut ScoreDetails) -> f64 {
        let short = classify_trend(asset.change_7d, 15.0, 5.0);
        let medium = classify_trend(asset.change_30d, 30.0, 10.0);
        let long = classify_trend(asset.change_90d, 50.0, 20.0);

        details.short_term_trend = short;
        details.medium_term_trend = medium;
        details.long_term_trend = long;

        use Trend::*;
        match (short, medium) {
            (StrongUptrend, StrongUptrend) => 1.0,
            (Uptrend, Uptrend) => 0.9,
            (Uptrend, _) | (_, Uptrend) => 0.75,
            (Sideways, Sideways) => 0.6,
            (Downtrend, Downtrend) => 0.3,
            _ => 0.5,
        }
    }

    fn volatility_band(details: &mut ScoreDetails) -> f64 {
        let Some(volatility) = details.technicals.volatility_30d else {
            return UNKNOWN_VOLATILITY_BAND;
        };
        details.volatility_30d = volatility;

        match volatility {
            v if v <= 20.0 => 1.0,
            v if v <= 40.0 => 0.8,
            v if v <= 60.0 => 0.6,
            v if v <= 80.0 => 0.4,
            _ => 0.2,
        }
    }

    /// 40% RSI band, 30% price vs SMA7/SMA30, 30% MACD sign
    fn momentum(asset: &CanonicalAsset, details: &mut ScoreDetails) -> f64 {
        let technicals = &details.technicals;

        let rsi_band = match technicals.rsi_14 {
            Some(rsi) => match rsi {
                r if (50.0..=70.0).contains(&r) => 1.0,
                r if (40.0..50.0).contains(&r) => 0.7,
                r if r > 70.0 => 0.5,
                r if (30.0..40.0).contains(&r) => 0.6,
                _ => 0.4,
            },
            None => UNKNOWN_RSI_BAND,
        };

        let sma_band = match (technicals.sma_7, technicals.sma_30) {
            (Some(sma7), Some(sma30)) => {
                match (asset.price > sma7, asset.price > sma30) {
                    (true, true) => 1.0,
                    (true, false) => 0.7,
                    (false, true) => 0.5,
                    (false, false) => 0.3,
                }
            }
            (Some(sma7), None) => {
                if asset.price > sma7 {
                    0.7
                } else {
                    0.3
                }
            }
            _ => UNKNOWN_SMA_BAND,
        };

        let macd_band = match technicals.macd {
            Some(m) if m > 0.0 => 1.0,
            Some(m) if m > -2.0 => 0.7,
            Some(_) => 0.4,
            None => UNKNOWN_MACD_BAND,
        };

        details.rsi = technicals.rsi_14.unwrap_or(crate::models::indicators::RSI_NEUTRAL);
        details.sharpe_ratio = technicals.sharpe_ratio.unwrap_or(0.0);

        rsi_band * 0.4 + sma_band * 0.3 + macd_band * 0.3
    }

    // ---------------------------------------------------------------------
    // 5. Market health: 50 distribution + 50 (0.7 rank + 0.3 holders)
    // ---------------------------------------------------------------------

    fn market_health_score(&self, asset: &CanonicalAsset, details: &mut ScoreDetails) -> f64 {
        let top10 = asset.top10_holders_ratio;
        details.top10_holders_percent = top10;
        details.unique_holders = asset.holder_count;
        details.market_cap_rank = asset.market_cap_rank;

        let distribution = if has_value(top10) {
            match top10 {
                t if t <= 20.0 => 1.0,
                t if t <= 50.0 => 0.85,
                t if t <= 80.0 => 0.5,
                _ => 0.2,
            }
        } else {
            UNKNOWN_HOLDER_DISTRIBUTION_BAND
        };

        let rank_band = match asset.market_cap_rank {
            0 => 0.6,
            r if r <= 100 => 1.0,
            r if r <= 500 => 0.85,
            _ => 0.6,
        };
        let holder_band = match asset.holder_count {
            h if h >= 50_000 => 1.0,
            h if h >= 10_000 => 0.8,
            _ => 0.5,
        };

        distribution * 50.0 + (rank_band * 0.7 + holder_band * 0.3) * 50.0
    }

    // ---------------------------------------------------------------------
    // 6. Risk: mean of three qualitative levels
    // ---------------------------------------------------------------------

    fn risk_score(&self, asset: &CanonicalAsset, details: &mut ScoreDetails) -> f64 {
        let rug_pull = Self::rug_pull_risk(asset);
        let centralization = Self::centralization_risk(asset);
        let smart_contract = Self::smart_contract_risk(asset);

        details.rug_pull_risk = rug_pull;
        details.centralization_risk = centralization;
        details.smart_contract_risk = smart_contract;

        calculate_mean(&[
            rug_pull.weight(),
            centralization.weight(),
            smart_contract.weight(),
        ]) * 100.0
    }

    fn rug_pull_risk(asset: &CanonicalAsset) -> RiskLevel {
        let mut points = 0;
        if asset.liquidity < asset.market_cap * 0.01 {
            points += 2;
        }
        if asset.top10_holders_ratio > 70.0 {
            points += 2;
        }
        if asset.contract_age_days < 90 {
            points += 1;
        }
        if !asset.is_verified {
            points += 2;
        }

        match points {
            p if p >= 5 => RiskLevel::High,
            p if p >= 3 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    fn centralization_risk(asset: &CanonicalAsset) -> RiskLevel {
        match asset.top10_holders_ratio {
            t if t > 80.0 => RiskLevel::High,
            t if t > 60.0 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    fn smart_contract_risk(asset: &CanonicalAsset) -> RiskLevel {
        let mut points = 0;
        if !asset.is_verified {
            points += 2;
        }
        if !asset.audit_status.eq_ignore_ascii_case("passed") {
            points += 2;
        }
        if asset.contract_age_days < 180 {
            points += 1;
        }

        match points {
            p if p >= 4 => RiskLevel::High,
            p if p >= 2 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    // ---------------------------------------------------------------------
    // Confidence
    // ---------------------------------------------------------------------

    /// 100 minus fixed penalties for thin inputs, floored at 0
    pub fn confidence(asset: &CanonicalAsset) -> f64 {
        let mut confidence: f64 = 100.0;

        if !has_value(asset.tvl) {
            confidence -= 15.0;
        }
        if !has_value(asset.liquidity) {
            confidence -= 15.0;
        }
        if asset.holder_count == 0 {
            confidence -= 10.0;
        }
        if asset.price_history.last_30_days.len() < 30 {
            confidence -= 10.0;
        }
        if asset.volume_24h < asset.market_cap * 0.001 {
            confidence -= 10.0;
        }
        if asset.contract_age_days < 30 {
            confidence -= 15.0;
        } else if asset.contract_age_days < 90 {
            confidence -= 10.0;
        }

        confidence.clamp(0.0, 100.0)
    }
}
