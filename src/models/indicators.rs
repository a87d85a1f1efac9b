//! Technical indicators and statistics over price, volume and TVL series
//!
//! # Series Convention
//! All series are chronological, **oldest first**. The last element is the
//! most recent sample.
//!
//! # Sentinel Values
//! Every function is total: it never panics and never returns NaN for finite
//! input. When a series is too short, a documented sentinel is returned
//! instead of a reading:
//!
//! | Function                 | Insufficient data | Sentinel |
//! |--------------------------|-------------------|----------|
//! | `calculate_mean`         | empty             | 0.0      |
//! | `calculate_std_dev`      | empty             | 0.0      |
//! | `calculate_volatility`   | empty / mean = 0  | 0.0 / 100.0 |
//! | `calculate_rsi`          | < period + 1      | 50.0     |
//! | `calculate_sma`          | < period          | 0.0      |
//! | `calculate_ema`          | < period          | 0.0      |
//! | `calculate_macd`         | < 26              | 0.0      |
//! | `calculate_sharpe_ratio` | empty / std = 0   | 0.0      |
//!
//! Callers must treat sentinels as "unknown", never as a real zero reading.
//! Use [`has_samples`] to tell the two apart.

/// Neutral RSI returned when the series is too short
pub const RSI_NEUTRAL: f64 = 50.0;

/// Samples required by MACD (slow EMA period)
pub const MACD_SLOW_PERIOD: usize = 26;

/// Fast EMA period used by MACD
pub const MACD_FAST_PERIOD: usize = 12;

/// True when a series is long enough for an indicator needing `required` samples
pub fn has_samples(values: &[f64], required: usize) -> bool {
    required > 0 && values.len() >= required
}

/// Arithmetic mean. Returns 0.0 for an empty series.
pub fn calculate_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation around a precomputed mean.
pub fn calculate_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum();

    (sum_squares / values.len() as f64).sqrt()
}

/// Coefficient of variation as a percentage: `std_dev / mean * 100`
///
/// A zero mean yields 100.0 (maximal uncertainty) rather than a division by zero.
pub fn calculate_volatility(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mean = calculate_mean(values);
    if mean == 0.0 {
        return 100.0;
    }

    (calculate_std_dev(values, mean) / mean) * 100.0
}

/// Relative Strength Index over the first `period` price changes
///
/// # Returns
/// * 50.0 when fewer than `period + 1` samples exist
/// * 100.0 when the average loss is exactly zero
pub fn calculate_rsi(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period + 1 {
        return RSI_NEUTRAL;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;

    for window in prices[..=period].windows(2) {
        let change = window[1] - window[0];
        if change > 0.0 {
            gains += change;
        } else {
            losses -= change;
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Simple moving average of the trailing `period` samples
///
/// Returns 0.0 when the series is shorter than `period`.
pub fn calculate_sma(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period {
        return 0.0;
    }

    let start_idx = prices.len() - period;
    prices[start_idx..].iter().sum::<f64>() / period as f64
}

/// Exponential moving average
///
/// Seeded with the SMA of the first `period` samples, then smoothed forward
/// with factor `2 / (period + 1)`.
pub fn calculate_ema(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period {
        return 0.0;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let seed = calculate_sma(&prices[..period], period);

    prices[period..]
        .iter()
        .fold(seed, |ema, price| (price - ema) * multiplier + ema)
}

/// MACD line: `EMA(12) - EMA(26)`. Requires at least 26 samples, else 0.0.
pub fn calculate_macd(prices: &[f64]) -> f64 {
    if prices.len() < MACD_SLOW_PERIOD {
        return 0.0;
    }

    calculate_ema(prices, MACD_FAST_PERIOD) - calculate_ema(prices, MACD_SLOW_PERIOD)
}

/// Sharpe ratio: `(mean(returns) - risk_free_rate) / std_dev(returns)`
///
/// Returns 0.0 for an empty series or zero dispersion.
pub fn calculate_sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }

    let mean_return = calculate_mean(returns);
    let std_dev = calculate_std_dev(returns, mean_return);

    if std_dev == 0.0 {
        return 0.0;
    }

    (mean_return - risk_free_rate) / std_dev
}

/// Period-over-period simple returns (`p[i] / p[i-1] - 1`), skipping zero bases
pub fn calculate_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

/// Percentage change between two readings, 0.0 when the base is zero
pub fn calculate_percent_change(previous: f64, current: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        ((current - previous) / previous) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std_dev() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let mean = calculate_mean(&values);
        assert_eq!(mean, 5.0);
        assert!((calculate_std_dev(&values, mean) - 2.0).abs() < 1e-12);

        assert_eq!(calculate_mean(&[]), 0.0);
        assert_eq!(calculate_std_dev(&[], 0.0), 0.0);
    }

    #[test]
    fn test_volatility() {
        // std 2, mean 5 -> 40%
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((calculate_volatility(&values) - 40.0).abs() < 1e-9);

        // Zero mean is maximal uncertainty, not a division by zero
        assert_eq!(calculate_volatility(&[1.0, -1.0]), 100.0);
        assert_eq!(calculate_volatility(&[]), 0.0);
    }

    #[test]
    fn test_rsi_sentinels() {
        // Not enough data: period 14 needs 15 samples
        let short: Vec<f64> = (0..14).map(|i| i as f64).collect();
        assert_eq!(calculate_rsi(&short, 14), RSI_NEUTRAL);

        // Only gains -> 100
        let rising: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        assert_eq!(calculate_rsi(&rising, 14), 100.0);
    }

    #[test]
    fn test_rsi_mixed() {
        // Changes: +2, -1, +2, -1 -> avg gain 1.0, avg loss 0.5 -> RS 2 -> RSI 66.67
        let prices = vec![10.0, 12.0, 11.0, 13.0, 12.0];
        let rsi = calculate_rsi(&prices, 4);
        assert!((rsi - 66.666_666).abs() < 0.001);
    }

    #[test]
    fn test_calculate_sma() {
        let closes = vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0];

        assert_eq!(calculate_sma(&closes, 3), 14.0); // (13+14+15)/3
        assert_eq!(calculate_sma(&closes, 6), 12.5);
        assert_eq!(calculate_sma(&closes, 7), 0.0); // Not enough data
        assert_eq!(calculate_sma(&closes, 0), 0.0);
    }

    #[test]
    fn test_calculate_ema() {
        let prices = vec![1.0, 2.0, 3.0, 4.0];
        // Seed SMA(3) of [1,2,3] = 2, multiplier 0.5 -> (4 - 2) * 0.5 + 2 = 3
        assert_eq!(calculate_ema(&prices, 3), 3.0);
        assert_eq!(calculate_ema(&prices, 5), 0.0);

        // Constant series converges to the constant
        let flat = vec![7.0; 40];
        assert!((calculate_ema(&flat, 12) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_calculate_macd() {
        let short: Vec<f64> = (0..25).map(|i| i as f64).collect();
        assert_eq!(calculate_macd(&short), 0.0);

        // Steady uptrend: fast EMA sits above slow EMA
        let rising: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        assert!(calculate_macd(&rising) > 0.0);

        let falling: Vec<f64> = (0..40).map(|i| 200.0 - i as f64).collect();
        assert!(calculate_macd(&falling) < 0.0);
    }

    #[test]
    fn test_sharpe_ratio() {
        assert_eq!(calculate_sharpe_ratio(&[], 0.0), 0.0);
        assert_eq!(calculate_sharpe_ratio(&[0.5, 0.5, 0.5], 0.0), 0.0);

        let returns = vec![0.02, -0.01, 0.03, 0.0];
        let mean = calculate_mean(&returns);
        let std = calculate_std_dev(&returns, mean);
        let expected = (mean - 0.001) / std;
        assert!((calculate_sharpe_ratio(&returns, 0.001) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_returns_and_percent_change() {
        let returns = calculate_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(returns.len(), 2);
        assert!((returns[0] - 0.10).abs() < 1e-12);
        assert!((returns[1] + 0.10).abs() < 1e-12);

        // Zero base is skipped rather than producing infinity
        assert_eq!(calculate_returns(&[0.0, 5.0, 10.0]).len(), 1);

        assert!((calculate_percent_change(100.0, 130.0) - 30.0).abs() < 1e-12);
        assert_eq!(calculate_percent_change(0.0, 10.0), 0.0);
    }

    #[test]
    fn test_has_samples() {
        assert!(has_samples(&[1.0, 2.0], 2));
        assert!(!has_samples(&[1.0], 2));
        assert!(!has_samples(&[1.0], 0));
    }
}
