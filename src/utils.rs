use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber.
///
/// Log level comes from `RUST_LOG`, default `info`. Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Read an environment variable, falling back to `default` when unset or blank
pub fn get_env(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Read an optional environment variable, `None` when unset or blank
pub fn get_env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse `"30s"`, `"5m"`, `"1h"` or bare seconds
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let (number, multiplier) = match value.chars().last()? {
        's' | 'S' => (&value[..value.len() - 1], 1),
        'm' | 'M' => (&value[..value.len() - 1], 60),
        'h' | 'H' => (&value[..value.len() - 1], 3600),
        c if c.is_ascii_digit() => (value, 1),
        _ => return None,
    };

    number
        .trim()
        .parse::<u64>()
        .ok()
        .map(|n| Duration::from_secs(n.saturating_mul(multiplier)))
}

/// Read a duration from the environment, warning and using `default` on bad input
pub fn get_env_duration(key: &str, default: Duration) -> Duration {
    match get_env_opt(key) {
        None => default,
        Some(raw) => parse_duration(&raw).unwrap_or_else(|| {
            warn!(key, value = %raw, "Invalid duration, using default {:?}", default);
            default
        }),
    }
}

/// Read a number from the environment, warning and using `default` on bad input
pub fn get_env_parsed<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Debug + Copy,
{
    match get_env_opt(key) {
        None => default,
        Some(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Invalid value, using default {:?}", default);
            default
        }),
    }
}

/// Format a USD figure compactly (e.g. `$1.25B`)
pub fn format_usd(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e12 {
        format!("${:.2}T", value / 1e12)
    } else if abs >= 1e9 {
        format!("${:.2}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("${:.2}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("${:.2}K", value / 1e3)
    } else {
        format!("${:.2}", value)
    }
}
