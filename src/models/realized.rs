//! Realized volatility
//!
//! Close-to-close estimator used when no option smile can be observed.
//! Crypto trades every day, so annualization uses 365 periods.

/// Trading days per year for crypto
pub const PERIODS_PER_YEAR: f64 = 365.0;

/// Log returns of consecutive positive closes
pub fn log_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .filter(|w| w[0] > 0.0 && w[1] > 0.0 && w[0].is_finite() && w[1].is_finite())
        .map(|w| (w[1] / w[0]).ln())
        .collect()
}

/// Sample standard deviation (n - 1 denominator)
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}

/// Annualized realized vol over the last `window` returns of `closes`.
///
/// Returns `None` with fewer than two returns or a degenerate (zero) result.
pub fn realized_vol(closes: &[f64], window: usize) -> Option<f64> {
    let returns = log_returns(closes);
    let start = returns.len().saturating_sub(window);
    let vol = sample_std(&returns[start..])? * PERIODS_PER_YEAR.sqrt();
    if vol.is_finite() && vol > 0.0 {
        Some(vol)
    } else {
        None
    }
}
