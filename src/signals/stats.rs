//! Order statistics over IV history

/// Percentile `p` (0..=100) with linear interpolation between order statistics.
///
/// Non-finite values are ignored; `None` on an empty input.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() || !p.is_finite() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Share of observations at or below `value`, in percent
pub fn percentile_rank(values: &[f64], value: f64) -> Option<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || !value.is_finite() {
        return None;
    }
    let at_or_below = finite.iter().filter(|&&v| v <= value).count();
    Some(100.0 * at_or_below as f64 / finite.len() as f64)
}

/// The last `window` values
pub fn trailing(values: &[f64], window: usize) -> &[f64] {
    let start = values.len().saturating_sub(window.max(1));
    &values[start..]
}
