//! Volatility signal engine
//!
//! Stateless: every signal is recomputed from the stored IV history. Two
//! triggers feed the recommendation:
//! - EMA fast/slow crossover at the latest point
//! - IV stretched beyond the trailing low/high percentile bands
//!
//! A crossover sets the direction first; a stretched regime then overrides
//! it. Strength from both triggers adds up and is clamped to [0, 1].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SignalConfig;
use crate::core::{iv_series, TimeSeriesPoint};

use super::ema::{crossed_down, crossed_up, ema};
use super::stats::{percentile, trailing};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Hold")]
    Hold,
    #[serde(rename = "Long Volatility")]
    LongVolatility,
    #[serde(rename = "Short Volatility")]
    ShortVolatility,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Recommendation::Hold => "Hold",
            Recommendation::LongVolatility => "Long Volatility",
            Recommendation::ShortVolatility => "Short Volatility",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Timestamp of the series point the signal was computed at
    pub ts: DateTime<Utc>,
    pub recommendation: Recommendation,
    /// In [0, 1]
    pub strength: f64,
    /// Sizing multiplier in [0.5, 1.0]
    pub size_hint: f64,
    /// Triggers joined for display
    pub reason: String,
    pub reasons: Vec<String>,
    pub last_iv: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub crossed_up: bool,
    pub crossed_down: bool,
    pub p10: f64,
    pub p90: f64,
}

/// Compute the signal at the latest series point.
///
/// `None` when fewer than `min_history` IV observations exist.
pub fn compute_signal(series: &[TimeSeriesPoint], cfg: &SignalConfig) -> Option<Signal> {
    let ivs = iv_series(series);
    if ivs.len() < cfg.min_history.max(2) {
        return None;
    }
    let ts = series.iter().rev().find(|p| p.iv().is_some())?.t;

    let fast = ema(&ivs, cfg.fast_period);
    let slow = ema(&ivs, cfg.slow_period);
    let last = ivs.len() - 1;
    let up = crossed_up(&fast, &slow, last);
    let down = crossed_down(&fast, &slow, last);

    let window = trailing(&ivs, cfg.percentile_window);
    let p10 = percentile(window, cfg.low_percentile)?;
    let p90 = percentile(window, cfg.high_percentile)?;
    let last_iv = ivs[last];

    let mut recommendation = Recommendation::Hold;
    let mut strength: f64 = 0.0;
    let mut reasons = Vec::new();

    if up {
        recommendation = Recommendation::LongVolatility;
        strength += cfg.crossover_weight;
        reasons.push(format!("EMA{} crossed above EMA{}", cfg.fast_period, cfg.slow_period));
    } else if down {
        recommendation = Recommendation::ShortVolatility;
        strength += cfg.crossover_weight;
        reasons.push(format!("EMA{} crossed below EMA{}", cfg.fast_period, cfg.slow_period));
    }

    if last_iv >= p90 {
        recommendation = Recommendation::ShortVolatility;
        strength += cfg.regime_weight;
        reasons.push(format!(
            "IV {:.4} at or above p{:.0} {:.4}",
            last_iv, cfg.high_percentile, p90
        ));
    } else if last_iv <= p10 {
        recommendation = Recommendation::LongVolatility;
        strength += cfg.regime_weight;
        reasons.push(format!(
            "IV {:.4} at or below p{:.0} {:.4}",
            last_iv, cfg.low_percentile, p10
        ));
    }

    let strength = strength.clamp(0.0, 1.0);
    let reason = if reasons.is_empty() {
        "No trigger".to_string()
    } else {
        reasons.join("; ")
    };

    Some(Signal {
        ts,
        recommendation,
        strength,
        size_hint: 0.5 + strength / 2.0,
        reason,
        reasons,
        last_iv,
        ema_fast: fast[last],
        ema_slow: slow[last],
        crossed_up: up,
        crossed_down: down,
        p10,
        p90,
    })
}

/// Append `signal` when it is newer than the last stored one, then trim to `cap`.
///
/// Returns whether the history changed.
pub fn append_signal(history: &mut Vec<Signal>, signal: Signal, cap: usize) -> bool {
    if history.last().is_some_and(|last| signal.ts <= last.ts) {
        return false;
    }
    history.push(signal);
    let cap = cap.max(1);
    if history.len() > cap {
        let excess = history.len() - cap;
        history.drain(..excess);
    }
    true
}
