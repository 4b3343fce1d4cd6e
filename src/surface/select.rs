//! Expiry and strike selection
//!
//! Picks the one expiry closest to the target horizon and the strikes around
//! spot worth quoting, keeping request volume bounded.

use chrono::{DateTime, Utc};

use crate::config::SurfaceConfig;
use crate::core::{OptionInstrument, OptionType};

/// Expiry closest to `target_days`.
///
/// Only active instruments at least `min_days` out are eligible. Expiries in
/// the preferred window win over the rest; ties go to the earlier expiry.
pub fn select_expiry(
    instruments: &[OptionInstrument],
    now: DateTime<Utc>,
    cfg: &SurfaceConfig,
) -> Option<DateTime<Utc>> {
    let mut expiries: Vec<(DateTime<Utc>, f64)> = instruments
        .iter()
        .filter(|i| i.active)
        .map(|i| (i.expiry, i.days_to_expiry(now)))
        .filter(|(_, days)| days.is_finite() && *days >= cfg.min_days && *days > 0.0)
        .collect();

    expiries.sort_by_key(|(expiry, _)| *expiry);
    expiries.dedup_by_key(|(expiry, _)| *expiry);

    let in_window: Vec<(DateTime<Utc>, f64)> = expiries
        .iter()
        .copied()
        .filter(|(_, days)| *days >= cfg.window_min_days && *days <= cfg.window_max_days)
        .collect();

    let pool = if in_window.is_empty() { &expiries } else { &in_window };

    // min_by keeps the first minimum, and the pool is sorted by expiry
    pool.iter()
        .min_by(|a, b| {
            let da = (a.1 - cfg.target_days).abs();
            let db = (b.1 - cfg.target_days).abs();
            da.total_cmp(&db)
        })
        .map(|(expiry, _)| *expiry)
}

/// Active instruments of one type for `expiry` within the strike band,
/// nearest to spot first, capped at `max_strikes`, returned in strike order.
pub fn select_strikes(
    instruments: &[OptionInstrument],
    expiry: DateTime<Utc>,
    spot: f64,
    option_type: OptionType,
    cfg: &SurfaceConfig,
) -> Vec<OptionInstrument> {
    if !(spot > 0.0) {
        return Vec::new();
    }

    let mut selected: Vec<OptionInstrument> = instruments
        .iter()
        .filter(|i| i.active && i.expiry == expiry && i.option_type == option_type)
        .filter(|i| i.strike.is_finite() && i.strike > 0.0)
        .filter(|i| i.moneyness_distance(spot) <= cfg.strike_band)
        .cloned()
        .collect();

    selected.sort_by(|a, b| a.moneyness_distance(spot).total_cmp(&b.moneyness_distance(spot)));
    selected.truncate(cfg.max_strikes);
    selected.sort_by(|a, b| a.strike.total_cmp(&b.strike));
    selected
}
