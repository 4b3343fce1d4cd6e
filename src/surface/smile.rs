//! Smile construction and summary IVs
//!
//! Inverts quotes into strike-ordered implied vols and reduces them to the two
//! summary measures stored per run: ATM IV and vega-weighted IV.

use std::collections::BTreeSet;

use crate::core::{clamp_iv, sort_by_strike, OptionQuote, OptionType, SmilePoint};
use crate::models::black_scholes::{implied_volatility, vega};

/// Market inputs shared by every point of one smile
#[derive(Debug, Clone, Copy)]
pub struct SmileInputs {
    pub spot: f64,
    /// Time to expiry in years
    pub time: f64,
    pub rate: f64,
}

/// Invert one quote; puts go through put-call parity inside the solver
pub fn quote_iv(quote: &OptionQuote, inputs: &SmileInputs) -> Option<f64> {
    if !quote.is_liquid() {
        return None;
    }
    implied_volatility(
        quote.price,
        inputs.spot,
        quote.strike,
        inputs.time,
        inputs.rate,
        quote.option_type.is_call(),
    )
    .and_then(clamp_iv)
}

/// Build the smile from priced quotes.
///
/// Call points are used first. When fewer than `min_points` calls invert,
/// put points fill the strikes that have no call point. Quotes that fail to
/// invert are dropped. The result is ordered by strike.
pub fn build_smile(
    quotes: &[OptionQuote],
    inputs: &SmileInputs,
    min_points: usize,
) -> Vec<SmilePoint> {
    let invert = |option_type: OptionType| -> Vec<SmilePoint> {
        quotes
            .iter()
            .filter(|q| q.option_type == option_type)
            .filter_map(|q| {
                quote_iv(q, inputs).map(|iv| SmilePoint {
                    strike: q.strike,
                    iv,
                })
            })
            .collect()
    };

    let mut points = invert(OptionType::Call);

    if points.len() < min_points {
        let taken: BTreeSet<u64> = points.iter().map(|p| p.strike.to_bits()).collect();
        let puts = invert(OptionType::Put);
        let before = points.len();
        points.extend(puts.into_iter().filter(|p| !taken.contains(&p.strike.to_bits())));
        tracing::debug!(
            calls = before,
            merged = points.len() - before,
            "Merged put points into sparse smile"
        );
    }

    sort_by_strike(&mut points);
    points
}

/// IV of the point nearest to spot; the first of equally near points wins
pub fn atm_iv(points: &[SmilePoint], spot: f64) -> Option<f64> {
    points
        .iter()
        .filter(|p| p.strike.is_finite())
        .min_by(|a, b| (a.strike - spot).abs().total_cmp(&(b.strike - spot).abs()))
        .map(|p| p.iv)
}

/// Vega-weighted mean IV of the points within `band` of spot.
///
/// Falls back to the full smile when the band is empty and to a plain mean
/// when every weight vanishes.
pub fn vega_weighted_iv(points: &[SmilePoint], inputs: &SmileInputs, band: f64) -> Option<f64> {
    if points.is_empty() || !(inputs.spot > 0.0) {
        return None;
    }

    let near: Vec<&SmilePoint> = points
        .iter()
        .filter(|p| (p.strike / inputs.spot - 1.0).abs() <= band)
        .collect();
    let used: Vec<&SmilePoint> = if near.is_empty() {
        points.iter().collect()
    } else {
        near
    };

    let (weighted, total) = used.iter().fold((0.0, 0.0), |(acc, total), p| {
        let w = vega(inputs.spot, p.strike, inputs.rate, p.iv, inputs.time);
        if w.is_finite() && w > 0.0 {
            (acc + w * p.iv, total + w)
        } else {
            (acc, total)
        }
    });

    let mean = if total > 0.0 {
        weighted / total
    } else {
        used.iter().map(|p| p.iv).sum::<f64>() / used.len() as f64
    };

    clamp_iv(mean)
}
