//! Volatility surface builder
//!
//! Turns an option chain into a smile snapshot plus summary IVs. When no real
//! smile can be built the base IV is settled through an ordered list of
//! estimators and a synthetic smile is generated around spot, so the builder
//! never returns an empty surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SurfaceConfig;
use crate::core::{
    clamp_iv, year_fraction, DailyClose, SmileParams, TimeSeriesPoint, VolatilitySurfaceSnapshot,
};
use crate::data::fallback::{first_present, Provider};
use crate::data::OptionChain;
use crate::models::realized::realized_vol;

use super::smile::{atm_iv, build_smile, vega_weighted_iv, SmileInputs};

/// Last-resort base IV when even the configured default is unusable
pub const NEUTRAL_IV: f64 = 0.6;

/// Where the stored IV came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IvSource {
    Observed,
    RealizedVol,
    CarriedForward,
    NeutralDefault,
}

impl IvSource {
    pub fn label(&self) -> &'static str {
        match self {
            IvSource::Observed => "observed",
            IvSource::RealizedVol => "realized_vol",
            IvSource::CarriedForward => "carried_forward",
            IvSource::NeutralDefault => "neutral_default",
        }
    }
}

/// Base IV estimate used when there is no observed smile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IvEstimate {
    pub atm_iv: f64,
    pub vega_weighted_iv: f64,
}

impl IvEstimate {
    fn flat(iv: f64) -> Self {
        Self {
            atm_iv: iv,
            vega_weighted_iv: iv,
        }
    }
}

/// A single fallback source for the base IV
pub trait IvEstimator {
    fn source(&self) -> IvSource;
    fn estimate(&self) -> Option<IvEstimate>;
}

/// Annualized close-to-close volatility over the recent history
pub struct RealizedVolEstimator<'a> {
    pub closes: &'a [DailyClose],
    pub window: usize,
}

impl IvEstimator for RealizedVolEstimator<'_> {
    fn source(&self) -> IvSource {
        IvSource::RealizedVol
    }

    fn estimate(&self) -> Option<IvEstimate> {
        let closes: Vec<f64> = self.closes.iter().map(|c| c.close).collect();
        realized_vol(&closes, self.window)
            .and_then(clamp_iv)
            .map(IvEstimate::flat)
    }
}

/// Last IVs stored in the asset's own series
pub struct CarryForwardEstimator<'a> {
    pub last: Option<&'a TimeSeriesPoint>,
}

impl IvEstimator for CarryForwardEstimator<'_> {
    fn source(&self) -> IvSource {
        IvSource::CarriedForward
    }

    fn estimate(&self) -> Option<IvEstimate> {
        let last = self.last?;
        let iv = last.iv()?;
        Some(IvEstimate {
            atm_iv: last.atm_iv.and_then(clamp_iv).unwrap_or(iv),
            vega_weighted_iv: last.vega_weighted_iv.and_then(clamp_iv).unwrap_or(iv),
        })
    }
}

/// Fixed IV for a cold start with no data anywhere
pub struct NeutralDefaultEstimator {
    pub iv: f64,
}

impl IvEstimator for NeutralDefaultEstimator {
    fn source(&self) -> IvSource {
        IvSource::NeutralDefault
    }

    fn estimate(&self) -> Option<IvEstimate> {
        clamp_iv(self.iv).map(IvEstimate::flat)
    }
}

/// Inputs for the IV fallback chain
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackInputs<'a> {
    pub closes: &'a [DailyClose],
    pub last: Option<&'a TimeSeriesPoint>,
}

/// Builder output for one asset
#[derive(Debug, Clone)]
pub struct SurfaceResult {
    pub snapshot: VolatilitySurfaceSnapshot,
    pub atm_iv: f64,
    pub vega_weighted_iv: f64,
    pub days_to_expiry: f64,
    pub iv_source: IvSource,
}

impl SurfaceResult {
    /// Series point for this run
    pub fn to_point(&self, t: DateTime<Utc>) -> TimeSeriesPoint {
        TimeSeriesPoint {
            t,
            spot: self.snapshot.spot,
            days_to_expiry: self.days_to_expiry,
            atm_iv: Some(self.atm_iv),
            vega_weighted_iv: Some(self.vega_weighted_iv),
        }
    }
}

/// Settle the base IV through the estimators in order
pub fn settle_iv(estimators: &[&dyn IvEstimator]) -> Option<(IvSource, IvEstimate)> {
    first_present(
        estimators
            .iter()
            .map(|e| Provider::new(e.source(), move || e.estimate()))
            .collect(),
    )
}

/// Build the surface for one asset.
///
/// `chain` is `None` when the option chain could not be fetched at all.
pub fn build_surface(
    symbol: &str,
    spot: f64,
    chain: Option<&OptionChain>,
    fallback: FallbackInputs<'_>,
    now: DateTime<Utc>,
    rate: f64,
    cfg: &SurfaceConfig,
) -> SurfaceResult {
    if let Some(chain) = chain {
        if let Some(result) = observed_surface(symbol, spot, chain, now, rate, cfg) {
            return result;
        }
        tracing::warn!(
            symbol,
            quotes = chain.quotes.len(),
            "No invertible quotes, synthesizing smile"
        );
    }

    let realized = RealizedVolEstimator {
        closes: fallback.closes,
        window: cfg.realized_window,
    };
    let carried = CarryForwardEstimator { last: fallback.last };
    let neutral = NeutralDefaultEstimator { iv: cfg.default_iv };

    let (iv_source, estimate) = settle_iv(&[&realized, &carried, &neutral])
        .unwrap_or((IvSource::NeutralDefault, IvEstimate::flat(NEUTRAL_IV)));

    let days_to_expiry = chain
        .map(|c| c.days_to_expiry)
        .or_else(|| fallback.last.map(|p| p.days_to_expiry))
        .filter(|d| d.is_finite() && *d > 0.0)
        .unwrap_or(cfg.target_days);

    let params = SmileParams::symmetric(estimate.atm_iv, cfg.synthetic_curvature);
    let points = params.sample(spot, &cfg.synthetic_offsets);

    tracing::info!(
        symbol,
        source = iv_source.label(),
        atm_iv = estimate.atm_iv,
        "Synthetic smile"
    );

    SurfaceResult {
        snapshot: VolatilitySurfaceSnapshot::new(
            symbol,
            points,
            true,
            iv_source.label(),
            now,
            spot,
            days_to_expiry,
        ),
        atm_iv: estimate.atm_iv,
        vega_weighted_iv: estimate.vega_weighted_iv,
        days_to_expiry,
        iv_source,
    }
}

fn observed_surface(
    symbol: &str,
    spot: f64,
    chain: &OptionChain,
    now: DateTime<Utc>,
    rate: f64,
    cfg: &SurfaceConfig,
) -> Option<SurfaceResult> {
    let inputs = SmileInputs {
        spot,
        time: year_fraction(chain.days_to_expiry),
        rate,
    };

    let points = build_smile(&chain.quotes, &inputs, cfg.min_smile_points);
    let atm = atm_iv(&points, spot)?;
    let vega_weighted = vega_weighted_iv(&points, &inputs, cfg.vega_band).unwrap_or(atm);

    tracing::debug!(
        symbol,
        points = points.len(),
        atm_iv = atm,
        vega_weighted_iv = vega_weighted,
        "Observed smile"
    );

    Some(SurfaceResult {
        snapshot: VolatilitySurfaceSnapshot::new(
            symbol,
            points,
            false,
            "deribit",
            now,
            spot,
            chain.days_to_expiry,
        ),
        atm_iv: atm,
        vega_weighted_iv: vega_weighted,
        days_to_expiry: chain.days_to_expiry,
        iv_source: IvSource::Observed,
    })
}
