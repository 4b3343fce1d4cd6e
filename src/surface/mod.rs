//! Volatility surface construction
//!
//! - Expiry and strike selection
//! - Smile inversion and summary IVs (ATM, vega-weighted)
//! - Builder with the IV fallback chain and synthetic smile

pub mod builder;
pub mod select;
pub mod smile;

pub use builder::{
    build_surface, settle_iv, CarryForwardEstimator, FallbackInputs, IvEstimate, IvEstimator,
    IvSource, NeutralDefaultEstimator, RealizedVolEstimator, SurfaceResult, NEUTRAL_IV,
};
pub use select::{select_expiry, select_strikes};
pub use smile::{atm_iv, build_smile, quote_iv, vega_weighted_iv, SmileInputs};
