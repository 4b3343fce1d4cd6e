//! Option instrument definitions
//!
//! Listed crypto options as returned by the options venue: strike, expiry,
//! call/put and whether the instrument is still trading.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Seconds in a day, used for fractional days-to-expiry
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Option type (Call or Put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Payoff direction: +1 for call, -1 for put
    pub fn phi(&self) -> f64 {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }

    /// Intrinsic value at given spot
    pub fn intrinsic(&self, spot: f64, strike: f64) -> f64 {
        match self {
            OptionType::Call => (spot - strike).max(0.0),
            OptionType::Put => (strike - spot).max(0.0),
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self, OptionType::Call)
    }
}

/// A listed option instrument (no price attached)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionInstrument {
    /// Venue instrument name, e.g. "BTC-27DEC24-60000-C"
    pub name: String,
    /// Strike price in USD
    pub strike: f64,
    /// Expiration timestamp
    pub expiry: DateTime<Utc>,
    /// Option type (Call/Put)
    pub option_type: OptionType,
    /// Whether the venue still lists it as tradeable
    pub active: bool,
}

impl OptionInstrument {
    /// Fractional days until expiry (negative once expired)
    pub fn days_to_expiry(&self, now: DateTime<Utc>) -> f64 {
        days_between(now, self.expiry)
    }

    /// Relative distance of the strike from spot: |K/S - 1|
    pub fn moneyness_distance(&self, spot: f64) -> f64 {
        (self.strike / spot - 1.0).abs()
    }
}

/// Fractional days from `from` to `to`
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / SECONDS_PER_DAY
}

/// Year fraction used by the pricer (ACT/365)
pub fn year_fraction(days: f64) -> f64 {
    days / 365.0
}
