//! Market quotes
//!
//! Spot quotes with provenance and priced option quotes for a single run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::option::{OptionInstrument, OptionType};

/// Where a spot price came from, in fallback order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpotSource {
    Primary,
    Secondary,
    CarriedForward,
    Default,
}

/// Resolved spot price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotQuote {
    pub value: f64,
    pub source: SpotSource,
}

impl SpotQuote {
    pub fn new(value: f64, source: SpotSource) -> Self {
        Self { value, source }
    }

    /// Live feeds only (primary or secondary)
    pub fn is_live(&self) -> bool {
        matches!(self.source, SpotSource::Primary | SpotSource::Secondary)
    }
}

/// Priced option quote (USD)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    /// Venue instrument name
    pub name: String,
    pub strike: f64,
    pub expiry: DateTime<Utc>,
    pub option_type: OptionType,
    /// Mark (or last) price in USD
    pub price: f64,
}

impl OptionQuote {
    /// Attach a price to an instrument
    pub fn from_instrument(instrument: &OptionInstrument, price: f64) -> Self {
        Self {
            name: instrument.name.clone(),
            strike: instrument.strike,
            expiry: instrument.expiry,
            option_type: instrument.option_type,
            price,
        }
    }

    /// Usable for inversion: finite positive price and strike
    pub fn is_liquid(&self) -> bool {
        self.price.is_finite() && self.price > 0.0 && self.strike.is_finite() && self.strike > 0.0
    }
}

/// One day's closing price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyClose {
    pub date: chrono::NaiveDate,
    pub close: f64,
}
