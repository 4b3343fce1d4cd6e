//! Core data types for the CVI engine
//!
//! Defines fundamental types:
//! - OptionInstrument / OptionQuote: listed options and their prices
//! - SpotQuote: spot price with provenance
//! - VolatilitySurfaceSnapshot: strike-ordered smile
//! - TimeSeriesPoint: one summary measurement per run

pub mod option;
pub mod quote;
pub mod surface;
pub mod series;
pub mod error;

pub use option::*;
pub use quote::*;
pub use surface::*;
pub use series::*;
pub use error::*;
