//! # CVI Engine - Crypto Volatility Index
//!
//! Derives a volatility index, trend/regime signals and paper orders for a set
//! of crypto assets from options and spot market data.
//!
//! ## Overview
//!
//! Each batch run, per asset:
//! - **Spot**: primary feed, secondary feed, last stored spot, neutral default
//! - **Option chain**: expiry nearest 30 days, strikes around spot, quotes
//!   fetched through a bounded worker pool
//! - **Surface**: Black-Scholes IV inversion, ATM and vega-weighted IV,
//!   synthetic smile when nothing can be observed
//! - **Series**: bounded, atomically written history that gains exactly one
//!   point per run
//! - **Signals**: EMA 20/100 crossover plus p10/p90 regime bands
//! - **Risk**: ERI, expected move and budget-based position size
//! - **Orders**: simulated entry/exit orders in bounded histories
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cvi_engine::prelude::*;
//!
//! # async fn run() -> CviResult<()> {
//! let config = load_default_config()?;
//! let gateway = LiveGateway::new(&config.gateway, &config.retry)?;
//! let engine = Engine::new(Arc::new(gateway), config)?;
//!
//! let report = engine.run_batch(chrono::Utc::now()).await;
//! for asset in &report.assets {
//!     println!("{}: {:?}", asset.symbol, asset.recommendation);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## What This Does NOT Do
//!
//! - Place real orders (paper only)
//! - Stream data (discrete batches)
//! - Guarantee exchange-grade pricing; every stage has an explicit fallback

pub mod config;
pub mod core;
pub mod data;
pub mod models;
pub mod orders;
pub mod pipeline;
pub mod research;
pub mod risk;
pub mod signals;
pub mod store;
pub mod surface;

/// Prelude with commonly used types
pub mod prelude {
    // Core types
    pub use crate::core::{
        CviError, CviResult, DailyClose, OptionInstrument, OptionQuote, OptionType, SmilePoint,
        SpotQuote, SpotSource, TimeSeriesPoint, VolatilitySurfaceSnapshot,
    };

    // Configuration
    pub use crate::config::{
        init_logging, load_config, load_default_config, AssetConfig, EngineConfig, ScorerKind,
    };

    // Market data
    pub use crate::data::{LiveGateway, MarketData, RetryPolicy, SpotResolver};

    // Models
    pub use crate::models::{implied_volatility, norm_cdf, price as bs_price, realized_vol, vega};

    // Pipeline stages
    pub use crate::orders::{generate_orders, Order, OrderType, Side};
    pub use crate::pipeline::{BatchReport, Engine};
    pub use crate::risk::{assess_risk, position_size, RiskAssessment, RiskScorer};
    pub use crate::signals::{compute_signal, percentile, Recommendation, Signal};
    pub use crate::store::SeriesStore;
    pub use crate::surface::{build_surface, IvSource, SurfaceResult};
}

pub use crate::core::{CviError, CviResult};
pub use crate::pipeline::Engine;
