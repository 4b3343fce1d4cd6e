//! Configuration and logging
//!
//! This module provides:
//! - Configuration types (`EngineConfig` and its sections)
//! - YAML loading with environment overrides (`load_config`)
//! - Logging setup (`init_logging`)

mod loader;
pub mod logging;
mod types;

pub use types::{
    AssetConfig, EngineConfig, GatewayConfig, OrderConfig, RiskConfig, ScorerKind, SeriesConfig,
    SignalConfig, SurfaceConfig,
};

pub use loader::{
    apply_env_overrides, load_config, load_config_from_str, load_default_config, select_assets,
};

pub use logging::init_logging;
