//! Engine configuration types
//!
//! One immutable structure, built once per batch and passed by reference to
//! every component.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::{CviError, CviResult};
use crate::data::RetryPolicy;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tracked assets, processed in order
    pub assets: Vec<AssetConfig>,
    /// Root directory for every persisted artifact
    pub output_dir: PathBuf,
    /// Delay between assets within a batch
    pub pacing_ms: u64,
    pub gateway: GatewayConfig,
    pub retry: RetryPolicy,
    pub surface: SurfaceConfig,
    pub series: SeriesConfig,
    pub signal: SignalConfig,
    pub risk: RiskConfig,
    pub orders: OrderConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            assets: vec![
                AssetConfig::new("BTC", "bitcoin", Some("BTC")),
                AssetConfig::new("ETH", "ethereum", Some("ETH")),
                AssetConfig::new("LINK", "chainlink", None),
            ],
            output_dir: PathBuf::from("./docs"),
            pacing_ms: 1500,
            gateway: GatewayConfig::default(),
            retry: RetryPolicy::default(),
            surface: SurfaceConfig::default(),
            series: SeriesConfig::default(),
            signal: SignalConfig::default(),
            risk: RiskConfig::default(),
            orders: OrderConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Default configuration restricted to the given assets
    pub fn with_assets(assets: Vec<AssetConfig>) -> Self {
        Self {
            assets,
            ..Default::default()
        }
    }

    /// Reject configurations the batch cannot run with
    pub fn validate(&self) -> CviResult<()> {
        if self.assets.is_empty() {
            return Err(CviError::config("no assets selected"));
        }
        if let Some(a) = self.assets.iter().find(|a| a.symbol.trim().is_empty()) {
            return Err(CviError::config(format!("asset with empty symbol: {:?}", a)));
        }
        if !(self.risk.risk_budget > 0.0) || !(self.risk.horizon_days > 0.0) {
            return Err(CviError::config("risk budget and horizon must be positive"));
        }
        if self.signal.fast_period == 0 || self.signal.slow_period == 0 {
            return Err(CviError::config("EMA periods must be positive"));
        }
        if self.series.max_points == 0 {
            return Err(CviError::config("series.max_points must be positive"));
        }
        if self.gateway.concurrency == 0 {
            return Err(CviError::config("gateway.concurrency must be positive"));
        }
        Ok(())
    }

    pub fn asset(&self, symbol: &str) -> Option<&AssetConfig> {
        self.assets.iter().find(|a| a.symbol.eq_ignore_ascii_case(symbol))
    }
}

/// A tracked asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Ticker, e.g. "BTC"
    pub symbol: String,
    /// CoinGecko coin id for daily closes, e.g. "bitcoin"
    pub coingecko_id: String,
    /// Deribit currency for options and index price; None when not listed
    #[serde(default)]
    pub deribit_currency: Option<String>,
    /// Last-resort spot on a cold start with every feed down
    #[serde(default = "default_spot")]
    pub default_spot: f64,
}

fn default_spot() -> f64 {
    1.0
}

impl AssetConfig {
    pub fn new(symbol: &str, coingecko_id: &str, deribit_currency: Option<&str>) -> Self {
        Self {
            symbol: symbol.to_string(),
            coingecko_id: coingecko_id.to_string(),
            deribit_currency: deribit_currency.map(str::to_string),
            default_spot: default_spot(),
        }
    }
}

/// Market data providers and request limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub coinbase_url: String,
    pub deribit_url: String,
    pub coingecko_public_url: String,
    pub coingecko_pro_url: String,
    /// Pro key; the public host is used when absent
    pub coingecko_api_key: Option<String>,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// Max concurrent option quote requests (K)
    pub concurrency: usize,
    /// Upper bound of the random pre-request delay used when K is small
    pub request_jitter_ms: u64,
    /// Risk-free rate for the pricer
    pub risk_free_rate: f64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            coinbase_url: "https://api.coinbase.com".to_string(),
            deribit_url: "https://www.deribit.com".to_string(),
            coingecko_public_url: "https://api.coingecko.com/api/v3".to_string(),
            coingecko_pro_url: "https://pro-api.coingecko.com/api/v3".to_string(),
            coingecko_api_key: None,
            timeout_secs: 20,
            concurrency: 8,
            request_jitter_ms: 150,
            risk_free_rate: 0.0,
        }
    }
}

impl GatewayConfig {
    /// K at or below this gets per-request jitter
    pub const SMALL_POOL: usize = 4;
}

/// Expiry/strike selection and IV fallback settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Preferred days to expiry
    pub target_days: f64,
    /// Expiries closer than this are ignored
    pub min_days: f64,
    /// Preferred window, used when any expiry falls inside it
    pub window_min_days: f64,
    pub window_max_days: f64,
    /// Strikes within ±band of spot are kept
    pub strike_band: f64,
    /// Max instruments quoted per side
    pub max_strikes: usize,
    /// Fewer liquid call points than this triggers put quotes
    pub min_smile_points: usize,
    /// Band around spot for the vega-weighted average
    pub vega_band: f64,
    /// Relative strike offsets of a synthesized smile
    pub synthetic_offsets: Vec<f64>,
    /// Curvature (per unit of base vol) of a synthesized smile
    pub synthetic_curvature: f64,
    /// Cold-start IV when nothing else exists
    pub default_iv: f64,
    /// Returns used by the realized-vol fallback
    pub realized_window: usize,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            target_days: 30.0,
            min_days: 1.0,
            window_min_days: 20.0,
            window_max_days: 45.0,
            strike_band: 0.30,
            max_strikes: 24,
            min_smile_points: 5,
            vega_band: 0.10,
            synthetic_offsets: vec![-0.20, -0.10, -0.05, 0.0, 0.05, 0.10, 0.20],
            synthetic_curvature: 1.5,
            default_iv: 0.6,
            realized_window: 30,
        }
    }
}

/// Time series retention
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesConfig {
    pub max_points: usize,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self { max_points: 5000 }
    }
}

/// Signal engine parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub fast_period: usize,
    pub slow_period: usize,
    /// No signal below this many IV observations
    pub min_history: usize,
    /// Trailing window for percentile bands
    pub percentile_window: usize,
    pub low_percentile: f64,
    pub high_percentile: f64,
    /// Strength added by an EMA crossover
    pub crossover_weight: f64,
    /// Strength added by a stretched percentile regime
    pub regime_weight: f64,
    /// Stored signal history length
    pub history_cap: usize,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            fast_period: 20,
            slow_period: 100,
            min_history: 30,
            percentile_window: 252,
            low_percentile: 10.0,
            high_percentile: 90.0,
            crossover_weight: 0.5,
            regime_weight: 0.6,
            history_cap: 500,
        }
    }
}

/// Which ERI definition to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    /// ERI = 100 · iv / √365
    SigmaDaily,
    /// ERI = percentile rank rescaled so p10 → 0 and p90 → 100
    PercentileRank,
}

/// Risk/sizing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// USD at risk per expected move
    pub risk_budget: f64,
    pub horizon_days: f64,
    pub scorer: ScorerKind,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_budget: 1000.0,
            horizon_days: 7.0,
            scorer: ScorerKind::SigmaDaily,
        }
    }
}

/// Paper order history caps
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderConfig {
    pub per_asset_cap: usize,
    pub global_cap: usize,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            per_asset_cap: 200,
            global_cap: 500,
        }
    }
}
