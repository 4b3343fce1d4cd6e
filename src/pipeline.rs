//! Batch pipeline
//!
//! One run processes every configured asset in sequence:
//! spot → option chain → surface → series append → signal → risk → orders,
//! then writes the per-asset artifacts and the manifest. An asset that fails
//! before its series append is ticked forward instead; once the append has
//! happened, failed artifact writes are only reported. Either way the series
//! gains exactly one point and the rest of the batch carries on.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::Instrument;

use crate::config::{AssetConfig, EngineConfig};
use crate::core::{CviResult, DailyClose, SpotQuote, TimeSeriesPoint};
use crate::data::{fetch_option_chain, MarketData, SpotResolver};
use crate::orders::{generate_orders, OrderBook};
use crate::research::{
    build_features, daily_iv, evaluate, EvaluationReport, ForecastEntry, FEATURES_FILE,
    FORECAST_LOG_FILE, FORECAST_METRICS_FILE,
};
use crate::risk::{assess_series, scorer_for, RiskAssessment, RiskScorer};
use crate::signals::{append_signal, compute_signal, Recommendation, Signal};
use crate::store::{
    neutral_seed, read_json, read_or_default, write_json, ArtifactPaths, Manifest, ManifestEntry,
    SeriesStore, RISK_FILE, SIGNALS_FILE, SURFACE_FILE,
};
use crate::surface::{build_surface, FallbackInputs, IvSource, NEUTRAL_IV};

/// Outcome for one asset
#[derive(Debug, Clone, Serialize)]
pub struct AssetReport {
    pub symbol: String,
    /// False when the asset was ticked forward
    pub healthy: bool,
    pub spot: Option<SpotQuote>,
    pub iv_source: Option<IvSource>,
    pub latest: Option<TimeSeriesPoint>,
    pub points: usize,
    pub recommendation: Option<Recommendation>,
    pub orders: usize,
    /// Pipeline error, or artifact writes that failed after the series append
    pub error: Option<String>,
}

/// Outcome of one batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub generated_at: DateTime<Utc>,
    pub assets: Vec<AssetReport>,
}

impl BatchReport {
    pub fn asset(&self, symbol: &str) -> Option<&AssetReport> {
        self.assets.iter().find(|a| a.symbol == symbol)
    }

    pub fn healthy_count(&self) -> usize {
        self.assets.iter().filter(|a| a.healthy).count()
    }
}

/// Batch engine bound to one gateway and one configuration
pub struct Engine {
    gateway: Arc<dyn MarketData>,
    config: EngineConfig,
    series: SeriesStore,
    orders: OrderBook,
    scorer: Box<dyn RiskScorer>,
}

impl Engine {
    /// Fails only on an invalid configuration
    pub fn new(gateway: Arc<dyn MarketData>, config: EngineConfig) -> CviResult<Self> {
        config.validate()?;
        Ok(Self {
            series: SeriesStore::new(&config.output_dir, &config.series),
            orders: OrderBook::new(&config.output_dir, &config.orders),
            scorer: scorer_for(config.risk.scorer),
            gateway,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn series(&self) -> &SeriesStore {
        &self.series
    }

    fn asset_file(&self, symbol: &str, file: &str) -> PathBuf {
        self.config.output_dir.join(symbol).join(file)
    }

    /// Run every asset once; never fails
    pub async fn run_batch(&self, now: DateTime<Utc>) -> BatchReport {
        let root = self.config.output_dir.clone();
        let mut manifest = Manifest::load(&root);
        let mut assets = Vec::with_capacity(self.config.assets.len());

        tracing::info!(assets = self.config.assets.len(), "Batch started");

        for (i, asset) in self.config.assets.iter().enumerate() {
            if i > 0 && self.config.pacing_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.pacing_ms)).await;
            }

            let span = tracing::info_span!("asset", symbol = %asset.symbol);
            let (report, entry) = match self.run_asset(asset, now).instrument(span.clone()).await {
                Ok(done) => done,
                Err(e) => {
                    let _guard = span.enter();
                    tracing::error!(error = %e, "Asset pipeline failed, ticking forward");
                    self.tick_forward(asset, now, &manifest, e.to_string())
                }
            };

            manifest.upsert(entry);
            assets.push(report);
        }

        if let Err(e) = manifest.save(&root, now) {
            tracing::error!(error = %e, "Failed to write manifest");
        }

        let report = BatchReport {
            generated_at: now,
            assets,
        };
        tracing::info!(
            healthy = report.healthy_count(),
            total = report.assets.len(),
            "Batch finished"
        );
        report
    }

    /// Full pipeline for one asset
    pub async fn run_asset(
        &self,
        asset: &AssetConfig,
        now: DateTime<Utc>,
    ) -> CviResult<(AssetReport, ManifestEntry)> {
        let symbol = asset.symbol.as_str();
        let cfg = &self.config;

        let history = self.series.read(symbol);
        let last = history.last();

        let spot = SpotResolver::new(self.gateway.as_ref())
            .resolve(asset, last.map(|p| p.spot))
            .await;

        let closes = match self.gateway.daily_closes(asset).await {
            Ok(closes) => closes,
            Err(e) => {
                tracing::warn!(error = %e, "Daily closes unavailable");
                Vec::new()
            }
        };

        let chain = match fetch_option_chain(
            self.gateway.clone(),
            asset,
            spot.value,
            now,
            &cfg.surface,
            &cfg.gateway,
        )
        .await
        {
            Ok(chain) => Some(chain),
            Err(e) => {
                tracing::warn!(error = %e, "Option chain unavailable");
                None
            }
        };

        let surface = build_surface(
            symbol,
            spot.value,
            chain.as_ref(),
            FallbackInputs {
                closes: &closes,
                last,
            },
            now,
            cfg.gateway.risk_free_rate,
            &cfg.surface,
        );
        write_json(&self.asset_file(symbol, SURFACE_FILE), &surface.snapshot)?;

        // The append is this run's only series write; later failures are
        // reported but never reach tick-forward.
        let series = self.series.append(symbol, surface.to_point(now))?;
        let mut failed = Vec::new();

        let signal = compute_signal(&series, &cfg.signal);
        soft(&mut failed, SIGNALS_FILE, self.record_signal(symbol, signal.as_ref()));

        let risk = assess_series(&series, self.scorer.as_ref(), &cfg.risk, &cfg.signal);
        if let Some(risk) = &risk {
            let written = write_json(&self.asset_file(symbol, RISK_FILE), risk);
            soft(&mut failed, RISK_FILE, written);
        }

        let orders = match (&signal, &risk) {
            (Some(signal), Some(risk)) => generate_orders(symbol, signal, risk),
            _ => Vec::new(),
        };
        let added = soft(&mut failed, "orders", self.orders.record(symbol, &orders)).unwrap_or(0);

        let research = self.write_research(symbol, &closes, &series);
        soft(&mut failed, "research", research);

        let latest = series.last().cloned();
        tracing::info!(
            spot = spot.value,
            spot_source = ?spot.source,
            iv_source = surface.iv_source.label(),
            atm_iv = surface.atm_iv,
            vega_weighted_iv = surface.vega_weighted_iv,
            points = series.len(),
            recommendation = ?signal.as_ref().map(|s| s.recommendation),
            orders = added,
            "Asset processed"
        );

        let entry = ManifestEntry {
            symbol: symbol.to_string(),
            updated_at: now,
            paths: ArtifactPaths::for_symbol(symbol),
            latest: latest.clone(),
            points: series.len(),
            synthetic: surface.snapshot.synthetic,
            iv_source: Some(surface.iv_source),
            spot_source: Some(spot.source),
            recommendation: signal.as_ref().map(|s| s.recommendation),
            healthy: true,
        };
        let report = AssetReport {
            symbol: symbol.to_string(),
            healthy: true,
            spot: Some(spot),
            iv_source: Some(surface.iv_source),
            latest,
            points: series.len(),
            recommendation: signal.map(|s| s.recommendation),
            orders: added,
            error: (!failed.is_empty()).then(|| failed.join("; ")),
        };
        Ok((report, entry))
    }

    fn record_signal(&self, symbol: &str, signal: Option<&Signal>) -> CviResult<()> {
        let path = self.asset_file(symbol, SIGNALS_FILE);
        let mut history: Vec<Signal> = read_or_default(&path);

        let changed = match signal {
            Some(signal) => {
                append_signal(&mut history, signal.clone(), self.config.signal.history_cap)
            }
            None => false,
        };
        if changed || !path.exists() {
            write_json(&path, &history)?;
        }
        Ok(())
    }

    fn write_research(
        &self,
        symbol: &str,
        closes: &[DailyClose],
        series: &[TimeSeriesPoint],
    ) -> CviResult<()> {
        if closes.is_empty() {
            return Ok(());
        }

        let features = build_features(closes, &daily_iv(series));
        write_json(&self.asset_file(symbol, FEATURES_FILE), &features)?;

        let log_path = self.asset_file(symbol, FORECAST_LOG_FILE);
        let forecasts: Option<Vec<ForecastEntry>> = match read_json(&log_path) {
            Ok(log) => log,
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable forecast log");
                None
            }
        };
        if let Some(forecasts) = forecasts {
            let report = EvaluationReport {
                symbol: symbol.to_string(),
                evaluation: evaluate(&features, &forecasts),
            };
            write_json(&self.asset_file(symbol, FORECAST_METRICS_FILE), &report)?;
        }
        Ok(())
    }

    /// Append a carried-forward (or seed) point after a failed run
    fn tick_forward(
        &self,
        asset: &AssetConfig,
        now: DateTime<Utc>,
        manifest: &Manifest,
        error: String,
    ) -> (AssetReport, ManifestEntry) {
        let symbol = asset.symbol.as_str();
        let seed_iv = Some(self.config.surface.default_iv)
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(NEUTRAL_IV);

        let series = match self.series.tick_forward(symbol, now, || {
            neutral_seed(now, asset.default_spot, self.config.surface.target_days, seed_iv)
        }) {
            Ok(series) => series,
            Err(e) => {
                tracing::error!(symbol, error = %e, "Tick-forward write failed");
                self.series.read(symbol)
            }
        };

        let latest = series.last().cloned();
        let previous = manifest.assets.get(symbol);
        let entry = ManifestEntry {
            symbol: symbol.to_string(),
            updated_at: now,
            paths: ArtifactPaths::for_symbol(symbol),
            latest: latest.clone(),
            points: series.len(),
            synthetic: previous.map(|p| p.synthetic).unwrap_or(true),
            iv_source: None,
            spot_source: None,
            recommendation: previous.and_then(|p| p.recommendation),
            healthy: false,
        };
        let report = AssetReport {
            symbol: symbol.to_string(),
            healthy: false,
            spot: None,
            iv_source: None,
            latest,
            points: series.len(),
            recommendation: None,
            orders: 0,
            error: Some(error),
        };
        (report, entry)
    }

    /// Latest stored risk assessment for `symbol`
    pub fn read_risk(&self, symbol: &str) -> Option<RiskAssessment> {
        read_json(&self.asset_file(symbol, RISK_FILE)).ok().flatten()
    }

    /// Stored signal history for `symbol`
    pub fn read_signals(&self, symbol: &str) -> Vec<Signal> {
        read_or_default(&self.asset_file(symbol, SIGNALS_FILE))
    }
}

/// Log a failed artifact write and keep going
fn soft<T>(failed: &mut Vec<String>, artifact: &str, result: CviResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(artifact, error = %e, "Artifact write failed");
            failed.push(format!("{}: {}", artifact, e));
            None
        }
    }
}
