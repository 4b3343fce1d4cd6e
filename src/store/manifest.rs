//! Output manifest
//!
//! Discovery file for downstream consumers: per asset, where its artifacts
//! live and what the latest snapshot looks like. Entries for assets not part
//! of the current batch are kept as they were.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{CviResult, SpotSource, TimeSeriesPoint};
use crate::signals::Recommendation;
use crate::surface::IvSource;

use super::json::{read_or_default, write_json};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SURFACE_FILE: &str = "surface.json";
pub const SIGNALS_FILE: &str = "signals.json";
pub const RISK_FILE: &str = "risk.json";

/// Artifact paths relative to the output root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub timeseries: String,
    pub surface: String,
    pub signals: String,
    pub risk: String,
    pub orders: String,
    pub features: String,
    pub forecast_metrics: String,
}

impl ArtifactPaths {
    pub fn for_symbol(symbol: &str) -> Self {
        let rel = |file: &str| format!("{}/{}", symbol, file);
        Self {
            timeseries: rel(super::series::SERIES_FILE),
            surface: rel(SURFACE_FILE),
            signals: rel(SIGNALS_FILE),
            risk: rel(RISK_FILE),
            orders: rel(crate::orders::ASSET_ORDERS_FILE),
            features: rel(crate::research::FEATURES_FILE),
            forecast_metrics: rel(crate::research::FORECAST_METRICS_FILE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub symbol: String,
    pub updated_at: DateTime<Utc>,
    pub paths: ArtifactPaths,
    pub latest: Option<TimeSeriesPoint>,
    pub points: usize,
    pub synthetic: bool,
    pub iv_source: Option<IvSource>,
    pub spot_source: Option<SpotSource>,
    pub recommendation: Option<Recommendation>,
    /// False when the run fell back to tick-forward
    pub healthy: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub generated_at: Option<DateTime<Utc>>,
    pub orders_global: String,
    pub assets: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    pub fn path(root: &Path) -> PathBuf {
        root.join(MANIFEST_FILE)
    }

    /// Stored manifest, or an empty one
    pub fn load(root: &Path) -> Self {
        read_or_default(&Self::path(root))
    }

    pub fn upsert(&mut self, entry: ManifestEntry) {
        self.assets.insert(entry.symbol.clone(), entry);
    }

    pub fn save(&mut self, root: &Path, generated_at: DateTime<Utc>) -> CviResult<()> {
        self.generated_at = Some(generated_at);
        self.orders_global = crate::orders::GLOBAL_ORDERS_FILE.to_string();
        write_json(&Self::path(root), self)
    }
}
