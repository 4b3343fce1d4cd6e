//! Per-asset time series store
//!
//! Append-only, strictly increasing in time, capped at `max_points` with the
//! oldest points evicted first. Each append rewrites the whole file
//! atomically.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};

use crate::config::SeriesConfig;
use crate::core::{CviResult, TimeSeriesPoint};

use super::json::{read_or_default, write_json};

pub const SERIES_FILE: &str = "cvi_timeseries.json";

/// Push `point`, keeping timestamps strictly increasing, then trim to `max_points`
pub fn append_bounded(
    series: &mut Vec<TimeSeriesPoint>,
    mut point: TimeSeriesPoint,
    max_points: usize,
) {
    if let Some(last) = series.last() {
        if point.t <= last.t {
            let bumped = last.t + Duration::seconds(1);
            tracing::debug!(requested = %point.t, stored = %bumped, "Series timestamp bumped");
            point.t = bumped;
        }
    }
    series.push(point);

    let max_points = max_points.max(1);
    if series.len() > max_points {
        let excess = series.len() - max_points;
        series.drain(..excess);
    }
}

/// Placeholder point for an asset with no history at all
pub fn neutral_seed(t: DateTime<Utc>, spot: f64, days_to_expiry: f64, iv: f64) -> TimeSeriesPoint {
    TimeSeriesPoint {
        t,
        spot,
        days_to_expiry,
        atm_iv: Some(iv),
        vega_weighted_iv: Some(iv),
    }
}

/// File-backed series, one file per asset under `root/<SYMBOL>/`
#[derive(Debug, Clone)]
pub struct SeriesStore {
    root: PathBuf,
    max_points: usize,
}

impl SeriesStore {
    pub fn new(root: impl Into<PathBuf>, cfg: &SeriesConfig) -> Self {
        Self {
            root: root.into(),
            max_points: cfg.max_points,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, symbol: &str) -> PathBuf {
        self.root.join(symbol).join(SERIES_FILE)
    }

    /// Stored points in time order; corrupt or missing files read as empty
    pub fn read(&self, symbol: &str) -> Vec<TimeSeriesPoint> {
        let mut points: Vec<TimeSeriesPoint> = read_or_default(&self.path(symbol));
        points.sort_by_key(|p| p.t);
        points
    }

    /// Latest stored point
    pub fn last(&self, symbol: &str) -> Option<TimeSeriesPoint> {
        self.read(symbol).pop()
    }

    /// Append one point and persist; returns the stored series
    pub fn append(&self, symbol: &str, point: TimeSeriesPoint) -> CviResult<Vec<TimeSeriesPoint>> {
        let mut series = self.read(symbol);
        append_bounded(&mut series, point, self.max_points);
        write_json(&self.path(symbol), &series)?;
        Ok(series)
    }

    /// Advance the series by one point without fresh data.
    ///
    /// Clones the previous point with timestamp `t`; on an empty series the
    /// `seed` point is written instead.
    pub fn tick_forward(
        &self,
        symbol: &str,
        t: DateTime<Utc>,
        seed: impl FnOnce() -> TimeSeriesPoint,
    ) -> CviResult<Vec<TimeSeriesPoint>> {
        let point = match self.last(symbol) {
            Some(last) => last.tick(t),
            None => {
                let mut seed = seed();
                seed.t = t;
                seed
            }
        };
        tracing::warn!(symbol, t = %point.t, "Tick-forward point written");
        self.append(symbol, point)
    }
}
