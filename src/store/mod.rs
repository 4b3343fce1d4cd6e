//! On-disk state
//!
//! - Atomic JSON writes; corrupt files read as absent
//! - Bounded per-asset time series with tick-forward
//! - Output manifest

pub mod json;
pub mod manifest;
pub mod series;

pub use json::{read_json, read_or_default, write_atomic, write_json};
pub use manifest::{
    ArtifactPaths, Manifest, ManifestEntry, MANIFEST_FILE, RISK_FILE, SIGNALS_FILE, SURFACE_FILE,
};
pub use series::{append_bounded, neutral_seed, SeriesStore, SERIES_FILE};
