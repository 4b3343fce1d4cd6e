//! Configuration loader for YAML files and environment overrides

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::core::{CviError, CviResult};

use super::types::{AssetConfig, EngineConfig};

/// Load configuration from a YAML file, apply environment overrides and validate.
///
/// A `.env` file in the working directory is loaded first when present.
pub fn load_config(path: &Path) -> CviResult<EngineConfig> {
    if !path.exists() {
        return Err(CviError::config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut config: EngineConfig = serde_yaml::from_reader(reader).map_err(|e| {
        CviError::config(format!("YAML parse error in '{}': {}", path.display(), e))
    })?;

    let _ = dotenvy::dotenv();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;

    Ok(config)
}

/// Defaults plus environment overrides, for runs without a config file
pub fn load_default_config() -> CviResult<EngineConfig> {
    let _ = dotenvy::dotenv();
    let mut config = EngineConfig::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

/// Load configuration from a YAML string (useful for testing)
pub fn load_config_from_str(yaml_content: &str) -> CviResult<EngineConfig> {
    let config: EngineConfig = serde_yaml::from_str(yaml_content)
        .map_err(|e| CviError::config(format!("YAML parse error: {}", e)))?;

    config.validate()?;

    Ok(config)
}

/// Apply `CVI_*` / `COINGECKO_API_KEY` overrides using `lookup` for values.
///
/// Unparseable numbers are ignored with a warning.
pub fn apply_env_overrides<F>(config: &mut EngineConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(list) = lookup("CVI_ASSETS") {
        config.assets = select_assets(&config.assets, &list);
    }

    if let Some(v) = lookup("CVI_RISK_BUDGET") {
        match v.trim().parse::<f64>() {
            Ok(budget) => config.risk.risk_budget = budget,
            Err(_) => tracing::warn!(value = %v, "Ignoring invalid CVI_RISK_BUDGET"),
        }
    }

    if let Some(v) = lookup("CVI_HORIZON_DAYS") {
        match v.trim().parse::<f64>() {
            Ok(days) => config.risk.horizon_days = days,
            Err(_) => tracing::warn!(value = %v, "Ignoring invalid CVI_HORIZON_DAYS"),
        }
    }

    if let Some(v) = lookup("CVI_OUTPUT_DIR") {
        if !v.trim().is_empty() {
            config.output_dir = PathBuf::from(v.trim());
        }
    }

    if let Some(key) = lookup("COINGECKO_API_KEY") {
        let key = key.trim().to_string();
        config.gateway.coingecko_api_key = if key.is_empty() { None } else { Some(key) };
    }
}

/// Keep (in requested order) the assets named in a comma-separated list.
///
/// Symbols unknown to the configuration get a bare entry with no options venue.
pub fn select_assets(known: &[AssetConfig], list: &str) -> Vec<AssetConfig> {
    let mut selected: Vec<AssetConfig> = Vec::new();

    for symbol in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let symbol = symbol.to_uppercase();
        if selected.iter().any(|a| a.symbol == symbol) {
            continue;
        }
        let asset = known
            .iter()
            .find(|a| a.symbol.eq_ignore_ascii_case(&symbol))
            .cloned()
            .unwrap_or_else(|| AssetConfig::new(&symbol, &symbol.to_lowercase(), None));
        selected.push(asset);
    }

    selected
}
