//! Spot price resolution
//!
//! Strict precedence: primary live feed, secondary live feed, the last spot
//! stored in the asset's own series, then a fixed neutral constant. The first
//! finite positive value wins.

use crate::config::AssetConfig;
use crate::core::{SpotQuote, SpotSource};

use super::fallback::{first_present_async, positive_finite, AsyncProvider};
use super::gateway::MarketData;

/// Used only when even the configured default is unusable
pub const NEUTRAL_SPOT: f64 = 1.0;

/// Fallback order
pub const SPOT_CHAIN: [SpotSource; 4] = [
    SpotSource::Primary,
    SpotSource::Secondary,
    SpotSource::CarriedForward,
    SpotSource::Default,
];

/// Resolves spot through the fallback chain; never fails
pub struct SpotResolver<'a> {
    gateway: &'a dyn MarketData,
}

impl<'a> SpotResolver<'a> {
    pub fn new(gateway: &'a dyn MarketData) -> Self {
        Self { gateway }
    }

    /// Resolve spot for `asset`; `last_spot` is the latest stored series value
    pub async fn resolve(&self, asset: &AssetConfig, last_spot: Option<f64>) -> SpotQuote {
        let chain = SPOT_CHAIN
            .iter()
            .map(move |&source| {
                AsyncProvider::new(source, self.candidate(asset, source, last_spot))
            })
            .collect();

        match first_present_async(chain).await {
            Some((source, value)) => {
                if source != SpotSource::Primary {
                    tracing::info!(
                        symbol = %asset.symbol,
                        ?source,
                        value,
                        "Spot resolved via fallback"
                    );
                }
                SpotQuote::new(value, source)
            }
            None => SpotQuote::new(NEUTRAL_SPOT, SpotSource::Default),
        }
    }

    /// Validated value of one source in the chain
    async fn candidate(
        &self,
        asset: &AssetConfig,
        source: SpotSource,
        last_spot: Option<f64>,
    ) -> Option<f64> {
        let result = match source {
            SpotSource::Primary => self.gateway.spot(asset).await,
            SpotSource::Secondary => self.gateway.secondary_spot(asset).await,
            SpotSource::CarriedForward => return last_spot.and_then(positive_finite),
            SpotSource::Default => return positive_finite(asset.default_spot),
        };

        match result {
            Ok(value) => {
                let valid = positive_finite(value);
                if valid.is_none() {
                    tracing::warn!(
                        symbol = %asset.symbol,
                        ?source,
                        value,
                        "Discarding invalid spot"
                    );
                }
                valid
            }
            Err(e) => {
                tracing::warn!(
                    symbol = %asset.symbol,
                    ?source,
                    error = %e,
                    "Spot source unavailable"
                );
                None
            }
        }
    }
}
