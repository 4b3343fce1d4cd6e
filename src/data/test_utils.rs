//! Shared test utilities
//!
//! `MockMarketData` is an in-memory `MarketData` used by unit and integration
//! tests. Option prices can be generated from a flat Black-Scholes vol so the
//! surface builder has something real to invert.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::config::AssetConfig;
use crate::core::{year_fraction, CviError, CviResult, DailyClose, OptionInstrument, OptionType};
use crate::models::black_scholes;

use super::gateway::MarketData;

/// Configurable in-memory market
#[derive(Debug, Default)]
pub struct MockMarketData {
    pub spot: Option<f64>,
    pub secondary: Option<f64>,
    pub instruments: Vec<OptionInstrument>,
    /// USD price per instrument name; missing names fail
    pub prices: HashMap<String, f64>,
    pub closes: Vec<DailyClose>,
    /// Artificial latency per quote
    pub quote_delay: Duration,
    /// Number of `option_price` calls
    pub quote_calls: Arc<AtomicUsize>,
    pub(crate) in_flight: Arc<AtomicUsize>,
    /// Highest number of concurrent `option_price` calls observed
    pub max_in_flight: Arc<AtomicUsize>,
}

impl MockMarketData {
    /// Every call fails
    pub fn failing() -> Self {
        Self::default()
    }

    /// Live spot only, no options or history
    pub fn with_spot(spot: f64) -> Self {
        Self {
            spot: Some(spot),
            ..Self::default()
        }
    }

    /// Calls and puts priced at a flat vol for one expiry
    pub fn with_flat_chain(
        spot: f64,
        vol: f64,
        now: DateTime<Utc>,
        expiry: DateTime<Utc>,
        strikes: &[f64],
    ) -> Self {
        let mut mock = Self::with_spot(spot);
        mock.add_expiry(spot, vol, now, expiry, strikes);
        mock
    }

    /// Add calls and puts at `strikes` for `expiry`, priced at `vol`
    pub fn add_expiry(
        &mut self,
        spot: f64,
        vol: f64,
        now: DateTime<Utc>,
        expiry: DateTime<Utc>,
        strikes: &[f64],
    ) {
        let time = year_fraction((expiry - now).num_seconds() as f64 / 86_400.0);

        for &strike in strikes {
            for option_type in [OptionType::Call, OptionType::Put] {
                let suffix = if option_type.is_call() { "C" } else { "P" };
                let name = format!("MOCK-{}-{}-{}", expiry.format("%d%b%y"), strike, suffix);
                let price = black_scholes::price(spot, strike, 0.0, vol, time, option_type);

                self.instruments.push(OptionInstrument {
                    name: name.clone(),
                    strike,
                    expiry,
                    option_type,
                    active: true,
                });
                self.prices.insert(name, price);
            }
        }
    }

    /// Geometric daily closes with alternating moves of `step` (log)
    pub fn with_closes(mut self, start: NaiveDate, first: f64, step: f64, days: usize) -> Self {
        let mut close = first;
        self.closes = (0..days)
            .map(|i| {
                if i > 0 {
                    close *= if i % 2 == 0 { step.exp() } else { (-step).exp() };
                }
                DailyClose {
                    date: start + chrono::Duration::days(i as i64),
                    close,
                }
            })
            .collect();
        self
    }

    /// Drop every put price so only calls are quotable
    pub fn without_put_prices(mut self) -> Self {
        let puts: Vec<String> = self
            .instruments
            .iter()
            .filter(|i| i.option_type == OptionType::Put)
            .map(|i| i.name.clone())
            .collect();
        for name in puts {
            self.prices.remove(&name);
        }
        self
    }
}

#[async_trait]
impl MarketData for MockMarketData {
    async fn spot(&self, asset: &AssetConfig) -> CviResult<f64> {
        self.spot
            .ok_or_else(|| CviError::network(format!("primary spot down for {}", asset.symbol)))
    }

    async fn secondary_spot(&self, asset: &AssetConfig) -> CviResult<f64> {
        self.secondary
            .ok_or_else(|| CviError::network(format!("secondary spot down for {}", asset.symbol)))
    }

    async fn option_instruments(&self, asset: &AssetConfig) -> CviResult<Vec<OptionInstrument>> {
        if self.instruments.is_empty() {
            return Err(CviError::data(format!("no instruments for {}", asset.symbol)));
        }
        Ok(self.instruments.clone())
    }

    async fn option_price(&self, instrument_name: &str) -> CviResult<f64> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.quote_delay.is_zero() {
            tokio::time::sleep(self.quote_delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.prices
            .get(instrument_name)
            .copied()
            .ok_or_else(|| CviError::data(format!("no quote for {}", instrument_name)))
    }

    async fn daily_closes(&self, asset: &AssetConfig) -> CviResult<Vec<DailyClose>> {
        if self.closes.is_empty() {
            return Err(CviError::network(format!("history down for {}", asset.symbol)));
        }
        Ok(self.closes.clone())
    }
}
