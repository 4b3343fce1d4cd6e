//! Deribit public API client
//!
//! Option listings, per-instrument tickers and the underlying index price.
//! Inverse (coin-settled) options are quoted in units of the underlying and
//! converted to USD here.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::core::{CviError, CviResult, OptionInstrument, OptionType};

use super::http::HttpClient;

/// Deribit API client
#[derive(Debug, Clone)]
pub struct DeribitClient {
    http: HttpClient,
    base_url: String,
}

impl DeribitClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/api/v2/public/{}", self.base_url, method)
    }

    /// Non-expired option instruments for a currency
    pub async fn get_instruments(&self, currency: &str) -> CviResult<Vec<OptionInstrument>> {
        let response: DeribitResponse<Vec<DeribitInstrument>> = self
            .http
            .get_json(
                &self.endpoint("get_instruments"),
                &[("currency", currency), ("kind", "option"), ("expired", "false")],
                &[],
            )
            .await?;

        let instruments: Vec<OptionInstrument> = response
            .result
            .into_iter()
            .filter_map(DeribitInstrument::into_instrument)
            .collect();

        tracing::debug!(currency, count = instruments.len(), "Loaded option instruments");
        Ok(instruments)
    }

    /// USD price of one option: mark price, falling back to last trade
    pub async fn get_option_price(&self, instrument_name: &str) -> CviResult<f64> {
        let response: DeribitResponse<DeribitTicker> = self
            .http
            .get_json(
                &self.endpoint("ticker"),
                &[("instrument_name", instrument_name)],
                &[],
            )
            .await?;

        response
            .result
            .usd_price()
            .ok_or_else(|| CviError::data(format!("No usable price for {}", instrument_name)))
    }

    /// Underlying index price, e.g. `btc_usd`
    pub async fn get_index_price(&self, currency: &str) -> CviResult<f64> {
        let index_name = format!("{}_usd", currency.to_lowercase());
        let response: DeribitResponse<DeribitIndex> = self
            .http
            .get_json(
                &self.endpoint("get_index_price"),
                &[("index_name", index_name.as_str())],
                &[],
            )
            .await?;

        Ok(response.result.index_price)
    }
}

// Deribit API response structures

#[derive(Debug, Deserialize)]
struct DeribitResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct DeribitInstrument {
    instrument_name: String,
    strike: Option<f64>,
    expiration_timestamp: i64,
    option_type: Option<String>,
    #[serde(default)]
    is_active: bool,
}

impl DeribitInstrument {
    fn into_instrument(self) -> Option<OptionInstrument> {
        let option_type = match self.option_type.as_deref()? {
            "call" => OptionType::Call,
            "put" => OptionType::Put,
            _ => return None,
        };
        let expiry: DateTime<Utc> = DateTime::from_timestamp_millis(self.expiration_timestamp)?;

        Some(OptionInstrument {
            name: self.instrument_name,
            strike: self.strike?,
            expiry,
            option_type,
            active: self.is_active,
        })
    }
}

#[derive(Debug, Deserialize)]
struct DeribitTicker {
    mark_price: Option<f64>,
    last_price: Option<f64>,
    underlying_price: Option<f64>,
    index_price: Option<f64>,
}

impl DeribitTicker {
    /// Price in USD: coin-denominated quote times the underlying
    fn usd_price(&self) -> Option<f64> {
        let coin_price = self
            .mark_price
            .filter(|p| p.is_finite() && *p > 0.0)
            .or(self.last_price.filter(|p| p.is_finite() && *p > 0.0))?;
        let underlying = self
            .underlying_price
            .filter(|p| p.is_finite() && *p > 0.0)
            .or(self.index_price.filter(|p| p.is_finite() && *p > 0.0))?;
        Some(coin_price * underlying)
    }
}

#[derive(Debug, Deserialize)]
struct DeribitIndex {
    index_price: f64,
}
