//! Coinbase spot price client (primary spot feed)

use serde::Deserialize;

use crate::core::{CviError, CviResult};

use super::http::HttpClient;

/// Coinbase API client
#[derive(Debug, Clone)]
pub struct CoinbaseClient {
    http: HttpClient,
    base_url: String,
}

impl CoinbaseClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Spot price in USD for a symbol, e.g. "BTC"
    pub async fn get_spot(&self, symbol: &str) -> CviResult<f64> {
        let url = format!(
            "{}/v2/prices/{}-USD/spot",
            self.base_url,
            symbol.to_uppercase()
        );
        let response: CoinbaseSpotResponse = self.http.get_json(&url, &[], &[]).await?;

        response
            .data
            .amount
            .trim()
            .parse::<f64>()
            .map_err(|e| CviError::data(format!("Bad spot amount for {}: {}", symbol, e)))
    }
}

// Coinbase API response structures

#[derive(Debug, Deserialize)]
struct CoinbaseSpotResponse {
    data: CoinbaseAmount,
}

#[derive(Debug, Deserialize)]
struct CoinbaseAmount {
    amount: String,
}
