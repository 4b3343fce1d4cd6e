//! Market data gateway
//!
//! `MarketData` is the seam between the pipeline and the outside world. The
//! live implementation combines Coinbase (primary spot), Deribit (index
//! price, option listing and quotes) and CoinGecko (daily closes), all
//! sharing one retrying HTTP client.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::{AssetConfig, GatewayConfig};
use crate::core::{CviError, CviResult, DailyClose, OptionInstrument};

use super::coinbase::CoinbaseClient;
use super::coingecko::CoinGeckoClient;
use super::deribit::DeribitClient;
use super::http::HttpClient;
use super::retry::RetryPolicy;

/// Source of spot, option and history data
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Primary live spot feed
    async fn spot(&self, asset: &AssetConfig) -> CviResult<f64>;

    /// Secondary live spot feed (different provider or derived index)
    async fn secondary_spot(&self, asset: &AssetConfig) -> CviResult<f64>;

    /// Listed option instruments for the asset
    async fn option_instruments(&self, asset: &AssetConfig) -> CviResult<Vec<OptionInstrument>>;

    /// USD price of a single option instrument
    async fn option_price(&self, instrument_name: &str) -> CviResult<f64>;

    /// Historical daily closes, oldest first
    async fn daily_closes(&self, asset: &AssetConfig) -> CviResult<Vec<DailyClose>>;
}

/// Live HTTP gateway
#[derive(Debug, Clone)]
pub struct LiveGateway {
    coinbase: CoinbaseClient,
    deribit: DeribitClient,
    coingecko: CoinGeckoClient,
}

impl LiveGateway {
    pub fn new(config: &GatewayConfig, retry: &RetryPolicy) -> CviResult<Self> {
        let http = HttpClient::new(Duration::from_secs(config.timeout_secs), retry.clone())?;

        Ok(Self {
            coinbase: CoinbaseClient::new(http.clone(), &config.coinbase_url),
            deribit: DeribitClient::new(http.clone(), &config.deribit_url),
            coingecko: CoinGeckoClient::new(
                http,
                &config.coingecko_public_url,
                &config.coingecko_pro_url,
                config.coingecko_api_key.clone(),
            ),
        })
    }

    fn deribit_currency(asset: &AssetConfig) -> CviResult<&str> {
        asset
            .deribit_currency
            .as_deref()
            .ok_or_else(|| CviError::data(format!("{} has no options venue", asset.symbol)))
    }
}

#[async_trait]
impl MarketData for LiveGateway {
    async fn spot(&self, asset: &AssetConfig) -> CviResult<f64> {
        self.coinbase.get_spot(&asset.symbol).await
    }

    async fn secondary_spot(&self, asset: &AssetConfig) -> CviResult<f64> {
        let currency = Self::deribit_currency(asset)?;
        self.deribit.get_index_price(currency).await
    }

    async fn option_instruments(&self, asset: &AssetConfig) -> CviResult<Vec<OptionInstrument>> {
        let currency = Self::deribit_currency(asset)?;
        self.deribit.get_instruments(currency).await
    }

    async fn option_price(&self, instrument_name: &str) -> CviResult<f64> {
        self.deribit.get_option_price(instrument_name).await
    }

    async fn daily_closes(&self, asset: &AssetConfig) -> CviResult<Vec<DailyClose>> {
        self.coingecko.get_daily_closes(&asset.coingecko_id).await
    }
}
