//! Market data access
//!
//! Handles:
//! - Coinbase spot prices (primary)
//! - Deribit index prices, option instruments and quotes
//! - CoinGecko daily close history (Pro key first, public fallback)
//! - Retry with backoff, bounded-concurrency quote fetching, fallback chains

pub mod chain;
pub mod coinbase;
pub mod coingecko;
pub mod deribit;
pub mod fallback;
pub mod gateway;
pub mod http;
pub mod retry;
pub mod spot;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use chain::{fetch_option_chain, fetch_quotes, OptionChain};
pub use coinbase::CoinbaseClient;
pub use coingecko::CoinGeckoClient;
pub use deribit::DeribitClient;
pub use fallback::{
    first_present, first_present_async, positive_finite, AsyncProvider, Provider, ProviderFuture,
};
pub use gateway::{LiveGateway, MarketData};
pub use http::HttpClient;
pub use retry::{with_retry, RetryPolicy};
pub use spot::{SpotResolver, NEUTRAL_SPOT, SPOT_CHAIN};
