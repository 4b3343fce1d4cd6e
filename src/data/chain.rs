//! Option chain retrieval
//!
//! Lists instruments, narrows them to one expiry and a strike band, then
//! prices them through a bounded pool of concurrent quote requests. Calls are
//! preferred; puts are quoted only when calls are too sparse.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::{AssetConfig, GatewayConfig, SurfaceConfig};
use crate::core::{CviError, CviResult, OptionInstrument, OptionQuote, OptionType};
use crate::surface::{select_expiry, select_strikes};

use super::gateway::MarketData;

/// Priced quotes for the selected expiry
#[derive(Debug, Clone)]
pub struct OptionChain {
    pub expiry: DateTime<Utc>,
    pub days_to_expiry: f64,
    /// Liquid quotes, ordered by strike
    pub quotes: Vec<OptionQuote>,
}

impl OptionChain {
    pub fn calls(&self) -> impl Iterator<Item = &OptionQuote> {
        self.quotes.iter().filter(|q| q.option_type == OptionType::Call)
    }

    pub fn puts(&self) -> impl Iterator<Item = &OptionQuote> {
        self.quotes.iter().filter(|q| q.option_type == OptionType::Put)
    }
}

/// Fetch the option chain used for the smile
pub async fn fetch_option_chain(
    gateway: Arc<dyn MarketData>,
    asset: &AssetConfig,
    spot: f64,
    now: DateTime<Utc>,
    surface: &SurfaceConfig,
    limits: &GatewayConfig,
) -> CviResult<OptionChain> {
    let instruments = gateway.option_instruments(asset).await?;

    let expiry = select_expiry(&instruments, now, surface).ok_or_else(|| {
        CviError::data(format!(
            "{}: no eligible expiry among {} instruments",
            asset.symbol,
            instruments.len()
        ))
    })?;
    let days_to_expiry = crate::core::days_between(now, expiry);

    let calls = select_strikes(&instruments, expiry, spot, OptionType::Call, surface);
    let mut quotes = fetch_quotes(gateway.clone(), calls, limits).await;

    if quotes.len() < surface.min_smile_points {
        let puts = select_strikes(&instruments, expiry, spot, OptionType::Put, surface);
        tracing::info!(
            symbol = %asset.symbol,
            call_quotes = quotes.len(),
            puts = puts.len(),
            "Sparse call quotes, adding puts"
        );
        quotes.extend(fetch_quotes(gateway, puts, limits).await);
    }

    quotes.sort_by(|a, b| a.strike.total_cmp(&b.strike));

    tracing::debug!(
        symbol = %asset.symbol,
        expiry = %expiry,
        days_to_expiry,
        quotes = quotes.len(),
        "Option chain fetched"
    );

    Ok(OptionChain {
        expiry,
        days_to_expiry,
        quotes,
    })
}

/// Price instruments with at most `limits.concurrency` requests in flight.
///
/// Failed or illiquid quotes are dropped individually.
pub async fn fetch_quotes(
    gateway: Arc<dyn MarketData>,
    instruments: Vec<OptionInstrument>,
    limits: &GatewayConfig,
) -> Vec<OptionQuote> {
    if instruments.is_empty() {
        return Vec::new();
    }

    let permits = Arc::new(Semaphore::new(limits.concurrency.max(1)));
    let jitter_ms = if limits.concurrency <= GatewayConfig::SMALL_POOL {
        limits.request_jitter_ms
    } else {
        0
    };

    let mut tasks = JoinSet::new();
    for instrument in instruments {
        let gateway = gateway.clone();
        let permits = permits.clone();

        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await.ok()?;
            if jitter_ms > 0 {
                let wait = rand::random::<u64>() % jitter_ms;
                tokio::time::sleep(Duration::from_millis(wait)).await;
            }

            match gateway.option_price(&instrument.name).await {
                Ok(price) => {
                    let quote = OptionQuote::from_instrument(&instrument, price);
                    quote.is_liquid().then_some(quote)
                }
                Err(e) => {
                    tracing::debug!(instrument = %instrument.name, error = %e, "Quote unavailable");
                    None
                }
            }
        });
    }

    let mut quotes = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some(quote)) => quotes.push(quote),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Quote task failed"),
        }
    }

    quotes.sort_by(|a, b| a.strike.total_cmp(&b.strike));
    quotes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_utils::MockMarketData;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use std::sync::atomic::Ordering;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
    }

    fn strikes() -> Vec<f64> {
        (80..=120).step_by(5).map(|k| k as f64).collect()
    }

    #[tokio::test]
    async fn test_fetch_quotes_respects_concurrency() {
        let mut mock = MockMarketData::with_flat_chain(
            100.0,
            0.6,
            now(),
            now() + ChronoDuration::days(30),
            &strikes(),
        );
        mock.quote_delay = std::time::Duration::from_millis(20);
        let max_in_flight = mock.max_in_flight.clone();
        let instruments = mock.instruments.clone();
        let gateway: Arc<dyn MarketData> = Arc::new(mock);

        let limits = GatewayConfig {
            concurrency: 3,
            request_jitter_ms: 5,
            ..GatewayConfig::default()
        };
        let quotes = fetch_quotes(gateway, instruments.clone(), &limits).await;

        assert_eq!(quotes.len(), instruments.len());
        assert!(quotes.windows(2).all(|w| w[0].strike <= w[1].strike));
        let peak = max_in_flight.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= 3, "peak concurrency {}", peak);
    }

    #[tokio::test]
    async fn test_chain_prefers_calls() {
        let mock = MockMarketData::with_flat_chain(
            100.0,
            0.6,
            now(),
            now() + ChronoDuration::days(30),
            &strikes(),
        );
        let calls = mock.quote_calls.clone();
        let asset = AssetConfig::new("BTC", "bitcoin", Some("BTC"));
        let gateway: Arc<dyn MarketData> = Arc::new(mock);

        let chain = fetch_option_chain(
            gateway,
            &asset,
            100.0,
            now(),
            &SurfaceConfig::default(),
            &GatewayConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(chain.calls().count(), strikes().len());
        assert_eq!(chain.puts().count(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), strikes().len());
        assert!((chain.days_to_expiry - 30.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_chain_adds_puts_when_calls_sparse() {
        let mut mock = MockMarketData::with_flat_chain(
            100.0,
            0.6,
            now(),
            now() + ChronoDuration::days(30),
            &strikes(),
        );
        // Leave only two call prices
        let call_names: Vec<String> = mock
            .instruments
            .iter()
            .filter(|i| i.option_type == OptionType::Call && i.strike != 100.0 && i.strike != 105.0)
            .map(|i| i.name.clone())
            .collect();
        for name in call_names {
            mock.prices.remove(&name);
        }

        let asset = AssetConfig::new("BTC", "bitcoin", Some("BTC"));
        let chain = fetch_option_chain(
            Arc::new(mock),
            &asset,
            100.0,
            now(),
            &SurfaceConfig::default(),
            &GatewayConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(chain.calls().count(), 2);
        assert_eq!(chain.puts().count(), strikes().len());
    }

    #[tokio::test]
    async fn test_chain_errors_without_instruments() {
        let asset = AssetConfig::new("LINK", "chainlink", None);
        let result = fetch_option_chain(
            Arc::new(MockMarketData::with_spot(15.0)),
            &asset,
            15.0,
            now(),
            &SurfaceConfig::default(),
            &GatewayConfig::default(),
        )
        .await;
        assert!(result.is_err());
    }
}
