//! Batch run through the HTTP gateway against a local mock server
//!
//! One mock server plays Coinbase, Deribit and CoinGecko so the full
//! request path (URLs, query parameters, response parsing, unit
//! conversion) is exercised end to end.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use mockito::{Matcher, Server, ServerGuard};
use tempfile::tempdir;

use cvi_engine::config::{AssetConfig, EngineConfig};
use cvi_engine::core::{year_fraction, OptionType, SpotSource};
use cvi_engine::data::{LiveGateway, RetryPolicy};
use cvi_engine::models::price;
use cvi_engine::pipeline::Engine;
use cvi_engine::surface::IvSource;

const SPOT: f64 = 50_000.0;
const VOL: f64 = 0.65;
const STRIKES: [f64; 5] = [40_000.0, 45_000.0, 50_000.0, 55_000.0, 60_000.0];

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
}

fn expiry() -> DateTime<Utc> {
    now() + Duration::days(30)
}

fn instrument_name(strike: f64) -> String {
    format!("BTC-31MAR25-{}-C", strike as i64)
}

fn engine_for(server: &ServerGuard, output: &std::path::Path) -> Engine {
    let btc = AssetConfig::new("BTC", "bitcoin", Some("BTC"));
    let mut config = EngineConfig::with_assets(vec![btc]);
    config.output_dir = output.to_path_buf();
    config.pacing_ms = 0;
    config.gateway.coinbase_url = server.url();
    config.gateway.deribit_url = server.url();
    config.gateway.coingecko_public_url = server.url();
    config.gateway.coingecko_pro_url = server.url();
    config.gateway.coingecko_api_key = None;
    config.gateway.request_jitter_ms = 0;
    config.gateway.risk_free_rate = 0.0;
    config.retry = RetryPolicy::none();

    let gateway = LiveGateway::new(&config.gateway, &config.retry).unwrap();
    Engine::new(Arc::new(gateway), config).unwrap()
}

/// Listing, tickers and index for a flat-vol BTC call chain
async fn mock_deribit(server: &mut Server) -> Vec<mockito::Mock> {
    let mut mocks = Vec::new();

    let expiry_ms = expiry().timestamp_millis();
    let listing: Vec<String> = STRIKES
        .iter()
        .map(|&k| {
            format!(
                r#"{{"instrument_name":"{}","strike":{},"expiration_timestamp":{},"option_type":"call","is_active":true}}"#,
                instrument_name(k),
                k,
                expiry_ms
            )
        })
        .collect();
    mocks.push(
        server
            .mock("GET", "/api/v2/public/get_instruments")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("currency".into(), "BTC".into()),
                Matcher::UrlEncoded("kind".into(), "option".into()),
            ]))
            .with_status(200)
            .with_body(format!(r#"{{"jsonrpc":"2.0","result":[{}]}}"#, listing.join(",")))
            .create_async()
            .await,
    );

    // Deribit quotes options in coin units
    let time = year_fraction(30.0);
    for &k in &STRIKES {
        let usd = price(SPOT, k, 0.0, VOL, time, OptionType::Call);
        mocks.push(
            server
                .mock("GET", "/api/v2/public/ticker")
                .match_query(Matcher::UrlEncoded("instrument_name".into(), instrument_name(k)))
                .with_status(200)
                .with_body(format!(
                    r#"{{"result":{{"mark_price":{},"underlying_price":{}}}}}"#,
                    usd / SPOT,
                    SPOT
                ))
                .create_async()
                .await,
        );
    }

    mocks.push(
        server
            .mock("GET", "/api/v2/public/get_index_price")
            .match_query(Matcher::UrlEncoded("index_name".into(), "btc_usd".into()))
            .with_status(200)
            .with_body(r#"{"result":{"index_price":49950.0}}"#)
            .create_async()
            .await,
    );

    mocks
}

async fn mock_coingecko(server: &mut Server) -> mockito::Mock {
    let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let prices: Vec<String> = (0..40)
        .map(|d| {
            let ms = (start + Duration::days(d)).timestamp_millis();
            let close = SPOT * if d % 2 == 0 { 1.01 } else { 0.99 };
            format!("[{},{}]", ms, close)
        })
        .collect();

    server
        .mock("GET", "/coins/bitcoin/market_chart")
        .match_query(Matcher::UrlEncoded("vs_currency".into(), "usd".into()))
        .with_status(200)
        .with_body(format!(r#"{{"prices":[{}]}}"#, prices.join(",")))
        .create_async()
        .await
}

#[tokio::test]
async fn test_batch_over_http_recovers_vol() {
    let mut server = Server::new_async().await;
    let spot = server
        .mock("GET", "/v2/prices/BTC-USD/spot")
        .with_status(200)
        .with_body(r#"{"data":{"base":"BTC","currency":"USD","amount":"50000.00"}}"#)
        .create_async()
        .await;
    let _deribit = mock_deribit(&mut server).await;
    let closes = mock_coingecko(&mut server).await;

    let dir = tempdir().unwrap();
    let report = engine_for(&server, dir.path()).run_batch(now()).await;
    let btc = report.asset("BTC").unwrap();

    assert!(btc.healthy, "{:?}", btc.error);
    assert_eq!(btc.spot.unwrap().source, SpotSource::Primary);
    assert_eq!(btc.spot.unwrap().value, SPOT);
    assert_eq!(btc.iv_source, Some(IvSource::Observed));

    let latest = btc.latest.clone().unwrap();
    assert!((latest.atm_iv.unwrap() - VOL).abs() < 1e-3);
    assert!((latest.vega_weighted_iv.unwrap() - VOL).abs() < 1e-3);
    assert!((latest.days_to_expiry - 30.0).abs() < 1e-6);

    spot.assert_async().await;
    closes.assert_async().await;
}

#[tokio::test]
async fn test_primary_spot_outage_uses_index() {
    let mut server = Server::new_async().await;
    let spot = server
        .mock("GET", "/v2/prices/BTC-USD/spot")
        .with_status(503)
        .expect(1)
        .create_async()
        .await;
    let _deribit = mock_deribit(&mut server).await;
    let _closes = mock_coingecko(&mut server).await;

    let dir = tempdir().unwrap();
    let report = engine_for(&server, dir.path()).run_batch(now()).await;
    let btc = report.asset("BTC").unwrap();

    let quote = btc.spot.unwrap();
    assert_eq!(quote.source, SpotSource::Secondary);
    assert_eq!(quote.value, 49_950.0);
    assert_eq!(btc.iv_source, Some(IvSource::Observed));

    spot.assert_async().await;
}

#[tokio::test]
async fn test_no_option_venue_falls_back_to_realized_vol() {
    let mut server = Server::new_async().await;
    let _spot = server
        .mock("GET", "/v2/prices/BTC-USD/spot")
        .with_status(200)
        .with_body(r#"{"data":{"amount":"50000"}}"#)
        .create_async()
        .await;
    let _listing = server
        .mock("GET", "/api/v2/public/get_instruments")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;
    let _closes = mock_coingecko(&mut server).await;

    let dir = tempdir().unwrap();
    let report = engine_for(&server, dir.path()).run_batch(now()).await;
    let btc = report.asset("BTC").unwrap();

    assert!(btc.healthy);
    assert_eq!(btc.iv_source, Some(IvSource::RealizedVol));
    let iv = btc.latest.as_ref().and_then(|p| p.vega_weighted_iv).unwrap();
    assert!(iv.is_finite() && iv > 0.0);
}
