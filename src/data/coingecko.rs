//! CoinGecko daily closes
//!
//! Historical daily closes for the realized-vol fallback and research
//! features. With an API key the Pro host is tried first; any failure there
//! falls back to the public host without the key.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

use crate::core::{CviResult, DailyClose};

use super::http::HttpClient;

/// CoinGecko API client
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http: HttpClient,
    public_url: String,
    pro_url: String,
    api_key: Option<String>,
}

impl CoinGeckoClient {
    pub fn new(
        http: HttpClient,
        public_url: impl Into<String>,
        pro_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            http,
            public_url: public_url.into().trim_end_matches('/').to_string(),
            pro_url: pro_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Daily closes in USD, oldest first, one per UTC date
    pub async fn get_daily_closes(&self, coin_id: &str) -> CviResult<Vec<DailyClose>> {
        let query = [("vs_currency", "usd"), ("days", "365"), ("interval", "daily")];

        let chart = match &self.api_key {
            Some(key) => {
                let url = format!("{}/coins/{}/market_chart", self.pro_url, coin_id);
                match self
                    .http
                    .get_json::<MarketChart>(&url, &query, &[("x-cg-pro-api-key", key.as_str())])
                    .await
                {
                    Ok(chart) => chart,
                    Err(e) => {
                        tracing::warn!(
                            coin_id,
                            error = %e,
                            "CoinGecko Pro request failed, using public host"
                        );
                        self.get_public(coin_id, &query).await?
                    }
                }
            }
            None => self.get_public(coin_id, &query).await?,
        };

        Ok(chart.daily_closes())
    }

    async fn get_public(&self, coin_id: &str, query: &[(&str, &str)]) -> CviResult<MarketChart> {
        let url = format!("{}/coins/{}/market_chart", self.public_url, coin_id);
        self.http
            .get_json(&url, query, &[("accept", "application/json")])
            .await
    }
}

// CoinGecko API response structures

#[derive(Debug, Deserialize)]
struct MarketChart {
    #[serde(default)]
    prices: Vec<(f64, f64)>,
}

impl MarketChart {
    /// Collapse [ms, price] samples to the last price per UTC date
    fn daily_closes(&self) -> Vec<DailyClose> {
        let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for &(ms, price) in &self.prices {
            if !price.is_finite() || price <= 0.0 {
                continue;
            }
            if let Some(ts) = DateTime::from_timestamp_millis(ms as i64) {
                by_date.insert(ts.date_naive(), price);
            }
        }
        by_date
            .into_iter()
            .map(|(date, close)| DailyClose { date, close })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RetryPolicy;
    use mockito::Matcher;
    use std::time::Duration;

    const CHART: &str = r#"{"prices":[
        [1704067200000, 42000.0],
        [1704110400000, 42500.0],
        [1704153600000, 43000.0],
        [1704240000000, 44000.0]
    ]}"#;

    fn http() -> HttpClient {
        HttpClient::new(Duration::from_secs(5), RetryPolicy::none()).unwrap()
    }

    #[test]
    fn test_daily_collapse_keeps_last() {
        let chart: MarketChart = serde_json::from_str(CHART).unwrap();
        let closes = chart.daily_closes();

        assert_eq!(closes.len(), 3);
        assert_eq!(closes[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(closes[0].close, 42500.0);
        assert_eq!(closes[2].close, 44000.0);
    }

    #[tokio::test]
    async fn test_public_host_without_key() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/coins/bitcoin/market_chart")
            .match_query(Matcher::UrlEncoded("vs_currency".into(), "usd".into()))
            .with_status(200)
            .with_body(CHART)
            .expect(1)
            .create_async()
            .await;

        let client = CoinGeckoClient::new(http(), server.url(), "http://127.0.0.1:9", None);
        let closes = client.get_daily_closes("bitcoin").await.unwrap();

        assert_eq!(closes.len(), 3);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_pro_rejection_falls_back_to_public() {
        let mut pro = mockito::Server::new_async().await;
        let mut public = mockito::Server::new_async().await;

        let pro_mock = pro
            .mock("GET", "/coins/ethereum/market_chart")
            .match_query(Matcher::Any)
            .match_header("x-cg-pro-api-key", "secret")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let public_mock = public
            .mock("GET", "/coins/ethereum/market_chart")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(CHART)
            .expect(1)
            .create_async()
            .await;

        let client = CoinGeckoClient::new(http(), public.url(), pro.url(), Some("secret".into()));
        let closes = client.get_daily_closes("ethereum").await.unwrap();

        assert_eq!(closes.len(), 3);
        pro_mock.assert_async().await;
        public_mock.assert_async().await;
    }
}
