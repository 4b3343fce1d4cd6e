//! Shared JSON-over-HTTP client
//!
//! Every provider request goes through `HttpClient::get_json`, which applies
//! the request timeout and the retry policy in one place.

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use serde::de::DeserializeOwned;

use crate::core::{CviError, CviResult};

use super::retry::{with_retry, RetryPolicy};

/// Thin wrapper over `reqwest::Client` with timeout and retry
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> CviResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cvi-engine/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| CviError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, retry })
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// GET `url` and decode the JSON body, retrying transient failures
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> CviResult<T> {
        with_retry(&self.retry, url, || self.get_once(url, query, headers)).await
    }

    /// GET without retry
    pub async fn get_once<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> CviResult<T> {
        let mut request = self.client.get(url).query(query);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());

            tracing::debug!(status = status.as_u16(), url, "Non-success response");
            return Err(CviError::Http {
                status: status.as_u16(),
                url: url.to_string(),
                retry_after,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| CviError::data(format!("Failed to parse response from {}: {}", url, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Ping {
        ok: bool,
    }

    fn client(max_attempts: u32) -> HttpClient {
        let retry = RetryPolicy {
            max_attempts,
            base_delay_ms: 1,
            max_delay_ms: 5,
            jitter_ms: 1,
        };
        HttpClient::new(Duration::from_secs(5), retry).unwrap()
    }

    #[tokio::test]
    async fn test_retries_rate_limit_then_succeeds() {
        let mut server = mockito::Server::new_async().await;
        let limited = server
            .mock("GET", "/ping")
            .with_status(429)
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/ping")
            .with_status(200)
            .with_body(r#"{"ok": true}"#)
            .expect(1)
            .create_async()
            .await;

        let url = format!("{}/ping", server.url());
        let ping: Ping = client(3).get_json(&url, &[], &[]).await.unwrap();

        assert!(ping.ok);
        limited.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let missing = server
            .mock("GET", "/missing")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let url = format!("{}/missing", server.url());
        let result: CviResult<Ping> = client(4).get_json(&url, &[], &[]).await;

        match result {
            Err(CviError::Http { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected HTTP 404, got {:?}", other),
        }
        missing.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_errors_exhaust_attempts() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/down")
            .with_status(502)
            .expect(3)
            .create_async()
            .await;

        let url = format!("{}/down", server.url());
        let result: CviResult<Ping> = client(3).get_json(&url, &[], &[]).await;

        assert!(result.is_err());
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_json_is_data_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/garbage")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let url = format!("{}/garbage", server.url());
        let result: CviResult<Ping> = client(2).get_json(&url, &[], &[]).await;
        assert!(matches!(result, Err(CviError::Data(_))));
    }
}
