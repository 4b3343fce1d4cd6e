//! Error types for the CVI engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CviError {
    #[error("Data error: {0}")]
    Data(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} from {url}")]
    Http {
        status: u16,
        url: String,
        /// Seconds from a `Retry-After` header, when the server sent one
        retry_after: Option<u64>,
    },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type CviResult<T> = Result<T, CviError>;

impl CviError {
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn numerical(msg: impl Into<String>) -> Self {
        Self::Numerical(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Rate limits, server errors and timeouts are transient; everything else is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            CviError::Http { status, .. } => *status == 429 || (500..600).contains(status),
            CviError::Timeout(_) => true,
            _ => false,
        }
    }

    /// Server-requested wait, if any
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            CviError::Http { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CviError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return CviError::Timeout(e.to_string());
        }
        if let Some(status) = e.status() {
            return CviError::Http {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
                retry_after: None,
            };
        }
        if e.is_decode() {
            return CviError::Data(format!("Failed to decode response: {}", e));
        }
        CviError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for CviError {
    fn from(e: serde_json::Error) -> Self {
        CviError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> CviError {
        CviError::Http {
            status,
            url: "http://localhost/x".into(),
            retry_after: None,
        }
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(http(429).is_retryable());
        assert!(http(500).is_retryable());
        assert!(http(503).is_retryable());
        assert!(CviError::Timeout("slow".into()).is_retryable());

        assert!(!http(400).is_retryable());
        assert!(!http(404).is_retryable());
        assert!(!CviError::data("bad payload").is_retryable());
    }
}
