//! Logging setup
//!
//! # Environment Variables
//! - `LOG_FORMAT`: Output format - `json` (default) or `pretty`
//! - `RUST_LOG`: Log level filter (default: `info`)

use tracing_subscriber::EnvFilter;

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// Anything other than `pretty` means JSON
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }

    /// Format selected by `LOG_FORMAT` in the process environment
    pub fn from_env() -> Self {
        Self::parse(std::env::var("LOG_FORMAT").ok().as_deref())
    }
}

/// Initialize logging from `LOG_FORMAT` and `RUST_LOG`.
///
/// Reads the process environment as-is; load `.env` first when those
/// variables live there. Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let format = LogFormat::from_env();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .pretty()
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("Logging already initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse(None), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("pretty")), LogFormat::Pretty);
        // Case sensitive
        assert_eq!(LogFormat::parse(Some("PRETTY")), LogFormat::Json);
    }

    #[test]
    #[serial]
    fn test_log_format_from_dotenv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "LOG_FORMAT=pretty\n").unwrap();

        std::env::remove_var("LOG_FORMAT");
        assert_eq!(LogFormat::from_env(), LogFormat::Json);

        dotenvy::from_path(&path).unwrap();
        assert_eq!(LogFormat::from_env(), LogFormat::Pretty);
        std::env::remove_var("LOG_FORMAT");
    }

    #[test]
    #[serial]
    fn test_init_twice_does_not_panic() {
        init_logging();
        init_logging();
    }
}
