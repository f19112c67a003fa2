use thiserror::Error;

/// Top-level error of the whole tool.
///
/// Every failure surfaced to the user maps to one of these variants. All of
/// them are terminal for the run; no partial report is printed.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad or missing command line input e.g. malformed wallet address.
    #[error("Usage error: {0}")]
    Usage(String),

    /// Missing or invalid configuration e.g. API key environment variable
    /// is not defined.
    #[error("Config error: {0}")]
    Config(String),

    /// Transport-level failure while talking to an external endpoint.
    #[error("Network error: {0}")]
    Network(String),

    /// The explorer (or RPC node) answered, but with an error payload, a
    /// non-2xx status, or a response shape we cannot make sense of.
    #[error("API error: {0}")]
    Api(String),

    /// Explorer throttling. Retried internally with bounded backoff; only
    /// converted into `Api` once retries are exhausted.
    #[error("Rate limited: {0}")]
    RateLimit(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(format!("unexpected response shape; err={}", err))
    }
}
