use log::{debug, warn};
use serde::Deserialize;
use tokio::time::{sleep, Duration};

use crate::error::AppError;
use crate::types::ChainConfig;

/// Number of transactions requested per page from the explorer.
pub(crate) const PAGE_SIZE: usize = 10_000;
/// Maximum attempts per page when the explorer throttles us.
const MAX_ATTEMPTS: usize = 3;
/// Initial backoff delay; doubled after each throttled attempt.
const INITIAL_BACKOFF: Duration = Duration::from_millis(400);

/// One transaction record as returned from the explorer's `txlist` endpoint.
///
/// Explorers return every numeric field as a string; keep them as such and
/// let downstream parsing decide what to make of them.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTransaction {
    #[serde(rename = "blockNumber")]
    pub block_number: String,

    pub from: String,

    pub to: String,

    /// Calldata hex string prefixed with `0x`
    pub input: String,

    /// "0" for a successful transaction, "1" for a reverted one
    #[serde(rename = "isError")]
    pub is_error: String,
}

/// Envelope every explorer response comes wrapped in.
///
/// `result` is a transaction array on success, but a plain string on
/// explorer-side errors, so it is held as a raw value until `status` has
/// been looked at.
#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    message: String,
    result: serde_json::Value,
}

/// Client towards a chain's block-explorer HTTP API.
pub struct ExplorerClient {
    http: reqwest::Client,
    config: ChainConfig,
    api_key: String,
}

impl ExplorerClient {
    /// Create a client against the explorer of the configured chain.
    ///
    /// # Arguments
    /// * `config` - chain configuration selected at startup
    /// * `api_key` - explorer API key, already read from environment
    pub fn new(config: ChainConfig, api_key: String) -> Result<ExplorerClient, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(ExplorerClient { http, config, api_key })
    }

    /// Get all normal transactions of the specified wallet address, oldest
    /// first. The explorer caps each `txlist` response at one window of
    /// `PAGE_SIZE` rows (`page * offset` may not exceed it), so a full
    /// window is followed up by re-requesting with `startblock` moved to
    /// the last block received rather than by incrementing the page number.
    ///
    /// # Arguments
    /// * `address` - wallet address to list transactions for
    pub async fn get_list_normal_transactions(&self, address: &str) -> Result<Vec<RawTransaction>, AppError> {
        let mut txs: Vec<RawTransaction> = Vec::new();
        let mut start_block: u64 = 0;

        loop {
            let window = self.get_window_with_backoff(address, start_block).await?;
            let window_len = window.len();
            debug!("fetched txlist window from block {} for {}; {} transaction(s)", start_block, address, window_len);

            if window_len < PAGE_SIZE {
                txs.extend(window);
                break;
            }

            // re-request from the last block seen so a block split across
            // two windows is not lost; the extractor collapses the overlap
            let last_block = window[window_len - 1].block_number.parse::<u64>()
                .map_err(|e| AppError::Api(format!("non-numeric block number '{}'; err={}", window[window_len - 1].block_number, e)))?;

            txs.extend(window);
            start_block = next_start_block(start_block, last_block);
        }

        Ok(txs)
    }

    /// Fetch and parse a single window, retrying a bounded number of times
    /// when the explorer reports throttling. Once retries are exhausted the
    /// rate-limit error surfaces as an API error.
    async fn get_window_with_backoff(&self, address: &str, start_block: u64) -> Result<Vec<RawTransaction>, AppError> {
        let mut delay = INITIAL_BACKOFF;
        let mut attempt: usize = 1;

        loop {
            match self.get_window(address, start_block).await {
                Err(AppError::RateLimit(msg)) => {
                    if attempt == MAX_ATTEMPTS {
                        return Err(AppError::Api(format!("rate limited after {} attempts; {}", MAX_ATTEMPTS, msg)));
                    }
                    warn!("explorer throttled (attempt {}); backing off {} ms", attempt, delay.as_millis());
                    sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                },
                other => return other,
            }
        }
    }

    async fn get_window(&self, address: &str, start_block: u64) -> Result<Vec<RawTransaction>, AppError> {
        let start_block_str = start_block.to_string();
        let offset_str = PAGE_SIZE.to_string();

        let response = self.http.get(self.config.api_base_url)
            .query(&[
                ("module", "account"),
                ("action", "txlist"),
                ("address", address),
                ("startblock", start_block_str.as_str()),
                ("endblock", "99999999"),
                ("page", "1"),
                ("offset", offset_str.as_str()),
                ("sort", "asc"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::RateLimit(format!("http {}", status)));
        }
        if !status.is_success() {
            return Err(AppError::Api(format!("http {}; body={}", status, body)));
        }

        parse_txlist_response(&body)
    }
}

/// Compute where the next fetch window starts after receiving a full one.
/// Normally the last block of the window just received; when one block
/// fills the entire window on its own, the start is forced past it so the
/// loop always advances.
fn next_start_block(current_start: u64, last_block: u64) -> u64 {
    if last_block > current_start {
        last_block
    } else {
        current_start + 1
    }
}

/// Parse and validate a `txlist` response body.
///
/// An empty transaction history is not an error; the explorer reports it
/// with a zero status and "No transactions found", which maps to an empty
/// vector. A throttle payload maps to `RateLimit` so the caller can retry.
/// Anything else that is not a well-formed transaction array fails with
/// `Api`.
pub fn parse_txlist_response(body: &str) -> Result<Vec<RawTransaction>, AppError> {
    let response: ExplorerResponse = serde_json::from_str(body)?;

    if response.status != "1" {
        let detail = match &response.result {
            serde_json::Value::String(s) => s.to_owned(),
            _ => response.message.to_owned(),
        };

        if detail.to_lowercase().contains("rate limit") {
            return Err(AppError::RateLimit(detail));
        }
        if response.message == "No transactions found" {
            return Ok(Vec::new());
        }
        return Err(AppError::Api(format!("explorer error: {}; {}", response.message, detail)));
    }

    let txs: Vec<RawTransaction> = serde_json::from_value(response.result)?;
    Ok(txs)
}
