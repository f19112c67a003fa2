use clap::{ArgEnum, Parser};
use web3::types::U256;

use crate::error::AppError;

#[derive(Debug, Parser)]
#[clap(author="Wasin Thonkaew (wasin@wasin.io)")]
#[clap(name="appvkek")]
#[clap(about="cli tool to check your approval and allowance associated with token contract addresses out there")]
pub struct CommandlineArgs {
    /// User's wallet address to check against.
    #[clap(long="wallet-address", short='a', required=true)]
    pub address: String,

    /// Which chain to work against.
    #[clap(long="chain", short='c', arg_enum, required=true)]
    pub chain: Chain,

    /// Print total wall-clock time spent when the program finishes.
    #[clap(long="execution-time")]
    pub execution_time: bool,
}

/// Supported chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ArgEnum)]
pub enum Chain {
    Bsc,
    Ethereum,
    Polygon,
}

/// Immutable per-chain configuration selected once at startup from the
/// `--chain` flag, then passed explicitly to whoever needs it.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Which chain this configuration is for
    pub chain: Chain,

    /// Base URL of the chain's block-explorer HTTP API
    pub api_base_url: &'static str,

    /// Name of environment variable holding the explorer API key
    pub api_key_env_var: &'static str,

    /// RPC endpoint used for EOA checking and token symbol resolution
    pub rpc_endpoint: &'static str,
}

impl ChainConfig {
    pub fn new(chain: Chain) -> ChainConfig {
        match chain {
            Chain::Bsc => ChainConfig {
                chain,
                api_base_url: "https://api.bscscan.com/api",
                api_key_env_var: "APPVKEK_BSCSCAN_APIKEY",
                rpc_endpoint: "https://bsc-dataseed.binance.org/",
            },
            Chain::Ethereum => ChainConfig {
                chain,
                api_base_url: "https://api.etherscan.io/api",
                api_key_env_var: "APPVKEK_ETHERSCAN_APIKEY",
                rpc_endpoint: "https://rpc.ankr.com/eth",
            },
            Chain::Polygon => ChainConfig {
                chain,
                api_base_url: "https://api.polygonscan.com/api",
                api_key_env_var: "APPVKEK_POLYGONSCAN_APIKEY",
                rpc_endpoint: "https://polygon-rpc.com/",
            },
        }
    }

    /// Read the explorer API key from this chain's environment variable.
    /// A missing key is a `Config` error; nothing remote has been touched
    /// at this point.
    pub fn api_key_from_env(&self) -> Result<String, AppError> {
        std::env::var(self.api_key_env_var)
            .map_err(|_| AppError::Config(format!("Required environment variable '{}' to be defined", self.api_key_env_var)))
    }
}

/// One retained approval as granted by the owner wallet.
///
/// There is at most one record per (token contract, spender) pair; when the
/// same pair shows up multiple times in the transaction history, the one
/// from the later block is the one kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalRecord {
    /// Token contract address the approval was sent to
    pub token_contract: String,

    /// Token symbol; empty until resolved via RPC
    pub token_symbol: String,

    /// Spender address permitted to transfer on behalf of the owner
    pub spender: String,

    /// Allowance amount in the token's base unit. `U256::MAX` means
    /// unlimited approval and is kept verbatim.
    pub allowance: U256,

    /// Block number of the approve transaction; the ordering key for
    /// deduplication
    pub block_number: u64,
}
