use clap::Parser;
use dotenv::dotenv;
use log::info;

mod error;
mod explorer;
mod extract;
mod report;
mod types;
mod util;

use error::AppError;
use explorer::ExplorerClient;
use extract::extract_approvals;
use report::render_report;
use types::*;
use util::*;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    let cmd_args = CommandlineArgs::parse();

    let mut start_time = std::time::Instant::now();
    if cmd_args.execution_time {
        measure_start(&mut start_time);
    }

    if let Err(e) = run(&cmd_args).await {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    if cmd_args.execution_time {
        measure_end(&start_time, true);
    }
}

/// Fetch, extract, resolve, then render; strictly in that order. Any error
/// bubbles up and aborts the whole run without printing a partial report.
async fn run(cmd_args: &CommandlineArgs) -> Result<(), AppError> {
    // check if input address is in correct format before touching anything remote
    if !validate_address_format(&cmd_args.address) {
        return Err(AppError::Usage(format!("address is not in the correct format; addr={}", cmd_args.address)));
    }

    let config = ChainConfig::new(cmd_args.chain);
    info!("working against chain {:?} via {}", config.chain, config.api_base_url);

    // read the API key up front so a missing key fails before any HTTP request
    let api_key = config.api_key_from_env()?;

    let web3 = create_web3(&config)?;

    // input address must be an EOA, not a contract
    if !perform_check_is_eoa(&web3, &cmd_args.address).await? {
        return Err(AppError::Usage("input address is not EOA".to_owned()));
    }

    let client = ExplorerClient::new(config, api_key)?;
    let txs = client.get_list_normal_transactions(&cmd_args.address).await?;
    info!("fetched {} transaction(s) for {}", txs.len(), cmd_args.address);

    let mut records = extract_approvals(&txs, &cmd_args.address)?;
    info!("extracted {} approval record(s)", records.len());

    resolve_token_symbols(&web3, &mut records).await?;

    print!("{}", render_report(&records));
    Ok(())
}
