use regex::Regex;
use std::collections::HashMap;
use web3::{
    Web3,
    types::Address,
    transports::http::Http,
    contract::{Contract, Options, tokens::Detokenize},
};

use crate::error::AppError;
use crate::types::{ApprovalRecord, ChainConfig};

pub type Web3Type = web3::Web3<web3::transports::http::Http>;

// to avoid having to relying on reading external file
// currently contains "symbol" and "name" (this one is not used yet)
static ABI_STR: &'static str = r#"[{"inputs":[],"name":"symbol","outputs":[{"internalType":"string","name":"","type":"string"}],"stateMutability":"view","type":"function"},{"inputs":[],"name":"name","outputs":[{"internalType":"string","name":"","type":"string"}],"stateMutability":"view","type":"function"}]"#;

/// Validate whether the specified address is in correct format.
/// Return true if the format is correct, otherwise return false.
///
/// # Arguments
/// * `address` - address to check its format correctness
pub fn validate_address_format(address: &str) -> bool {
    let lowercase_address = address.to_lowercase();
    let regex: Regex = Regex::new(r#"^(0x)?[0-9a-f]{40}$"#).unwrap();

    regex.is_match(&lowercase_address)
}

/// Perform check whether the specified address is an EOA.
/// Return true if it is, otherwise return false.
///
/// # Arguments
/// * `web3` - instance of web3
/// * `address` - address to check; in format `0x...`.
pub async fn perform_check_is_eoa(web3: &Web3<Http>, address: &str) -> Result<bool, AppError> {
    let address = get_address_from_str(address)?;

    // a contract address has code deployed at it, an EOA has none
    let code_bytes = web3.eth().code(address, None).await
        .map_err(|e| AppError::Network(format!("Error awaiting result for code from address; err={}", e)))?;

    Ok(code_bytes.0.is_empty())
}

/// Get `Address` from string literal.
///
/// # Arguments
/// * `address` - address string literal prefixed with '0x'
pub fn get_address_from_str(address: &str) -> Result<Address, AppError> {
    if !validate_address_format(address) {
        return Err(AppError::Usage(format!("address is not in the correct format; addr={}", address)));
    }

    let address_hexbytes_decoded = hex::decode(&address[2..])
        .map_err(|e| AppError::Usage(format!("Error hex decoding of address ({}); err={}", address, e)))?;

    Ok(Address::from_slice(address_hexbytes_decoded.as_slice()))
}

/// Create a web3 instance against the configured chain's RPC endpoint.
///
/// # Arguments
/// * `config` - chain configuration selected at startup
pub fn create_web3(config: &ChainConfig) -> Result<Web3<Http>, AppError> {
    let http = Http::new(config.rpc_endpoint)
        .map_err(|e| AppError::Network(format!("Error creating HTTP transport towards {}; err={}", config.rpc_endpoint, e)))?;
    Ok(Web3::new(http))
}

/// Parse a long hex string into vector of hex string of 64 characters in length (256 bit)
/// excluding the prefixed method-id which has 8 characters in length (32 bit).
/// Return a vector of hex string of 64 characters in length (256 bit);
///
/// # Arguments
/// * `long_hex_str` - input long hex string to parse; included a prefix of `0x`
pub fn parse_256_method_arguments(long_hex_str: &str) -> Result<Vec<String>, String> {
    if long_hex_str.len() == 0 {
        return Ok(Vec::new());
    }

    // get slice excluding prefix of method-id
    let arguments_hex_str = &long_hex_str[10..];

    // the length of input stringis not long enough to get at least one element
    if arguments_hex_str.len() < 64 {
        return Err("Input hex string length is not long enough to be parsed.
It needs to have at least 64 characters in length included with prefix of 0x".to_owned());
    }

    let mut offset_i: usize = 0;
    let mut res_vec: Vec<String> = Vec::new();

    while offset_i + 64 <= arguments_hex_str.len() {
        res_vec.push((&arguments_hex_str[offset_i..offset_i+64]).to_owned());
        offset_i += 64;
    }

    Ok(res_vec)
}

/// Create a contract
///
/// # Arguments
/// * `web3` - web3 instance
/// * `contract_address_str` - contract address string
/// * `abi_str` - abi
pub fn create_contract(web3: &Web3<Http>, contract_address_str: &str, abi_str: &str) -> Result<Contract<Http>, AppError> {
    let contract_address = get_address_from_str(contract_address_str)?;

    // create a contract from contract address, and abi
    Contract::from_json(web3.eth(), contract_address, abi_str.as_bytes())
        .map_err(|e| AppError::Api(format!("Error creating contract associated with abi for {}; err={}", contract_address_str, e)))
}

// NOTE: Interesting hidden type captures the anonymous lifetime
/// Utility function to make a web3 query.
/// Internally this function will use default options with no parameters specified
/// to make call to specified function.
///
/// This requires no gas fee as it is a query which changes no states of blockchain.
///
/// # Arguments
/// * `contract` - `web3::contract::Contract`
/// * `fn_name` - name of function to make a call
pub fn web3_query_no_params<'a, R>(contract: &'a Contract<Http>, fn_name: &'a str) -> impl core::future::Future<Output = web3::contract::Result<R>> + 'a
where
    R: Detokenize + 'a
{
    contract.query(fn_name, (), None, Options::default(), None)
}

/// Resolve the token symbol of every record via one `symbol()` query per
/// distinct token contract, sequentially. Any query failure is terminal.
///
/// # Arguments
/// * `web3` - instance of web3
/// * `records` - extracted approval records to fill symbols into
pub async fn resolve_token_symbols(web3: &Web3Type, records: &mut [ApprovalRecord]) -> Result<(), AppError> {
    let mut symbols: HashMap<String, String> = HashMap::new();

    for i in 0..records.len() {
        let token_contract = records[i].token_contract.to_owned();

        if !symbols.contains_key(&token_contract) {
            let contract = create_contract(web3, &token_contract, ABI_STR)?;
            let symbol: String = web3_query_no_params(&contract, "symbol").await
                .map_err(|e| AppError::Api(format!("Error querying symbol of {}; err={}", token_contract, e)))?;
            symbols.insert(token_contract.to_owned(), symbol);
        }

        records[i].token_symbol = symbols[&token_contract].to_owned();
    }

    Ok(())
}

/// Start measuring time. Suitable for wall-clock time measurement.
pub fn measure_start(start: &mut std::time::Instant) {
    *start = std::time::Instant::now();
}

/// Mark the end of the measurement of time performance.
/// Return result in seconds, along with printing the elapsed time if `also_print`
/// is `true`.
pub fn measure_end(start: &std::time::Instant, also_print: bool) -> f64 {
    let elapsed = start.elapsed().as_secs_f64();
    if also_print {
        println!("(elapsed = {:.2} secs)", elapsed);
    }
    elapsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_format_validation() {
        assert!(validate_address_format("0x1111111111111111111111111111111111111111"));
        assert!(validate_address_format("1111111111111111111111111111111111111111"));
        assert!(validate_address_format("0xABCDEFabcdef0123456789abcdef0123456789ab"));

        assert!(!validate_address_format("0x11"));
        assert!(!validate_address_format("0xzz11111111111111111111111111111111111111"));
        assert!(!validate_address_format(""));
    }

    #[test]
    fn parses_method_arguments_into_256_bit_words() {
        let input = format!("0x095ea7b3{}{}", "1".repeat(64), "2".repeat(64));
        let words = parse_256_method_arguments(&input).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0], "1".repeat(64));
        assert_eq!(words[1], "2".repeat(64));
    }

    #[test]
    fn short_calldata_fails_to_parse() {
        let input = format!("0x095ea7b3{}", "1".repeat(32));
        assert!(parse_256_method_arguments(&input).is_err());
    }

    #[test]
    fn empty_calldata_parses_to_no_arguments() {
        assert!(parse_256_method_arguments("").unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_address_as_usage_error() {
        assert!(matches!(get_address_from_str("0x1234"), Err(AppError::Usage(_))));
    }
}
