use std::collections::HashMap;
use web3::types::U256;

use crate::error::AppError;
use crate::explorer::RawTransaction;
use crate::types::ApprovalRecord;
use crate::util::parse_256_method_arguments;

/// Method-id of ERC-20 `approve(address,uint256)`
pub(crate) const APPROVE_METHOD_ID: &str = "0x095ea7b3";

/// Extract deduplicated approval records from the raw transaction history.
///
/// Keeps only successful `approve()` calls sent by the owner wallet. For
/// each (token contract, spender) pair at most one record is retained; a
/// record from a later block replaces the earlier one while keeping its
/// first-seen position. Pure function of its input; no I/O.
///
/// # Arguments
/// * `txs` - raw transaction records, as fetched from the explorer
/// * `owner_address` - owner wallet address the approvals were sent from
pub fn extract_approvals(txs: &[RawTransaction], owner_address: &str) -> Result<Vec<ApprovalRecord>, AppError> {
    let owner_lowercase = owner_address.to_lowercase();

    let mut records: Vec<ApprovalRecord> = Vec::new();
    let mut retained: HashMap<(String, String), usize> = HashMap::new();

    for tx in txs {
        if tx.from.to_lowercase() != owner_lowercase ||
           tx.is_error != "0" ||
           !tx.input.starts_with(APPROVE_METHOD_ID) {
            continue;
        }

        let arguments = parse_256_method_arguments(&tx.input)
            .map_err(|e| AppError::Api(format!("Error parsing arguments of {}; err={}", tx.to, e)))?;

        // approve() carries two arguments: spender, then amount
        if arguments.len() < 2 {
            return Err(AppError::Api(format!(
                "approve() calldata sent to {} holds {} argument(s); expected spender and amount",
                tx.to, arguments.len())));
        }

        // spender address is the low 160 bits of the first 256-bit word
        // (64 chars down to 40 chars by removing the first 24 chars)
        let mut spender = arguments[0][24..].to_lowercase();
        spender.insert_str(0, "0x");

        let allowance = u256_from_hex_word(&arguments[1])?;

        let block_number = tx.block_number.parse::<u64>()
            .map_err(|e| AppError::Api(format!("non-numeric block number '{}'; err={}", tx.block_number, e)))?;

        let token_contract = tx.to.to_lowercase();
        let key = (token_contract.to_owned(), spender.to_owned());

        match retained.get(&key) {
            Some(&i) => {
                // later ordering key wins; within the same block the later
                // list entry wins as the input is sorted oldest first
                if block_number >= records[i].block_number {
                    records[i].allowance = allowance;
                    records[i].block_number = block_number;
                }
            },
            None => {
                retained.insert(key, records.len());
                records.push(ApprovalRecord {
                    token_contract,
                    token_symbol: String::new(),
                    spender,
                    allowance,
                    block_number,
                });
            },
        }
    }

    Ok(records)
}

/// Parse one 256-bit hex word (64 chars, no prefix) into `U256` without any
/// rounding; an unlimited approval of `U256::MAX` passes through verbatim.
fn u256_from_hex_word(word: &str) -> Result<U256, AppError> {
    let bytes = hex::decode(word)
        .map_err(|e| AppError::Api(format!("Error hex decoding 256-bit word '{}'; err={}", word, e)))?;

    if bytes.len() != 32 {
        return Err(AppError::Api(format!("256-bit word holds {} byte(s); expected 32", bytes.len())));
    }

    Ok(U256::from_big_endian(&bytes))
}
