use std::collections::HashMap;

use crate::types::ApprovalRecord;

/// Render the approval report as text, one block per token contract.
///
/// Groups records by token contract in first-seen order; spender lines
/// within a group keep extraction order. Allowances are printed as exact
/// decimal literals, so an unlimited approval shows up as the full 256-bit
/// maximum rather than an approximation.
pub fn render_report(records: &[ApprovalRecord]) -> String {
    let mut groups: Vec<Vec<&ApprovalRecord>> = Vec::new();
    let mut group_of: HashMap<&str, usize> = HashMap::new();

    for record in records {
        match group_of.get(record.token_contract.as_str()) {
            Some(&i) => groups[i].push(record),
            None => {
                group_of.insert(&record.token_contract, groups.len());
                groups.push(vec![record]);
            },
        }
    }

    let mut output = String::new();
    for group in &groups {
        output.push_str(&format!("[{}] {}\n", group[0].token_symbol, group[0].token_contract));
        for record in group {
            output.push_str(&format!("  * {} - {}\n", record.spender, record.allowance));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use web3::types::U256;

    use crate::extract::extract_approvals;
    use crate::explorer::RawTransaction;

    fn record(token: &str, symbol: &str, spender: &str, allowance: U256) -> ApprovalRecord {
        ApprovalRecord {
            token_contract: token.to_owned(),
            token_symbol: symbol.to_owned(),
            spender: spender.to_owned(),
            allowance,
            block_number: 0,
        }
    }

    #[test]
    fn groups_spenders_under_one_token_header() {
        let records = vec![
            record("0xaaaa", "CAKE", "0x1111", U256::from(5u64)),
            record("0xaaaa", "CAKE", "0x2222", U256::from(10u64)),
        ];

        let output = render_report(&records);
        assert_eq!(output, "[CAKE] 0xaaaa\n  * 0x1111 - 5\n  * 0x2222 - 10\n");
    }

    #[test]
    fn group_order_is_first_seen_token_order() {
        let records = vec![
            record("0xaaaa", "CAKE", "0x1111", U256::from(1u64)),
            record("0xbbbb", "BUSD", "0x1111", U256::from(2u64)),
            record("0xaaaa", "CAKE", "0x2222", U256::from(3u64)),
        ];

        let output = render_report(&records);
        let expected = "[CAKE] 0xaaaa\n  * 0x1111 - 1\n  * 0x2222 - 3\n\
                        [BUSD] 0xbbbb\n  * 0x1111 - 2\n";
        assert_eq!(output, expected);
    }

    #[test]
    fn unlimited_allowance_prints_exact_decimal_literal() {
        let records = vec![record("0xaaaa", "CAKE", "0x1111", U256::MAX)];

        let output = render_report(&records);
        assert!(output.contains("115792089237316195423570985008687907853269984665640564039457584007913129639935"));
    }

    // end-to-end through extractor and formatter with a stubbed raw
    // transaction history; no network involved
    #[test]
    fn stubbed_history_renders_one_header_two_spenders() {
        let owner = "0x1111111111111111111111111111111111111111";
        let token = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

        let txs = vec![
            RawTransaction {
                block_number: "100".to_owned(),
                from: owner.to_owned(),
                to: token.to_owned(),
                input: format!("0x095ea7b3{:0>64}{:064x}", "2222222222222222222222222222222222222222", 500u64),
                is_error: "0".to_owned(),
            },
            RawTransaction {
                block_number: "101".to_owned(),
                from: owner.to_owned(),
                to: token.to_owned(),
                input: format!("0x095ea7b3{:0>64}{:064x}", "3333333333333333333333333333333333333333", 7u64),
                is_error: "0".to_owned(),
            },
        ];

        let mut records = extract_approvals(&txs, owner).unwrap();
        for r in records.iter_mut() {
            r.token_symbol = "CAKE".to_owned();
        }

        let output = render_report(&records);
        let expected = format!(
            "[CAKE] {}\n  * 0x2222222222222222222222222222222222222222 - 500\n  * 0x3333333333333333333333333333333333333333 - 7\n",
            token);
        assert_eq!(output, expected);
    }
}
