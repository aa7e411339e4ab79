//! Shared test helpers and utilities.
//!
//! Factory functions for trace fixtures with sensible defaults, mirroring
//! the request shape the monitoring host sends.

#![allow(dead_code)]

use approval_analysis::decoder::APPROVE_SELECTOR;
use approval_data::{Call, DetectionRequest, Log, Trace};

/// Spender used by most fixtures. Does not end in `789`.
pub const SPENDER: &str = "1234567890123456789012345678901234567890";

/// Spender the default EOA heuristic flags.
pub const EOA_SPENDER: &str = "abcdef0000000000000000000000000000000789";

/// Build `approve(spender, amount)` calldata.
///
/// # Arguments
/// * `spender` - 40 hex characters, no `0x`
/// * `amount` - amount word as hex, left-padded to 64 characters
pub fn approve_input(spender: &str, amount: &str) -> String {
    format!("{APPROVE_SELECTOR}{spender:0>64}{amount:0>64}")
}

/// Approve calldata with the maximum uint256 amount.
pub fn infinite_input(spender: &str) -> String {
    approve_input(spender, &"f".repeat(64))
}

/// Approve calldata with an amount of ten.
pub fn bounded_input(spender: &str) -> String {
    approve_input(spender, "a")
}

/// Leaf call from `0x123` to `0x456` carrying `input`.
pub fn sample_call(input: &str) -> Call {
    Call {
        from: "0x123".to_string(),
        to: "0x456".to_string(),
        value: "0x0".to_string(),
        gas_used: "0x0".to_string(),
        input: input.to_string(),
        output: "0x".to_string(),
        calls: Vec::new(),
    }
}

/// Log whose first topic is the approve selector.
pub fn approval_log() -> Log {
    Log {
        topics: vec![
            APPROVE_SELECTOR.to_string(),
            "0x123".to_string(),
            "0x456".to_string(),
        ],
        address: "0x789".to_string(),
        data: "0x".to_string(),
    }
}

/// Request whose root frame (`0x123` -> `0x456`, empty input) made `calls`.
pub fn sample_request(calls: Vec<Call>, logs: Vec<Log>) -> DetectionRequest {
    DetectionRequest {
        request_id: None,
        chain_id: 1,
        hash: "0x123".to_string(),
        protocol_name: None,
        protocol_address: None,
        trace: Trace {
            from: "0x123".to_string(),
            to: "0x456".to_string(),
            calls,
            logs,
            ..Trace::default()
        },
        additional_data: None,
    }
}
