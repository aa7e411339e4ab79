//! ERC-20 `approve(address,uint256)` calldata decoder.
//!
//! Works directly on the hex text of the call input. Arguments are read as
//! two ABI words after the 4-byte selector: the spender occupies the low 20
//! bytes of word one, and the amount is everything after word one.
//!
//! Decoding never panics. Inputs that do not carry the selector, or that are
//! too short to hold both words, decode to `None`.

use alloy::primitives::{Address, U256};

/// `approve(address,uint256)` selector: first 4 bytes of its keccak-256 hash.
pub const APPROVE_SELECTOR: &str = "0x095ea7b3";

/// Canonical signature the selector is derived from.
pub const APPROVE_SIGNATURE: &str = "approve(address,uint256)";

/// `type(uint256).max` as hex text.
pub const MAX_UINT256_HEX: &str =
    "0xffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";

/// Hex characters taken by `0x` plus the 4-byte selector.
const SELECTOR_HEX_LEN: usize = 10;
/// Hex characters in one 32-byte ABI word.
const WORD_HEX_LEN: usize = 64;
/// Left padding before a 20-byte address inside a word.
const ADDRESS_PAD_HEX_LEN: usize = 24;

/// Arguments of one `approve` call, as lowercase `0x`-prefixed hex.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedApproval {
    /// Address granted the allowance.
    pub spender: String,
    /// Allowance, leading zeros preserved.
    pub amount: String,
}

impl DecodedApproval {
    /// Spender as a typed address.
    pub fn spender_address(&self) -> Option<Address> {
        self.spender.parse().ok()
    }

    /// Amount as a 256-bit integer. `None` when the amount text is not
    /// valid hex or does not fit in 256 bits.
    pub fn amount_value(&self) -> Option<U256> {
        self.amount.parse().ok()
    }
}

/// True when `input` begins with the `approve` selector (case-insensitive).
pub fn has_approve_selector(input: &str) -> bool {
    input
        .get(..SELECTOR_HEX_LEN)
        .is_some_and(|selector| selector.eq_ignore_ascii_case(APPROVE_SELECTOR))
}

/// Decode `approve(address,uint256)` arguments from hex call input.
///
/// Requires the selector followed by at least two full words. The amount is
/// the entire remainder after the spender word, so trailing bytes beyond the
/// second word end up in `amount` instead of being rejected.
pub fn decode_approval(input: &str) -> Option<DecodedApproval> {
    if !has_approve_selector(input) {
        return None;
    }

    let params = input.get(SELECTOR_HEX_LEN..)?;
    if params.len() < 2 * WORD_HEX_LEN {
        return None;
    }

    let spender = params.get(ADDRESS_PAD_HEX_LEN..WORD_HEX_LEN)?;
    let amount = params.get(WORD_HEX_LEN..)?;

    Some(DecodedApproval {
        spender: format!("0x{}", spender.to_ascii_lowercase()),
        amount: format!("0x{}", amount.to_ascii_lowercase()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::hex;
    use alloy::sol;
    use alloy::sol_types::SolCall;

    sol! {
        interface IERC20 {
            function approve(address spender, uint256 amount) external returns (bool);
        }
    }

    const SPENDER_WORD: &str = "0000000000000000000000001234567890123456789012345678901234567890";

    #[test]
    fn selector_constant_matches_signature_hash() {
        let computed = format!("0x{}", hex::encode(IERC20::approveCall::SELECTOR));
        assert_eq!(computed, APPROVE_SELECTOR);
        assert_eq!(IERC20::approveCall::SIGNATURE, APPROVE_SIGNATURE);
    }

    #[test]
    fn decodes_spender_and_amount() {
        let input = format!("{APPROVE_SELECTOR}{SPENDER_WORD}{:064x}", 10);
        let decoded = decode_approval(&input).expect("well-formed approve");

        assert_eq!(decoded.spender, "0x1234567890123456789012345678901234567890");
        assert_eq!(decoded.amount, format!("0x{:064x}", 10));
        assert_eq!(decoded.amount_value(), Some(U256::from(10)));
        assert!(decoded.spender_address().is_some());
    }

    #[test]
    fn matches_abi_encoder_output() {
        let spender: Address = "0xAbCdEf0123456789aBcDeF0123456789AbCdEf01".parse().unwrap();
        let call = IERC20::approveCall {
            spender,
            amount: U256::MAX,
        };
        let input = format!("0x{}", hex::encode(call.abi_encode()));

        let decoded = decode_approval(&input).unwrap();
        assert_eq!(decoded.spender, "0xabcdef0123456789abcdef0123456789abcdef01");
        assert_eq!(decoded.amount, MAX_UINT256_HEX);
        assert_eq!(decoded.spender_address(), Some(spender));
    }

    #[test]
    fn output_is_lowercased() {
        let input = format!(
            "0x095EA7B3{}{}",
            SPENDER_WORD.replace("1234", "ABCD"),
            "F".repeat(64)
        );
        let decoded = decode_approval(&input).unwrap();
        assert_eq!(decoded.spender, "0xabcd567890abcd567890abcd567890abcd567890");
        assert_eq!(decoded.amount, MAX_UINT256_HEX);
    }

    #[test]
    fn amount_takes_entire_remainder() {
        let input = format!("{APPROVE_SELECTOR}{SPENDER_WORD}{}dead", "f".repeat(64));
        let decoded = decode_approval(&input).unwrap();
        assert_eq!(decoded.amount.len(), 2 + 64 + 4);
        assert!(decoded.amount.ends_with("dead"));
        // 34 bytes do not fit a uint256
        assert!(decoded.amount_value().is_none());
    }

    #[test]
    fn short_or_foreign_input_is_none() {
        assert!(decode_approval("0x").is_none());
        assert!(decode_approval("").is_none());
        assert!(decode_approval(APPROVE_SELECTOR).is_none());
        assert!(decode_approval(&format!("{APPROVE_SELECTOR}{SPENDER_WORD}")).is_none());
        let one_short = format!("{APPROVE_SELECTOR}{SPENDER_WORD}{}", "f".repeat(63));
        assert!(decode_approval(&one_short).is_none());

        let transfer = format!("0xa9059cbb{SPENDER_WORD}{:064x}", 1);
        assert!(decode_approval(&transfer).is_none());
    }

    #[test]
    fn non_ascii_input_does_not_panic() {
        let input = format!("{APPROVE_SELECTOR}{}é{}", "0".repeat(23), "1".repeat(120));
        assert!(decode_approval(&input).is_none());
        assert!(!has_approve_selector("0x095ea7bé"));
    }
}
