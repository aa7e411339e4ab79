//! Heuristic risk rules for ERC-20 approvals.
//!
//! [`ApprovalRiskEngine::evaluate`] looks at one call-tree node together with
//! the transaction's logs. Non-approve calls and undecodable input produce no
//! findings. For a decoded approval the rules run in a fixed order and do not
//! short-circuit each other:
//!
//! 1. Infinite approval (HIGH)
//! 2. EOA spender (HIGH)
//! 3. Batch approval (MEDIUM)
//! 4. Automated approval (MEDIUM)
//!
//! Evaluation is pure: no I/O and no state carried between calls, so nodes
//! may be evaluated in any order or in parallel.

use std::fmt;
use std::sync::Arc;

use approval_data::{Call, Log};

use crate::classifier::{AccountClassifier, SuffixHeuristic};
use crate::decoder::{decode_approval, has_approve_selector, DecodedApproval};
use crate::decoder::{APPROVE_SELECTOR, MAX_UINT256_HEX};
use crate::risk::{Evidence, RiskFinding, RiskKind};

/// Runs the approval rule battery against call-tree nodes.
#[derive(Clone)]
pub struct ApprovalRiskEngine {
    classifier: Arc<dyn AccountClassifier>,
}

impl ApprovalRiskEngine {
    /// Engine using the default [`SuffixHeuristic`] EOA classifier.
    pub fn new() -> Self {
        Self::with_classifier(SuffixHeuristic::default())
    }

    /// Engine with a caller-supplied EOA classifier.
    pub fn with_classifier(classifier: impl AccountClassifier + 'static) -> Self {
        Self {
            classifier: Arc::new(classifier),
        }
    }

    /// Evaluate one call node. `logs` are the transaction-wide logs.
    pub fn evaluate(&self, call: &Call, logs: &[Log]) -> Vec<RiskFinding> {
        if !has_approve_selector(&call.input) {
            return Vec::new();
        }

        let Some(approval) = decode_approval(&call.input) else {
            tracing::debug!(
                to = %call.to,
                input_len = call.input.len(),
                "approve selector present but arguments undecodable"
            );
            return Vec::new();
        };

        let mut kinds = Vec::new();

        if is_infinite_amount(&approval.amount) {
            kinds.push(RiskKind::InfiniteApproval);
        }

        if self.classifier.is_externally_owned(&approval.spender) {
            kinds.push(RiskKind::EoaApproval);
        }

        if has_multiple_approvals(logs) {
            kinds.push(RiskKind::BatchApproval);
        }

        if !is_direct_approval(call) {
            kinds.push(RiskKind::AutomatedApproval);
        }

        kinds
            .into_iter()
            .map(|kind| {
                tracing::debug!(
                    kind = %kind,
                    from = %call.from,
                    spender = %approval.spender,
                    "approval rule triggered"
                );
                RiskFinding::new(kind, evidence_for(call, &approval))
            })
            .collect()
    }
}

impl Default for ApprovalRiskEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ApprovalRiskEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApprovalRiskEngine").finish_non_exhaustive()
    }
}

fn evidence_for(call: &Call, approval: &DecodedApproval) -> Evidence {
    Evidence {
        from: call.from.to_ascii_lowercase(),
        to: approval.spender.clone(),
        value: Some(approval.amount.clone()),
        method: None,
        timestamp: None,
    }
}

/// Lowercase and drop the `0x` prefix plus leading zeros, keeping `0x`.
/// Zero normalises to the bare `"0x"`.
fn strip_leading_zeros(hex: &str) -> String {
    let lower = hex.to_ascii_lowercase();
    let digits = lower.strip_prefix("0x").unwrap_or(&lower);
    format!("0x{}", digits.trim_start_matches('0'))
}

/// True when `amount` is treated as an unlimited allowance.
///
/// After normalisation, zero is never infinite; a value made only of `f`
/// digits is infinite; otherwise it must equal `type(uint256).max`.
pub fn is_infinite_amount(amount: &str) -> bool {
    let normalized = strip_leading_zeros(amount);
    let digits = &normalized[2..];
    if digits.is_empty() {
        return false;
    }
    if digits.bytes().all(|b| b == b'f') {
        return true;
    }
    normalized == strip_leading_zeros(MAX_UINT256_HEX)
}

/// Number of logs whose first topic is the approve selector.
pub fn count_approval_logs(logs: &[Log]) -> usize {
    logs.iter()
        .filter(|log| {
            log.topic0()
                .is_some_and(|topic| topic.eq_ignore_ascii_case(APPROVE_SELECTOR))
        })
        .count()
}

fn has_multiple_approvals(logs: &[Log]) -> bool {
    count_approval_logs(logs) > 1
}

/// True when the approval was not routed through an intermediary.
///
/// A call is direct when its first nested call targets the call's own
/// recipient. A leaf call has no nested target and is always direct.
pub fn is_direct_approval(call: &Call) -> bool {
    match call.calls.first() {
        Some(first) => first.to.eq_ignore_ascii_case(&call.to),
        None => true,
    }
}
