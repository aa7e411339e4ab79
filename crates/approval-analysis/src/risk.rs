//! Risk findings produced by the approval rules.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity attached to a finding. Fixed per [`RiskKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        };
        f.write_str(label)
    }
}

/// Category of a risky approval pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskKind {
    /// Allowance equal to `type(uint256).max`.
    InfiniteApproval,
    /// Spender contract has no verified source. Reserved: no rule emits it.
    UnverifiedContract,
    /// Spender classified as an externally-owned account.
    EoaApproval,
    /// Approval ordered to be front-run. Reserved: no rule emits it.
    FrontrunningPattern,
    /// More than one approval event in the transaction.
    BatchApproval,
    /// Approval issued through an intermediary contract.
    AutomatedApproval,
}

impl RiskKind {
    /// Every kind, in declaration order.
    pub const ALL: [RiskKind; 6] = [
        RiskKind::InfiniteApproval,
        RiskKind::UnverifiedContract,
        RiskKind::EoaApproval,
        RiskKind::FrontrunningPattern,
        RiskKind::BatchApproval,
        RiskKind::AutomatedApproval,
    ];

    pub fn severity(self) -> Severity {
        match self {
            RiskKind::InfiniteApproval => Severity::High,
            RiskKind::UnverifiedContract => Severity::Medium,
            RiskKind::EoaApproval => Severity::High,
            RiskKind::FrontrunningPattern => Severity::High,
            RiskKind::BatchApproval => Severity::Medium,
            RiskKind::AutomatedApproval => Severity::Medium,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            RiskKind::InfiniteApproval => {
                "Infinite approval detected - this allows unlimited token transfers"
            }
            RiskKind::UnverifiedContract => "Approval granted to an unverified contract",
            RiskKind::EoaApproval => "Approval granted to an EOA instead of a contract",
            RiskKind::FrontrunningPattern => "Approval pattern consistent with front-running",
            RiskKind::BatchApproval => "Multiple token approvals detected in the same transaction",
            RiskKind::AutomatedApproval => "Approval detected without direct user interaction",
        }
    }

    /// Whether the current rule set can emit this kind.
    pub fn is_reserved(self) -> bool {
        matches!(
            self,
            RiskKind::UnverifiedContract | RiskKind::FrontrunningPattern
        )
    }

    /// Wire name, e.g. `INFINITE_APPROVAL`.
    pub fn as_str(self) -> &'static str {
        match self {
            RiskKind::InfiniteApproval => "INFINITE_APPROVAL",
            RiskKind::UnverifiedContract => "UNVERIFIED_CONTRACT",
            RiskKind::EoaApproval => "EOA_APPROVAL",
            RiskKind::FrontrunningPattern => "FRONTRUNNING_PATTERN",
            RiskKind::BatchApproval => "BATCH_APPROVAL",
            RiskKind::AutomatedApproval => "AUTOMATED_APPROVAL",
        }
    }
}

impl fmt::Display for RiskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the call that triggered a finding.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// Approving account (`call.from`).
    pub from: String,
    /// Spender the allowance was granted to.
    pub to: String,
    /// Approved amount as hex text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

/// One triggered rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFinding {
    #[serde(rename = "type")]
    pub kind: RiskKind,
    pub message: String,
    pub severity: Severity,
    pub evidence: Evidence,
}

impl RiskFinding {
    /// Build a finding with the fixed message and severity of `kind`.
    pub fn new(kind: RiskKind, evidence: Evidence) -> Self {
        Self {
            kind,
            message: kind.message().to_string(),
            severity: kind.severity(),
            evidence,
        }
    }
}
