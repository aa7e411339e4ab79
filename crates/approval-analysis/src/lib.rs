//! approval-analysis crate
//!
//! Flags risky ERC-20 `approve` patterns in a single transaction trace:
//! calldata decoding, the heuristic rule battery, and the per-request
//! verdict built from it.

pub mod classifier;
pub mod decoder;
pub mod engine;
pub mod risk;
pub mod service;

pub use classifier::{AccountClassifier, SuffixHeuristic};
pub use decoder::{decode_approval, DecodedApproval};
pub use engine::ApprovalRiskEngine;
pub use risk::{Evidence, RiskFinding, RiskKind, Severity};
pub use service::{DetectionResponse, DetectionService, Traversal};
