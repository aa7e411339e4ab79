//! Per-transaction verdicts.
//!
//! [`DetectionService`] walks a request's call tree, runs the engine on each
//! selected node with the transaction-wide logs, and folds every finding
//! into one [`DetectionResponse`].

use approval_data::DetectionRequest;
use serde::{Deserialize, Serialize};

use crate::engine::ApprovalRiskEngine;
use crate::risk::RiskFinding;

/// Which call-tree nodes are evaluated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Traversal {
    /// Direct children of the root frame only.
    #[default]
    Children,
    /// The root frame and every descendant, pre-order.
    Recursive,
}

/// Verdict for one detection request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub chain_id: u64,
    pub hash: String,
    /// True iff at least one finding was produced.
    pub detected: bool,
    /// Summary of all finding messages when `detected`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Analysis failures degrade to fewer findings, so this is always false.
    pub error: bool,
    pub risks: Vec<RiskFinding>,
}

/// Builds verdicts for whole transactions.
#[derive(Clone, Debug, Default)]
pub struct DetectionService {
    engine: ApprovalRiskEngine,
    traversal: Traversal,
}

impl DetectionService {
    pub fn new(engine: ApprovalRiskEngine, traversal: Traversal) -> Self {
        Self { engine, traversal }
    }

    pub fn traversal(&self) -> Traversal {
        self.traversal
    }

    /// Analyze one request.
    #[tracing::instrument(skip_all, fields(hash = %request.hash, chain_id = request.chain_id))]
    pub fn detect(&self, request: &DetectionRequest) -> DetectionResponse {
        let trace = &request.trace;
        let mut risks = Vec::new();
        let mut evaluated = 0usize;

        match self.traversal {
            Traversal::Children => {
                for call in &trace.calls {
                    evaluated += 1;
                    risks.extend(self.engine.evaluate(call, &trace.logs));
                }
            }
            Traversal::Recursive => {
                evaluated += 1;
                risks.extend(self.engine.evaluate(&trace.root_frame(), &trace.logs));
                for call in trace.calls.iter().flat_map(|child| child.walk()) {
                    evaluated += 1;
                    risks.extend(self.engine.evaluate(call, &trace.logs));
                }
            }
        }

        tracing::debug!(evaluated, risks = risks.len(), "call tree analyzed");

        build_response(request, risks)
    }
}

/// Join finding messages into the verdict summary.
pub fn summarize(risks: &[RiskFinding]) -> Option<String> {
    if risks.is_empty() {
        return None;
    }
    let messages: Vec<&str> = risks.iter().map(|r| r.message.as_str()).collect();
    Some(format!(
        "Detected {} approval risk(s): {}",
        risks.len(),
        messages.join(", ")
    ))
}

fn build_response(request: &DetectionRequest, risks: Vec<RiskFinding>) -> DetectionResponse {
    DetectionResponse {
        request_id: request.request_id.clone(),
        chain_id: request.chain_id,
        hash: request.hash.clone(),
        detected: !risks.is_empty(),
        message: summarize(&risks),
        error: false,
        risks,
    }
}
