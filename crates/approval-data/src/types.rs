//! Type definitions for transaction trace data.
//!
//! Field names follow the JSON produced by the detection host (camelCase).
//! All hex values are kept as text exactly as received; consumers normalise
//! case where they compare.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

fn empty_hex() -> String {
    "0x".to_string()
}

fn zero_hex() -> String {
    "0x0".to_string()
}

/// One frame of the execution call tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    /// Caller address (hex text).
    #[serde(default)]
    pub from: String,
    /// Callee address (hex text). Empty for frames the tracer reports
    /// without a recipient, such as failed contract creations.
    #[serde(default)]
    pub to: String,
    /// Native value sent with the call (hex integer text).
    #[serde(default = "zero_hex")]
    pub value: String,
    /// Gas consumed by the frame (hex integer text).
    #[serde(default = "zero_hex")]
    pub gas_used: String,
    /// Call data (hex, may be `"0x"`).
    #[serde(default = "empty_hex")]
    pub input: String,
    /// Return data (hex, may be `"0x"`).
    #[serde(default = "empty_hex")]
    pub output: String,
    /// Nested calls in execution order. Empty for a leaf frame.
    #[serde(default)]
    pub calls: Vec<Call>,
}

impl Call {
    /// True when this frame made no nested calls.
    pub fn is_leaf(&self) -> bool {
        self.calls.is_empty()
    }

    /// Pre-order iterator over this frame and every descendant.
    pub fn walk(&self) -> CallWalk<'_> {
        CallWalk { stack: vec![self] }
    }
}

/// Depth-first, pre-order traversal of a call tree. See [`Call::walk`].
pub struct CallWalk<'a> {
    stack: Vec<&'a Call>,
}

impl<'a> Iterator for CallWalk<'a> {
    type Item = &'a Call;

    fn next(&mut self) -> Option<Self::Item> {
        let call = self.stack.pop()?;
        // Reverse so the first child is visited first.
        self.stack.extend(call.calls.iter().rev());
        Some(call)
    }
}

/// Event log emitted during the transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Indexed topics; `topics[0]` is conventionally the event signature hash.
    #[serde(default)]
    pub topics: Vec<String>,
    /// Emitting contract address (hex text).
    #[serde(default)]
    pub address: String,
    /// Non-indexed data (hex).
    #[serde(default = "empty_hex")]
    pub data: String,
}

impl Log {
    /// First topic, if the log has any.
    pub fn topic0(&self) -> Option<&str> {
        self.topics.first().map(String::as_str)
    }
}

/// Full transaction trace: the root frame plus transaction-wide data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    /// Transaction sender.
    #[serde(default)]
    pub from: String,
    /// Transaction recipient. Empty for contract creation.
    #[serde(default)]
    pub to: String,
    /// Native value (hex integer text).
    #[serde(default = "zero_hex")]
    pub value: String,
    /// Gas limit (hex integer text).
    #[serde(default = "zero_hex")]
    pub gas: String,
    /// Gas consumed (hex integer text).
    #[serde(default = "zero_hex")]
    pub gas_used: String,
    /// Root call data.
    #[serde(default = "empty_hex")]
    pub input: String,
    /// Root return data.
    #[serde(default = "empty_hex")]
    pub output: String,
    /// Account state before execution. Carried through, never interpreted.
    #[serde(default)]
    pub pre: BTreeMap<String, serde_json::Value>,
    /// Account state after execution. Carried through, never interpreted.
    #[serde(default)]
    pub post: BTreeMap<String, serde_json::Value>,
    /// Calls made by the root frame.
    #[serde(default)]
    pub calls: Vec<Call>,
    /// Every log emitted by the transaction.
    #[serde(default)]
    pub logs: Vec<Log>,
}

impl Trace {
    /// The root frame as a [`Call`] without its subtree.
    ///
    /// Only the first child is kept, stripped of its own calls, which is all
    /// a topology check on the root needs. Walk [`Trace::calls`] for the rest.
    pub fn root_frame(&self) -> Call {
        let first_child = self.calls.first().map(|child| Call {
            from: child.from.clone(),
            to: child.to.clone(),
            value: child.value.clone(),
            gas_used: child.gas_used.clone(),
            input: child.input.clone(),
            output: child.output.clone(),
            calls: Vec::new(),
        });

        Call {
            from: self.from.clone(),
            to: self.to.clone(),
            value: self.value.clone(),
            gas_used: self.gas_used.clone(),
            input: self.input.clone(),
            output: self.output.clone(),
            calls: first_child.into_iter().collect(),
        }
    }
}

/// One transaction submitted by the monitoring host for analysis.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionRequest {
    /// Host-assigned request identifier, echoed back in the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// EVM chain id.
    pub chain_id: u64,
    /// Transaction hash (hex text).
    pub hash: String,
    /// Name of the protected protocol, if the host supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_name: Option<String>,
    /// Address of the protected protocol, if the host supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_address: Option<String>,
    /// Execution trace of the transaction.
    pub trace: Trace,
    /// Free-form host data. Carried through, never interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<serde_json::Value>,
}
