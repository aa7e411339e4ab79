//! Account-vs-contract classification of spender addresses.
//!
//! The engine has no chain access, so whether a spender is an
//! externally-owned account is answered by an injected classifier. The
//! default [`SuffixHeuristic`] is a deterministic placeholder; a host with
//! state access can supply a real bytecode-presence oracle instead.

/// Decides whether an address is an externally-owned account.
///
/// Implementations must be deterministic and must not perform I/O, so that
/// evaluation stays a pure function of the trace.
pub trait AccountClassifier: Send + Sync {
    /// `address` is lowercase `0x`-prefixed hex.
    fn is_externally_owned(&self, address: &str) -> bool;
}

impl<F> AccountClassifier for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_externally_owned(&self, address: &str) -> bool {
        self(address)
    }
}

/// Default suffix treated as an EOA marker.
pub const DEFAULT_EOA_SUFFIX: &str = "789";

/// Classifies an address as an EOA when its hex ends with a fixed suffix.
///
/// Not a real bytecode check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuffixHeuristic {
    suffix: String,
}

impl SuffixHeuristic {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into().to_ascii_lowercase(),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl Default for SuffixHeuristic {
    fn default() -> Self {
        Self::new(DEFAULT_EOA_SUFFIX)
    }
}

impl AccountClassifier for SuffixHeuristic {
    fn is_externally_owned(&self, address: &str) -> bool {
        address.to_ascii_lowercase().ends_with(&self.suffix)
    }
}
