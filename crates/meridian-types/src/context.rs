//! Block clock supplied by the ledger on every call.

use serde::{Deserialize, Serialize};

/// Logical time of the evaluation cycle a call runs in.
///
/// `time` is Unix seconds; both fields are monotonically non-decreasing
/// across calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    pub time: u64,
    pub height: u64,
}

impl BlockContext {
    pub fn new(time: u64, height: u64) -> Self {
        Self { time, height }
    }

    /// The context of the next block, `secs` seconds later.
    pub fn next_block(&self, secs: u64) -> Self {
        Self {
            time: self.time.saturating_add(secs),
            height: self.height.saturating_add(1),
        }
    }
}
