//! The reconciled, user-facing judgment for a single poll.

use serde::{Deserialize, Serialize};

pub const PENDING_LABEL: &str = "Pending";

/// Computed fresh on every poll from the sandbox snapshot; immutable once
/// built. A pending verdict carries only its label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    /// Status label as reported by the sandbox, or "Pending".
    pub status: String,
    pub error: bool,
    pub time: String,
    pub memory: f64,
    pub stdout: String,
    pub compile_output: String,
    /// Ordered per-test-case results, true = output matched.
    pub test_case_result: Vec<bool>,
}

impl Verdict {
    pub fn pending() -> Verdict {
        Verdict {
            status: PENDING_LABEL.to_string(),
            error: false,
            time: String::new(),
            memory: 0.0,
            stdout: String::new(),
            compile_output: String::new(),
            test_case_result: Vec::new(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == PENDING_LABEL
    }
}
