//! State of an in-flight evaluation, as stored in the pending-evaluation
//! cache between the creation step and the polls that follow it.

use serde::{Deserialize, Serialize};

/// Distinguishes a user trying out sample cases from a graded submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionFlag {
    Run,
    Submit,
}

/// Everything the polling endpoint needs to interpret a sandbox result.
/// Written once at evaluation creation and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingEvaluation {
    pub problem_id: String,
    pub user_id: String,
    pub code: String,
    pub language: String,
    pub problem_title: String,
    pub flag: ExecutionFlag,
    /// Opaque token identifying the job inside the sandbox.
    pub token: String,
}
