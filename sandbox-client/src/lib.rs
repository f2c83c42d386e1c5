//! Thin HTTP adapter to the external execution sandbox.
//!
//! The sandbox compiles and runs submitted code out of process; this crate
//! only submits jobs and fetches their status by token. Retry policy belongs
//! to the caller: every method performs exactly one round trip.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SandboxError {
    /// Network failure or non-success HTTP status: the sandbox could not be
    /// reached or refused the request. Retryable.
    #[error("sandbox unreachable")]
    Unavailable(#[source] reqwest::Error),
    /// The sandbox answered but the body did not match the expected shape.
    #[error("sandbox returned a malformed response")]
    Malformed(#[source] reqwest::Error),
}

/// The (code, label) pair the sandbox uses to describe a job's state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusField {
    pub id: i64,
    pub description: String,
}

/// Point-in-time snapshot of a sandbox job. The sandbox reports null for
/// fields that do not apply yet, so everything but `status` is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxStatus {
    pub status: StatusField,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub compile_output: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub memory: Option<f64>,
}

#[derive(Serialize)]
struct SubmitBody<'a> {
    source_code: &'a str,
    language_id: u32,
}

#[derive(Deserialize)]
struct SubmitReceipt {
    token: String,
}

/// Client for one sandbox endpoint, authenticated with provider headers.
#[derive(Clone)]
pub struct Client {
    base: String,
    api_key: String,
    api_host: String,
    transport: reqwest::Client,
}

impl Client {
    pub fn new(base: impl Into<String>, api_key: impl Into<String>, api_host: impl Into<String>) -> Client {
        Client {
            base: base.into(),
            api_key: api_key.into(),
            api_host: api_host.into(),
            transport: reqwest::Client::new(),
        }
    }

    /// Submits code for execution and returns the sandbox's opaque token.
    #[tracing::instrument(skip(self, source_code))]
    pub async fn submit(&self, source_code: &str, language_id: u32) -> Result<String, SandboxError> {
        let url = format!("{}/submissions", self.base);
        let body = SubmitBody {
            source_code,
            language_id,
        };
        let resp = self
            .transport
            .post(url)
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.api_host)
            .json(&body)
            .send()
            .await
            .map_err(SandboxError::Unavailable)?
            .error_for_status()
            .map_err(SandboxError::Unavailable)?;
        let receipt: SubmitReceipt = resp.json().await.map_err(SandboxError::Malformed)?;
        Ok(receipt.token)
    }

    /// Fetches the current status of a previously submitted job.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_status(&self, token: &str) -> Result<SandboxStatus, SandboxError> {
        let url = format!("{}/submissions/{}", self.base, token);
        let resp = self
            .transport
            .get(url)
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.api_host)
            .send()
            .await
            .map_err(SandboxError::Unavailable)?
            .error_for_status()
            .map_err(SandboxError::Unavailable)?;
        resp.json().await.map_err(SandboxError::Malformed)
    }
}
