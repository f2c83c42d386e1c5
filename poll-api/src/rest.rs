use crate::evaluation::ExecutionFlag;
use crate::verdict::Verdict;
use serde::{de::Error, Deserialize, Serialize};

/// Base64 encoding for binary data
pub struct ByteString(pub Vec<u8>);

impl Serialize for ByteString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let repr = base64::encode(&self.0);
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ByteString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let repr = String::deserialize(deserializer)?;
        base64::decode(&repr).map(ByteString).map_err(|err| {
            D::Error::custom(format_args!(
                "expected valid base64-encoded string: {:#}",
                err
            ))
        })
    }
}

/// Poll request: the client-side correlation key for one evaluation.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollRequest {
    pub unique_id: String,
}

/// Response envelope shared by both `run` and `submit` flows. Every failure
/// mode of the endpoint maps into this shape; nothing escapes as a bare
/// HTTP error.
#[derive(Debug, Serialize, Deserialize)]
pub struct PollResponse {
    pub success: bool,
    pub message: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Verdict>,
}

impl PollResponse {
    pub fn verdict(message: impl Into<String>, verdict: Verdict) -> PollResponse {
        PollResponse {
            success: true,
            message: message.into(),
            status: 200,
            data: Some(verdict),
        }
    }

    pub fn failure(status: u16, message: impl Into<String>) -> PollResponse {
        PollResponse {
            success: false,
            message: message.into(),
            status,
            data: None,
        }
    }
}

/// Request to create an evaluation: the submission-creation step that
/// precedes polling.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvaluationRequest {
    pub problem_id: String,
    pub user_id: String,
    /// Run source, as a base64-encoded string
    pub code: ByteString,
    pub language: String,
    /// Language id understood by the sandbox.
    pub language_id: u32,
    pub problem_title: String,
    pub flag: ExecutionFlag,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvaluationResponse {
    pub success: bool,
    pub message: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,
}
