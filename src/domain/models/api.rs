#[cfg(test)]
#[path = "api_test.rs"]
mod tests;

use chrono::SecondsFormat;
use chrono::Utc;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::ChatError;
use super::ChatErrorKind;
use super::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSuccess {
    pub response: String,
    pub success: bool,
}

impl ChatSuccess {
    pub fn new(response: &str) -> ChatSuccess {
        return ChatSuccess {
            response: response.to_string(),
            success: true,
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatFailure {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ChatErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ChatFailure {
    /// Unclassified upstream failures are stamped so they can be matched
    /// against server logs.
    pub fn from_error(err: &ChatError) -> ChatFailure {
        let mut timestamp = None;
        if err.kind == ChatErrorKind::UpstreamError {
            timestamp = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        }

        return ChatFailure {
            error: err.message.to_string(),
            kind: Some(err.kind),
            timestamp,
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub configured: bool,
    pub model: String,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechSuccess {
    pub success: bool,
    pub audio: String,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechFailure {
    pub error: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}
