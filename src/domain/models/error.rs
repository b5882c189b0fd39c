#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;

/// Failure vocabulary shared by the gateway and the chat controller. Each kind
/// carries a fixed status code and retry policy.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, EnumIter, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChatErrorKind {
    InvalidInput,
    NotConfigured,
    Timeout,
    RateLimited,
    ContentBlocked,
    NetworkError,
    UpstreamError,
}

impl ChatErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ChatErrorKind::InvalidInput => return 400,
            ChatErrorKind::ContentBlocked => return 400,
            ChatErrorKind::RateLimited => return 429,
            ChatErrorKind::NotConfigured => return 503,
            ChatErrorKind::NetworkError => return 503,
            ChatErrorKind::Timeout => return 504,
            ChatErrorKind::UpstreamError => return 500,
        }
    }

    /// Best guess for responses that don't carry a `kind`. A bare 503 is
    /// treated as a network failure since that's the retryable reading.
    pub fn from_status(status: u16) -> ChatErrorKind {
        match status {
            429 => return ChatErrorKind::RateLimited,
            503 => return ChatErrorKind::NetworkError,
            504 => return ChatErrorKind::Timeout,
            500..=599 => return ChatErrorKind::UpstreamError,
            _ => return ChatErrorKind::InvalidInput,
        }
    }

    pub fn is_auto_retryable(&self) -> bool {
        return matches!(
            self,
            ChatErrorKind::Timeout | ChatErrorKind::NetworkError | ChatErrorKind::UpstreamError
        );
    }

    /// Whether the failure bubble offers a manual retry. Rate limits aren't
    /// retried automatically but the user may try again once they've waited.
    pub fn is_manually_retryable(&self) -> bool {
        return self.is_auto_retryable() || *self == ChatErrorKind::RateLimited;
    }

    /// Maps an arbitrary provider failure onto the taxonomy. Typed errors win,
    /// then transport errors, then the provider's wording.
    pub fn classify(err: &anyhow::Error) -> ChatErrorKind {
        if let Some(chat_err) = err.downcast_ref::<ChatError>() {
            return chat_err.kind;
        }

        if let Some(req_err) = err.downcast_ref::<reqwest::Error>() {
            if req_err.is_timeout() {
                return ChatErrorKind::Timeout;
            }
            if req_err.is_connect() || req_err.is_request() {
                return ChatErrorKind::NetworkError;
            }
        }

        let msg = err.to_string().to_lowercase();
        if msg.contains("api key") || msg.contains("api_key") {
            return ChatErrorKind::NotConfigured;
        }
        if msg.contains("quota") || msg.contains("rate limit") {
            return ChatErrorKind::RateLimited;
        }
        if msg.contains("blocked") || msg.contains("safety") {
            return ChatErrorKind::ContentBlocked;
        }
        if msg.contains("fetch") || msg.contains("network") {
            return ChatErrorKind::NetworkError;
        }

        return ChatErrorKind::UpstreamError;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: &str) -> ChatError {
        return ChatError {
            kind,
            message: message.to_string(),
        };
    }
}
