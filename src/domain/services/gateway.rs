#[cfg(test)]
#[path = "gateway_test.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time;

use crate::domain::models::BackendPrompt;
use crate::domain::models::ChatError;
use crate::domain::models::ChatErrorKind;
use crate::domain::models::ChatRequest;
use crate::domain::models::ChatSuccess;
use crate::domain::models::CompletionBackend;
use crate::domain::models::HealthResponse;
use crate::domain::models::HistoryEntry;
use crate::domain::models::Role;
use crate::domain::models::HISTORY_LIMIT;

pub const MAX_MESSAGE_CHARS: usize = 5000;
pub const COMPLETION_TIMEOUT: Duration = Duration::from_millis(25000);
pub const SYSTEM_PROMPT: &str = include_str!("system_prompt.md");

fn invalid_input(message: &str) -> ChatError {
    return ChatError::new(ChatErrorKind::InvalidInput, message);
}

/// The user facing wording for each failure kind reported by the provider.
fn provider_failure(kind: ChatErrorKind) -> ChatError {
    let message = match kind {
        ChatErrorKind::Timeout => "AI request timed out. Please try again.",
        ChatErrorKind::NotConfigured => "AI service configuration error. Please contact support.",
        ChatErrorKind::RateLimited => "Too many requests. Please wait a moment and try again.",
        ChatErrorKind::ContentBlocked => {
            "Your message was blocked by content filters. Please rephrase your question."
        }
        ChatErrorKind::NetworkError => "Network error. Please check your connection and try again.",
        ChatErrorKind::InvalidInput | ChatErrorKind::UpstreamError => {
            return ChatError::new(
                ChatErrorKind::UpstreamError,
                "An unexpected error occurred. Please try again later.",
            );
        }
    };

    return ChatError::new(kind, message);
}

fn history_entry(value: &Value) -> Option<HistoryEntry> {
    let content = value.get("content")?.as_str()?;
    let role = value
        .get("role")
        .and_then(|role| return role.as_str())
        .unwrap_or_default();

    return Some(HistoryEntry {
        role: Role::parse(role),
        content: content.to_string(),
    });
}

/// Bodies are parsed by hand so that a malformed payload and an invalid
/// message are reported differently.
pub fn parse_request(body: &[u8]) -> Result<ChatRequest, ChatError> {
    let payload: Value = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::debug!(error = ?err, "Unparseable chat request body");
            return Err(invalid_input("Invalid request format"));
        }
    };

    let message = match payload.get("message") {
        Some(Value::String(message)) if !message.is_empty() => message.to_string(),
        _ => return Err(invalid_input("Message is required and must be a string")),
    };

    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(invalid_input(&format!(
            "Message is too long. Please keep it under {MAX_MESSAGE_CHARS} characters."
        )));
    }

    let mut history: Vec<HistoryEntry> = vec![];
    if let Some(Value::Array(entries)) = payload.get("history") {
        // Window the raw entries first, malformed ones still use up a slot.
        let window = &entries[entries.len().saturating_sub(HISTORY_LIMIT)..];
        history = window.iter().filter_map(history_entry).collect();
    }

    return Ok(ChatRequest { message, history });
}

/// Stateless relay between the site and the completion provider. Safe to
/// share between any number of concurrent requests.
pub struct ChatGateway {
    backend: Arc<dyn CompletionBackend + Send + Sync>,
    timeout: Duration,
}

impl ChatGateway {
    pub fn new(
        backend: Arc<dyn CompletionBackend + Send + Sync>,
        timeout: Duration,
    ) -> ChatGateway {
        return ChatGateway { backend, timeout };
    }

    pub fn health(&self) -> HealthResponse {
        return HealthResponse {
            status: "ok".to_string(),
            configured: self.backend.is_configured(),
            model: self.backend.model(),
            provider: self.backend.name(),
        };
    }

    pub async fn handle(&self, body: &[u8]) -> Result<ChatSuccess, ChatError> {
        let request = parse_request(body)?;

        if !self.backend.is_configured() {
            tracing::error!(provider = %self.backend.name(), "Provider token is not configured");
            return Err(ChatError::new(
                ChatErrorKind::NotConfigured,
                "AI service is not properly configured. Please contact support.",
            ));
        }

        let prompt = BackendPrompt::new(SYSTEM_PROMPT, &request.history, &request.message);
        tracing::debug!(
            messages = prompt.messages.len(),
            history = request.history.len(),
            "Requesting completion"
        );

        // Dropping the provider future on timeout abandons it, a late answer
        // is never seen.
        let pending = self.backend.get_completion(prompt);
        let completion = match time::timeout(self.timeout, pending).await {
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Completion request timed out"
                );
                return Err(provider_failure(ChatErrorKind::Timeout));
            }
            Ok(Err(err)) => {
                let kind = ChatErrorKind::classify(&err);
                tracing::error!(error = ?err, kind = %kind, "Completion request failed");
                return Err(provider_failure(kind));
            }
            Ok(Ok(completion)) => completion,
        };

        if completion.trim().is_empty() {
            tracing::error!("Empty response from provider");
            return Err(provider_failure(ChatErrorKind::UpstreamError));
        }

        return Ok(ChatSuccess::new(&completion));
    }
}
