#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::HistoryEntry;
use super::Role;

/// Only the most recent turns are replayed to the provider to bound request
/// size and cost.
pub const HISTORY_LIMIT: usize = 10;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

impl From<Role> for PromptRole {
    fn from(role: Role) -> PromptRole {
        match role {
            Role::User => return PromptRole::User,
            Role::Assistant => return PromptRole::Assistant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendPrompt {
    pub messages: Vec<PromptMessage>,
}

impl BackendPrompt {
    /// System instruction, then the trimmed history, then the new user message.
    pub fn new(system_prompt: &str, history: &[HistoryEntry], text: &str) -> BackendPrompt {
        let mut messages = vec![PromptMessage {
            role: PromptRole::System,
            content: system_prompt.to_string(),
        }];

        let skip = history.len().saturating_sub(HISTORY_LIMIT);
        for entry in history.iter().skip(skip) {
            messages.push(PromptMessage {
                role: entry.role.into(),
                content: entry.content.to_string(),
            });
        }

        messages.push(PromptMessage {
            role: PromptRole::User,
            content: text.to_string(),
        });

        return BackendPrompt { messages };
    }
}

#[async_trait]
pub trait CompletionBackend {
    /// Provider name reported by the health probe.
    fn name(&self) -> String;

    fn model(&self) -> String;

    /// False when no credential is available. The gateway answers with a
    /// service-unavailable error instead of calling out.
    fn is_configured(&self) -> bool;

    /// Requests a single, non-streamed completion. Failures should be raised
    /// as a `ChatError` when the provider's answer makes the kind obvious;
    /// anything else is classified by the gateway.
    async fn get_completion(&self, prompt: BackendPrompt) -> Result<String>;
}

#[async_trait]
pub trait SpeechBackend {
    fn name(&self) -> String;

    fn is_configured(&self) -> bool;

    /// Returns MP3 audio for the given text.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

