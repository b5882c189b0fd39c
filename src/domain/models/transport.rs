use anyhow::Result;
use async_trait::async_trait;

use super::ChatError;
use super::ChatRequest;

/// Client side of `/api/chat`. Implementations turn every failure into a
/// classified `ChatError`, they never retry on their own.
#[async_trait]
pub trait ChatTransport {
    async fn send(&self, request: &ChatRequest) -> Result<String, ChatError>;
}

/// Reads assistant replies aloud. Runs detached from the transcript, so a
/// failure is only ever logged.
#[async_trait]
pub trait Narrator {
    async fn narrate(&self, text: &str) -> Result<()>;
}
