#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use tokio::time;
use tokio::time::Instant;

use super::history_of;
use super::whole_seconds;
use super::RequestThrottle;
use super::Transcript;
use crate::domain::models::ChatError;
use crate::domain::models::ChatErrorKind;
use crate::domain::models::ChatRequest;
use crate::domain::models::ChatTransport;
use crate::domain::models::HistoryEntry;
use crate::domain::models::Message;
use crate::domain::models::MessageStatus;
use crate::domain::models::MessageType;
use crate::domain::models::Narrator;
use crate::domain::models::Role;
use crate::domain::models::TurnOutcome;
use crate::domain::models::TurnState;

pub const CLIENT_TIMEOUT: Duration = Duration::from_millis(30000);
pub const PENDING_DELAY: Duration = Duration::from_millis(500);

pub const GREETING: &str = "Hi! I'm MQ Assistant, powered by Groq Llama 3.3.

I can help with:

- Equipment Recommendations: cameras, lenses, lighting
- Product Comparisons: compare brands and models
- Quotes & Pricing: rental and purchase options
- Project Setup: complete system solutions

What do you need?";

pub const EMPTY_REPLY: &str = "I apologize, but I received an empty response. Please try again.";

const TIMEOUT_REPLY: &str =
    "Request timed out. The AI is taking longer than usual. Please try again.";

const RATE_LIMIT_REPLY: &str = "Too many requests detected. Our AI service has usage limits.

- Please wait 30-60 seconds before trying again
- Consider spacing out your questions
- If this persists, the daily quota may be reached

Thank you for your patience!";

const GENERIC_REPLY: &str = "I encountered an error connecting to the AI service. Use /retry to try again, or ask your question differently.";

/// Linear backoff, `base_delay × attempt`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> RetryPolicy {
        return RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1000),
        };
    }
}

impl RetryPolicy {
    pub fn delay(&self, attempt: u32) -> Duration {
        return self.base_delay * attempt;
    }
}

pub fn throttle_notice(wait_secs: u64) -> String {
    let plural = if wait_secs > 1 { "s" } else { "" };
    return format!(
        "Please wait {wait_secs} second{plural} before sending another message. This helps prevent rate limiting."
    );
}

/// What the user reads for a failure that ended the turn.
pub fn failure_reply(err: &ChatError) -> String {
    match err.kind {
        ChatErrorKind::Timeout => return TIMEOUT_REPLY.to_string(),
        ChatErrorKind::RateLimited => return RATE_LIMIT_REPLY.to_string(),
        ChatErrorKind::NetworkError | ChatErrorKind::UpstreamError => {
            return GENERIC_REPLY.to_string();
        }
        ChatErrorKind::InvalidInput
        | ChatErrorKind::NotConfigured
        | ChatErrorKind::ContentBlocked => {
            if err.message.is_empty() {
                return GENERIC_REPLY.to_string();
            }
            return err.message.to_string();
        }
    }
}

/// Client half of the chat pipeline. Owns the transcript, throttles
/// submissions and retries transient gateway failures.
pub struct ChatController {
    transport: Arc<dyn ChatTransport + Send + Sync>,
    narrator: Option<Arc<dyn Narrator + Send + Sync>>,
    voice_enabled: bool,
    transcript: Transcript,
    throttle: RequestThrottle,
    retry_policy: RetryPolicy,
    client_timeout: Duration,
    pending_delay: Duration,
    state: TurnState,
}

impl ChatController {
    pub fn new(transport: Arc<dyn ChatTransport + Send + Sync>) -> ChatController {
        return ChatController {
            transport,
            narrator: None,
            voice_enabled: false,
            transcript: Transcript::default(),
            throttle: RequestThrottle::default(),
            retry_policy: RetryPolicy::default(),
            client_timeout: CLIENT_TIMEOUT,
            pending_delay: PENDING_DELAY,
            state: TurnState::Idle,
        };
    }

    pub fn with_narrator(mut self, narrator: Arc<dyn Narrator + Send + Sync>) -> ChatController {
        self.narrator = Some(narrator);
        return self;
    }

    pub fn with_client_timeout(mut self, client_timeout: Duration) -> ChatController {
        self.client_timeout = client_timeout;
        return self;
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> ChatController {
        self.retry_policy = retry_policy;
        return self;
    }

    pub fn set_voice(&mut self, enabled: bool) {
        self.voice_enabled = enabled;
    }

    pub fn voice_enabled(&self) -> bool {
        return self.voice_enabled;
    }

    pub fn state(&self) -> TurnState {
        return self.state;
    }

    pub fn transcript(&self) -> &Transcript {
        return &self.transcript;
    }

    /// Greets the user when the transcript is still empty.
    pub fn open(&mut self) {
        if self.transcript.is_empty() {
            self.transcript.push(Message::new(Role::Assistant, GREETING));
        }
    }

    pub async fn submit(&mut self, text: &str) -> TurnOutcome {
        if text.trim().is_empty() {
            return TurnOutcome::Ignored;
        }

        if let Err(wait) = self.throttle.admit(Instant::now()) {
            let wait_secs = whole_seconds(wait);
            tracing::debug!(wait_secs, "Submission throttled");
            self.transcript.push(Message::notice(&throttle_notice(wait_secs)));
            return TurnOutcome::Throttled { wait_secs };
        }

        let history = self.transcript.history();
        let message = Message::pending(text);
        let message_id = message.id.to_string();
        self.transcript.push(message);

        return self.deliver(&message_id, text, history).await;
    }

    /// Most recent failure that offers a manual retry.
    pub fn last_retryable(&self) -> Option<Message> {
        return self.transcript.messages().into_iter().rev().find(|msg| {
            return msg.message_type() == MessageType::Error && msg.retryable;
        });
    }

    /// Drops the failure bubble and sends the user message right before it
    /// again, with the history that preceded that message. Not throttled.
    pub async fn retry(&mut self, error_id: &str) -> Result<TurnOutcome> {
        let messages = self.transcript.messages();
        let idx = match messages.iter().position(|msg| return msg.id == error_id) {
            Some(idx) => idx,
            None => bail!("No message with id {error_id}"),
        };

        let failure = &messages[idx];
        if failure.message_type() != MessageType::Error || !failure.retryable {
            bail!("Message {error_id} can't be retried");
        }

        let user_message = match idx.checked_sub(1).map(|prev| return &messages[prev]) {
            Some(msg) if msg.role == Role::User && msg.is_history() => msg.clone(),
            _ => bail!("No user message precedes {error_id}"),
        };
        let history = history_of(&messages[..idx - 1]);

        self.transcript.remove(error_id);
        self.transcript
            .set_status(&user_message.id, MessageStatus::Pending);

        tracing::info!(message_id = %user_message.id, "Retrying message");
        return Ok(self
            .deliver(&user_message.id, &user_message.text, history)
            .await);
    }

    async fn deliver(
        &mut self,
        message_id: &str,
        text: &str,
        history: Vec<HistoryEntry>,
    ) -> TurnOutcome {
        self.schedule_sent(message_id);

        let request = ChatRequest {
            message: text.to_string(),
            history,
        };

        let mut attempt = 0;
        let result = loop {
            self.state = TurnState::Sending;
            match self.send_once(&request).await {
                Ok(reply) => break Ok(reply),
                Err(err) => {
                    if !err.kind.is_auto_retryable() || attempt >= self.retry_policy.max_retries {
                        break Err(err);
                    }

                    attempt += 1;
                    let delay = self.retry_policy.delay(attempt);
                    tracing::warn!(
                        kind = %err.kind,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Chat request failed, retrying"
                    );
                    self.state = TurnState::Retrying { attempt };
                    time::sleep(delay).await;
                }
            }
        };

        return self.complete_turn(message_id, result);
    }

    async fn send_once(&self, request: &ChatRequest) -> Result<String, ChatError> {
        match time::timeout(self.client_timeout, self.transport.send(request)).await {
            Ok(res) => return res,
            Err(_) => {
                return Err(ChatError::new(
                    ChatErrorKind::Timeout,
                    "Request aborted by the client",
                ));
            }
        }
    }

    fn schedule_sent(&self, message_id: &str) {
        let transcript = self.transcript.clone();
        let message_id = message_id.to_string();
        let delay = self.pending_delay;
        tokio::spawn(async move {
            time::sleep(delay).await;
            transcript.mark_sent(&message_id);
        });
    }

    fn complete_turn(
        &mut self,
        message_id: &str,
        result: Result<String, ChatError>,
    ) -> TurnOutcome {
        match result {
            Ok(reply) => {
                self.state = TurnState::Delivered;
                self.transcript.set_status(message_id, MessageStatus::Sent);

                let reply = if reply.trim().is_empty() {
                    EMPTY_REPLY.to_string()
                } else {
                    reply
                };
                self.transcript.push(Message::new(Role::Assistant, &reply));
                self.narrate(&reply);

                return TurnOutcome::Delivered;
            }
            Err(err) => {
                tracing::error!(kind = %err.kind, error = %err.message, "Chat turn failed");
                self.state = TurnState::FailedTerminal;
                self.transcript.set_status(message_id, MessageStatus::Failed);
                self.transcript.push(Message::failure(
                    &failure_reply(&err),
                    err.kind.is_manually_retryable(),
                ));

                return TurnOutcome::Failed(err.kind);
            }
        }
    }

    fn narrate(&self, reply: &str) {
        if !self.voice_enabled {
            return;
        }

        if let Some(narrator) = &self.narrator {
            let narrator = narrator.clone();
            let reply = reply.to_string();
            tokio::spawn(async move {
                if let Err(err) = narrator.narrate(&reply).await {
                    tracing::warn!(error = ?err, "Narration failed");
                }
            });
        }
    }
}
