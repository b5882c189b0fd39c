#[cfg(test)]
#[path = "groq_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendPrompt;
use crate::domain::models::ChatError;
use crate::domain::models::ChatErrorKind;
use crate::domain::models::CompletionBackend;
use crate::domain::models::PromptMessage;

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 1024;
const TOP_P: f64 = 0.95;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<PromptMessage>,
    temperature: f64,
    max_tokens: u32,
    top_p: f64,
    stream: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionChoiceResponse {
    message: CompletionMessageResponse,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoiceResponse>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorDetailResponse {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorResponse {
    error: ErrorDetailResponse,
}

/// Turns a failed Groq response into a typed error. Statuses with an obvious
/// meaning are mapped directly, the rest are left for the gateway.
fn status_error(status: u16, body: &str) -> anyhow::Error {
    let detail = serde_json::from_str::<ErrorResponse>(body)
        .map(|res| return res.error)
        .unwrap_or_default();
    let lowered = format!("{} {}", detail.message, detail.code.unwrap_or_default()).to_lowercase();

    let kind = match status {
        401 | 403 => ChatErrorKind::NotConfigured,
        429 => ChatErrorKind::RateLimited,
        400 if lowered.contains("safety")
            || lowered.contains("blocked")
            || lowered.contains("content_filter") =>
        {
            ChatErrorKind::ContentBlocked
        }
        _ => ChatErrorKind::UpstreamError,
    };

    return ChatError::new(
        kind,
        &format!("Groq completion request failed with status {status}"),
    )
    .into();
}

pub struct Groq {
    url: String,
    token: String,
    model: String,
}

impl Default for Groq {
    fn default() -> Groq {
        return Groq {
            url: Config::get(ConfigKey::GroqURL),
            token: Config::get(ConfigKey::GroqToken),
            model: Config::get(ConfigKey::Model),
        };
    }
}

#[async_trait]
impl CompletionBackend for Groq {
    fn name(&self) -> String {
        return "Groq".to_string();
    }

    fn model(&self) -> String {
        return self.model.to_string();
    }

    fn is_configured(&self) -> bool {
        return !self.token.is_empty();
    }

    #[allow(clippy::implicit_return)]
    async fn get_completion(&self, prompt: BackendPrompt) -> Result<String> {
        if self.url.is_empty() {
            bail!("Groq URL is not defined");
        }

        let req = CompletionRequest {
            model: self.model.to_string(),
            messages: prompt.messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            top_p: TOP_P,
            stream: false,
        };

        let res = reqwest::Client::new()
            .post(format!("{url}/v1/chat/completions", url = self.url))
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&req)
            .send()
            .await?;

        let status = res.status().as_u16();
        if !res.status().is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::error!(
                status = status,
                body = %body,
                "Failed to make completion request to Groq"
            );
            return Err(status_error(status, &body));
        }

        let ores = res.json::<CompletionResponse>().await?;
        tracing::debug!(body = ?ores, "Completion response");

        let text = ores
            .choices
            .into_iter()
            .next()
            .and_then(|choice| return choice.message.content)
            .unwrap_or_default();

        return Ok(text);
    }
}
