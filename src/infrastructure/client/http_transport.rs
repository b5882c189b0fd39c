#[cfg(test)]
#[path = "http_transport_test.rs"]
mod tests;

use async_trait::async_trait;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ChatError;
use crate::domain::models::ChatErrorKind;
use crate::domain::models::ChatFailure;
use crate::domain::models::ChatRequest;
use crate::domain::models::ChatSuccess;
use crate::domain::models::ChatTransport;

/// Talks to a running gateway over `POST /api/chat`.
pub struct HttpTransport {
    url: String,
    client: reqwest::Client,
}

impl Default for HttpTransport {
    fn default() -> HttpTransport {
        return HttpTransport::new(&Config::get(ConfigKey::GatewayURL));
    }
}

impl HttpTransport {
    pub fn new(url: &str) -> HttpTransport {
        return HttpTransport {
            url: url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        };
    }
}

fn transport_error(err: reqwest::Error) -> ChatError {
    tracing::error!(error = ?err, "Gateway request failed");
    if err.is_timeout() {
        return ChatError::new(ChatErrorKind::Timeout, "Gateway request timed out");
    }

    return ChatError::new(
        ChatErrorKind::NetworkError,
        "No connection to the gateway. Please check your network and try again.",
    );
}

#[async_trait]
impl ChatTransport for HttpTransport {
    #[allow(clippy::implicit_return)]
    async fn send(&self, request: &ChatRequest) -> Result<String, ChatError> {
        let res = self
            .client
            .post(format!("{url}/api/chat", url = self.url))
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = res.status().as_u16();
        let body = res.text().await.map_err(transport_error)?;

        if (200..300).contains(&status) {
            return match serde_json::from_str::<ChatSuccess>(&body) {
                Ok(success) => Ok(success.response),
                Err(err) => {
                    tracing::error!(error = ?err, "Unreadable gateway response");
                    Err(ChatError::new(
                        ChatErrorKind::UpstreamError,
                        "Unreadable response from the gateway",
                    ))
                }
            };
        }

        // Older gateways answer without a `kind`, fall back to the status.
        let failure = serde_json::from_str::<ChatFailure>(&body).ok();
        let kind = failure
            .as_ref()
            .and_then(|failure| return failure.kind)
            .unwrap_or_else(|| return ChatErrorKind::from_status(status));
        let message = failure
            .map(|failure| return failure.error)
            .unwrap_or_else(|| return format!("Gateway responded with status {status}"));

        tracing::warn!(status = status, kind = %kind, "Gateway rejected chat request");
        return Err(ChatError::new(kind, &message));
    }
}
