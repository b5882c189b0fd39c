#[cfg(test)]
#[path = "speech_test.rs"]
mod tests;

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::domain::models::SpeechBackend;
use crate::domain::models::SpeechFailure;
use crate::domain::models::SpeechRequest;
use crate::domain::models::SpeechSuccess;

pub const AUDIO_DATA_URL_PREFIX: &str = "data:audio/mpeg;base64,";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRejection {
    pub status: u16,
    pub body: SpeechFailure,
}

impl SpeechRejection {
    fn new(status: u16, error: &str, fallback: bool) -> SpeechRejection {
        return SpeechRejection {
            status,
            body: SpeechFailure {
                error: error.to_string(),
                fallback,
            },
        };
    }
}

/// Relay for `/api/text-to-speech`. Every failure past validation tells the
/// caller to fall back to an on-device synthesizer.
pub struct SpeechGateway {
    backend: Arc<dyn SpeechBackend + Send + Sync>,
}

impl SpeechGateway {
    pub fn new(backend: Arc<dyn SpeechBackend + Send + Sync>) -> SpeechGateway {
        return SpeechGateway { backend };
    }

    pub async fn handle(&self, body: &[u8]) -> Result<SpeechSuccess, SpeechRejection> {
        let request: SpeechRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(err) => {
                tracing::error!(error = ?err, "Invalid text provided to text-to-speech");
                if serde_json::from_slice::<serde_json::Value>(body).is_ok() {
                    return Err(SpeechRejection::new(400, "Text is required", false));
                }
                return Err(SpeechRejection::new(500, "Failed to generate speech", true));
            }
        };

        if request.text.is_empty() {
            return Err(SpeechRejection::new(400, "Text is required", false));
        }

        if !self.backend.is_configured() {
            tracing::error!(provider = %self.backend.name(), "Speech token is not configured");
            return Err(SpeechRejection::new(
                503,
                "Text-to-speech service not configured",
                true,
            ));
        }

        tracing::info!(
            provider = %self.backend.name(),
            text_length = request.text.chars().count(),
            "Synthesizing speech"
        );

        let audio = match self.backend.synthesize(&request.text).await {
            Ok(audio) => audio,
            Err(err) => {
                tracing::error!(error = ?err, "Text-to-speech request failed");
                return Err(SpeechRejection::new(500, "Failed to generate speech", true));
            }
        };

        tracing::debug!(bytes = audio.len(), "Audio received");

        return Ok(SpeechSuccess {
            success: true,
            audio: format!("{AUDIO_DATA_URL_PREFIX}{}", STANDARD.encode(audio)),
            provider: self.backend.name(),
        });
    }
}
