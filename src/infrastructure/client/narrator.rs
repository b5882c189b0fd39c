#[cfg(test)]
#[path = "narrator_test.rs"]
mod tests;

use std::path;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::fs;
use tokio::process;
use uuid::Uuid;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Narrator;
use crate::domain::models::SpeechFailure;
use crate::domain::models::SpeechRequest;
use crate::domain::models::SpeechSuccess;
use crate::domain::services::AUDIO_DATA_URL_PREFIX;

#[cfg(target_os = "macos")]
const LOCAL_SYNTHESIZER: &str = "say";
#[cfg(not(target_os = "macos"))]
const LOCAL_SYNTHESIZER: &str = "espeak";

pub fn decode_audio(data_url: &str) -> Result<Vec<u8>> {
    let encoded = match data_url.strip_prefix(AUDIO_DATA_URL_PREFIX) {
        Some(encoded) => encoded,
        None => bail!("Speech response is not an MP3 data URL"),
    };

    return Ok(STANDARD.decode(encoded)?);
}

/// Narrates through the gateway's `/api/text-to-speech`, saving the MP3 to
/// the cache directory. Falls back to the platform synthesizer whenever the
/// gateway can't produce audio.
pub struct HttpNarrator {
    url: String,
    cache_dir: path::PathBuf,
    synthesizer: String,
    client: reqwest::Client,
}

impl Default for HttpNarrator {
    fn default() -> HttpNarrator {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_default()
            .join("mq-assistant/speech");

        return HttpNarrator::new(&Config::get(ConfigKey::GatewayURL), cache_dir);
    }
}

impl HttpNarrator {
    pub fn new(url: &str, cache_dir: path::PathBuf) -> HttpNarrator {
        return HttpNarrator {
            url: url.trim_end_matches('/').to_string(),
            cache_dir,
            synthesizer: LOCAL_SYNTHESIZER.to_string(),
            client: reqwest::Client::new(),
        };
    }

    async fn fetch_audio(&self, text: &str) -> Result<Vec<u8>> {
        let res = self
            .client
            .post(format!("{url}/api/text-to-speech", url = self.url))
            .json(&SpeechRequest {
                text: text.to_string(),
            })
            .send()
            .await?;

        let status = res.status().as_u16();
        if !res.status().is_success() {
            let failure = res.json::<SpeechFailure>().await.unwrap_or(SpeechFailure {
                error: format!("Speech request failed with status {status}"),
                fallback: true,
            });
            tracing::warn!(
                status = status,
                fallback = failure.fallback,
                error = %failure.error,
                "Gateway could not synthesize speech"
            );
            bail!(failure.error);
        }

        let success = res.json::<SpeechSuccess>().await?;
        return decode_audio(&success.audio);
    }

    async fn save_audio(&self, audio: &[u8]) -> Result<path::PathBuf> {
        fs::create_dir_all(&self.cache_dir).await?;
        let audio_path = self.cache_dir.join(format!("{}.mp3", Uuid::new_v4()));
        fs::write(&audio_path, audio).await?;

        return Ok(audio_path);
    }

    /// A missing synthesizer only gets logged.
    async fn speak_locally(&self, text: &str) -> Result<()> {
        let status = process::Command::new(&self.synthesizer)
            .arg(text)
            .kill_on_drop(true)
            .status()
            .await;

        match status {
            Ok(status) if status.success() => {}
            Ok(status) => {
                tracing::warn!(synthesizer = %self.synthesizer, code = ?status.code(), "Local synthesizer failed");
            }
            Err(err) => {
                tracing::warn!(synthesizer = %self.synthesizer, error = ?err, "Local synthesizer is unavailable");
            }
        }

        return Ok(());
    }
}

#[async_trait]
impl Narrator for HttpNarrator {
    #[allow(clippy::implicit_return)]
    async fn narrate(&self, text: &str) -> Result<()> {
        let audio = match self.fetch_audio(text).await {
            Ok(audio) => audio,
            Err(err) => {
                tracing::info!(error = ?err, "Falling back to local speech synthesis");
                return self.speak_locally(text).await;
            }
        };

        let audio_path = self.save_audio(&audio).await?;
        tracing::info!(path = %audio_path.display(), bytes = audio.len(), "Saved narration");

        return Ok(());
    }
}
