#[cfg(test)]
#[path = "elevenlabs_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::SpeechBackend;

const MODEL_ID: &str = "eleven_turbo_v2_5";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct VoiceSettings {
    stability: f64,
    similarity_boost: f64,
    style: f64,
    use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> VoiceSettings {
        return VoiceSettings {
            stability: 0.45,
            similarity_boost: 0.75,
            style: 0.3,
            use_speaker_boost: true,
        };
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SpeechRequest {
    text: String,
    model_id: String,
    voice_settings: VoiceSettings,
}

pub struct ElevenLabs {
    url: String,
    token: String,
    voice_id: String,
}

impl Default for ElevenLabs {
    fn default() -> ElevenLabs {
        return ElevenLabs {
            url: Config::get(ConfigKey::ElevenlabsURL),
            token: Config::get(ConfigKey::ElevenlabsToken),
            voice_id: Config::get(ConfigKey::VoiceID),
        };
    }
}

#[async_trait]
impl SpeechBackend for ElevenLabs {
    fn name(&self) -> String {
        return "elevenlabs".to_string();
    }

    fn is_configured(&self) -> bool {
        return !self.token.is_empty();
    }

    #[allow(clippy::implicit_return)]
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let req = SpeechRequest {
            text: text.to_string(),
            model_id: MODEL_ID.to_string(),
            voice_settings: VoiceSettings::default(),
        };

        let res = reqwest::Client::new()
            .post(format!(
                "{url}/v1/text-to-speech/{voice_id}",
                url = self.url,
                voice_id = self.voice_id
            ))
            .query(&[
                ("optimize_streaming_latency", "3"),
                ("output_format", "mp3_22050_32"),
            ])
            .header("Accept", "audio/mpeg")
            .header("xi-api-key", &self.token)
            .json(&req)
            .send()
            .await?;

        let status = res.status().as_u16();
        if !res.status().is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::error!(
                status = status,
                voice_id = %self.voice_id,
                body = %body,
                "ElevenLabs request failed"
            );
            bail!(format!("TTS API request failed: {status}"));
        }

        let audio = res.bytes().await?;
        return Ok(audio.to_vec());
    }
}
