use std::time::Duration;

use serde_json::json;

use crate::audio::{decode_to_mono, AudioPayload};
use crate::engines::{TtsEngine, Voice};
use crate::error::TtsError;

const SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

/// OpenAI neural TTS. Requires an API key; requests WAV output and decodes
/// it locally.
pub struct OpenAiEngine {
    client: Option<reqwest::blocking::Client>,
    api_key: String,
}

impl OpenAiEngine {
    pub fn new() -> Self {
        let (api_key, timeout) = crate::settings::SETTINGS
            .read()
            .map(|s| (s.openai_api_key.clone(), s.request_timeout_secs))
            .unwrap_or_default();

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout.max(1)))
            .build()
            .ok();

        Self { client, api_key }
    }
}

impl TtsEngine for OpenAiEngine {
    fn name(&self) -> &'static str {
        "OpenAI TTS"
    }

    fn description(&self) -> &'static str {
        "OpenAI high-quality neural text-to-speech"
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty() && self.client.is_some()
    }

    fn voices(&self) -> Vec<Voice> {
        let catalog = [
            ("alloy", "Alloy - Balanced", "Neutral"),
            ("echo", "Echo - Male", "Male"),
            ("fable", "Fable - British Male", "Male"),
            ("onyx", "Onyx - Deep Male", "Male"),
            ("nova", "Nova - Female", "Female"),
            ("shimmer", "Shimmer - Soft Female", "Female"),
        ];
        catalog
            .iter()
            .map(|(id, name, gender)| {
                let mut v = Voice::new(id, name);
                v.gender = Some(gender.to_string());
                v
            })
            .collect()
    }

    fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioPayload, TtsError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| TtsError::synthesis("OpenAI TTS client not initialized"))?;

        // The API validates the voice itself; an unknown id fails there.
        let response = client
            .post(SPEECH_URL)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": "tts-1-hd",
                "voice": voice_id,
                "input": text,
                "response_format": "wav",
            }))
            .send()
            .map_err(|e| TtsError::synthesis(format!("OpenAI TTS request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(TtsError::synthesis(format!(
                "OpenAI TTS returned HTTP {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|e| TtsError::synthesis(format!("OpenAI TTS body read failed: {}", e)))?;

        decode_to_mono(bytes.to_vec())
    }
}
