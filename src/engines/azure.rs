use std::time::Duration;

use crate::audio::{decode_to_mono, AudioPayload};
use crate::engines::{TtsEngine, Voice};
use crate::error::TtsError;

/// Azure Cognitive Services TTS. Requires a subscription key; posts SSML and
/// receives riff/PCM WAV back.
pub struct AzureEngine {
    client: Option<reqwest::blocking::Client>,
    subscription_key: String,
    region: String,
}

impl AzureEngine {
    pub fn new() -> Self {
        let (subscription_key, region, timeout) = crate::settings::SETTINGS
            .read()
            .map(|s| {
                (
                    s.azure_speech_key.clone(),
                    s.azure_region.clone(),
                    s.request_timeout_secs,
                )
            })
            .unwrap_or_else(|_| (String::new(), "eastus".to_string(), 30));

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout.max(1)))
            .build()
            .ok();

        Self {
            client,
            subscription_key,
            region,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            self.region
        )
    }

    fn ssml(voice_id: &str, text: &str) -> String {
        // Minimal escaping for the SSML body.
        let escaped = text
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;");
        format!(
            "<speak version='1.0' xml:lang='en-US'><voice name='{}'>{}</voice></speak>",
            voice_id, escaped
        )
    }
}

impl TtsEngine for AzureEngine {
    fn name(&self) -> &'static str {
        "Azure TTS"
    }

    fn description(&self) -> &'static str {
        "Microsoft Azure Cognitive Services TTS"
    }

    fn is_available(&self) -> bool {
        !self.subscription_key.is_empty() && self.client.is_some()
    }

    fn voices(&self) -> Vec<Voice> {
        let catalog = [
            ("en-US-AriaNeural", "Aria (US Female)", "Female", "en-US"),
            ("en-US-DavisNeural", "Davis (US Male)", "Male", "en-US"),
            ("en-US-JennyNeural", "Jenny (US Female)", "Female", "en-US"),
            ("en-US-GuyNeural", "Guy (US Male)", "Male", "en-US"),
            ("en-GB-SoniaNeural", "Sonia (UK Female)", "Female", "en-GB"),
            ("en-GB-RyanNeural", "Ryan (UK Male)", "Male", "en-GB"),
            ("zh-CN-XiaoxiaoNeural", "Xiaoxiao (CN Female)", "Female", "zh-CN"),
            ("zh-CN-YunxiNeural", "Yunxi (CN Male)", "Male", "zh-CN"),
        ];
        catalog
            .iter()
            .map(|(id, name, gender, lang)| {
                let mut v = Voice::new(id, name);
                v.gender = Some(gender.to_string());
                v.language = Some(lang.to_string());
                v
            })
            .collect()
    }

    fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioPayload, TtsError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| TtsError::synthesis("Azure TTS client not initialized"))?;

        let response = client
            .post(self.endpoint())
            .header("Ocp-Apim-Subscription-Key", &self.subscription_key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", "riff-24khz-16bit-mono-pcm")
            .body(Self::ssml(voice_id, text))
            .send()
            .map_err(|e| TtsError::synthesis(format!("Azure TTS request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(TtsError::synthesis(format!(
                "Azure TTS returned HTTP {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|e| TtsError::synthesis(format!("Azure TTS body read failed: {}", e)))?;

        decode_to_mono(bytes.to_vec())
    }
}
