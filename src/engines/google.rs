use std::time::Duration;

use crate::audio::{decode_to_mono, AudioPayload};
use crate::engines::{TtsEngine, Voice};
use crate::error::TtsError;

const TTS_URL: &str = "https://translate.google.com/translate_tts";

/// Google online TTS via the translate endpoint. Returns MP3, decoded to
/// mono samples. Voice ids select a language/speed pair.
pub struct GoogleEngine {
    client: Option<reqwest::blocking::Client>,
    enabled: bool,
}

impl GoogleEngine {
    pub fn new() -> Self {
        let (enabled, timeout) = crate::settings::SETTINGS
            .read()
            .map(|s| (s.google_tts_enabled, s.request_timeout_secs))
            .unwrap_or((true, 30));

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .ok();

        Self { client, enabled }
    }

    /// (language tag, slow speech) for a voice id. Unknown ids fall back to
    /// standard US English, matching the service's permissive behavior.
    fn voice_config(voice_id: &str) -> (&'static str, bool) {
        match voice_id {
            "en-us-standard" => ("en", false),
            "en-us-slow" => ("en", true),
            "en-uk-standard" => ("en-uk", false),
            "en-au-standard" => ("en-au", false),
            "en-ca-standard" => ("en-ca", false),
            "en-in-standard" => ("en-in", false),
            "zh-cn-standard" => ("zh-cn", false),
            "zh-tw-standard" => ("zh-tw", false),
            _ => ("en", false),
        }
    }
}

impl TtsEngine for GoogleEngine {
    fn name(&self) -> &'static str {
        "Google TTS"
    }

    fn description(&self) -> &'static str {
        "Google online text-to-speech service"
    }

    fn is_available(&self) -> bool {
        self.enabled && self.client.is_some()
    }

    fn voices(&self) -> Vec<Voice> {
        let catalog = [
            ("en-us-standard", "English (US) - Standard", "en"),
            ("en-us-slow", "English (US) - Slow", "en"),
            ("en-uk-standard", "English (UK) - Standard", "en-uk"),
            ("en-au-standard", "English (AU) - Standard", "en-au"),
            ("en-ca-standard", "English (CA) - Standard", "en-ca"),
            ("en-in-standard", "English (IN) - Standard", "en-in"),
            ("zh-cn-standard", "Chinese (CN) - Standard", "zh-cn"),
            ("zh-tw-standard", "Chinese (TW) - Standard", "zh-tw"),
        ];
        catalog
            .iter()
            .map(|(id, name, lang)| {
                let mut v = Voice::new(id, name);
                v.language = Some(lang.to_string());
                let slow = Self::voice_config(id).1;
                v.params.insert("slow".to_string(), slow.into());
                v
            })
            .collect()
    }

    fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioPayload, TtsError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| TtsError::synthesis("Google TTS client not initialized"))?;

        let (lang, slow) = Self::voice_config(voice_id);
        let speed = if slow { "0.24" } else { "1" };

        let response = client
            .get(TTS_URL)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", lang),
                ("ttsspeed", speed),
                ("q", text),
            ])
            .send()
            .map_err(|e| TtsError::synthesis(format!("Google TTS request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(TtsError::synthesis(format!(
                "Google TTS returned HTTP {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|e| TtsError::synthesis(format!("Google TTS body read failed: {}", e)))?;

        decode_to_mono(bytes.to_vec())
    }
}
