pub mod azure;
pub mod coqui;
pub mod espeak;
pub mod google;
pub mod kitten;
pub mod openai;

use serde::{Deserialize, Serialize};

use crate::audio::AudioPayload;
use crate::error::TtsError;

/// A synthesis voice, scoped to the engine that reported it. Voice ids are
/// not portable across engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voice {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Engine-specific synthesis parameters (free-form).
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl Voice {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            gender: None,
            language: None,
            description: None,
            params: serde_json::Map::new(),
        }
    }
}

/// Capability contract every speech-synthesis backend implements.
///
/// Implementations are stateless beyond constructor-time configuration, so
/// concurrent `synthesize` calls need no synchronization. Blocking work
/// (HTTP, subprocess) is fine here; request handlers run engines on the
/// blocking pool.
pub trait TtsEngine: Send + Sync {
    /// Static display name, e.g. "Google TTS". Never fails.
    fn name(&self) -> &'static str;

    /// Static one-line description. Never fails.
    fn description(&self) -> &'static str;

    /// Pure readiness probe (credentials present, binary runs). Must not
    /// panic; the registry evaluates this once at registration.
    fn is_available(&self) -> bool;

    /// Fixed or dynamically fetched voice catalog, in deterministic order.
    /// An empty list is valid (registered but voiceless).
    fn voices(&self) -> Vec<Voice>;

    /// Produce audio for `text`. An unknown `voice_id` is engine-defined
    /// behavior: some backends fall back to a default voice, some fail.
    fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioPayload, TtsError>;
}

/// Derive a stable engine id from its display name: lower-case, strip the
/// conventional " TTS" suffix, hyphenate ("Google TTS" -> "google",
/// "eSpeak NG" -> "espeak-ng"). Id collisions are a configuration error;
/// the later registration wins silently.
pub fn derive_engine_id(name: &str) -> String {
    let lowered = name.to_lowercase();
    let trimmed = lowered.strip_suffix(" tts").unwrap_or(&lowered).trim();
    trimmed.split_whitespace().collect::<Vec<_>>().join("-")
}

/// The static candidate list, in registration order. Mirrors the original
/// deployment: cloud first, then the local subprocess model, then the
/// placeholder generators that act as the always-available floor.
pub fn default_candidates() -> Vec<Box<dyn TtsEngine>> {
    vec![
        Box::new(google::GoogleEngine::new()),
        Box::new(espeak::EspeakEngine::new()),
        Box::new(coqui::CoquiEngine::new()),
        Box::new(kitten::KittenEngine::new()),
        Box::new(openai::OpenAiEngine::new()),
        Box::new(azure::AzureEngine::new()),
    ]
}
