use std::sync::RwLock;

use serde::Serialize;
use tracing::{info, warn};

use crate::audio::AudioPayload;
use crate::engines::{derive_engine_id, TtsEngine, Voice};
use crate::error::TtsError;

/// Snapshot row for one registered engine.
#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub current: bool,
}

/// Holds every backend that passed its readiness probe and routes
/// voice-listing and synthesis calls to the active one.
///
/// The engine set is fixed after construction; only the active id mutates,
/// behind its own lock. Engines themselves are stateless, so synthesis calls
/// run concurrently without coordination.
pub struct EngineRegistry {
    engines: Vec<(String, Box<dyn TtsEngine>)>,
    active: RwLock<Option<String>>,
}

impl EngineRegistry {
    /// Probe each candidate once and keep the ones that report ready.
    /// Partial failure is normal: cloud engines missing credentials are
    /// skipped with a log line, and the placeholder generators keep the
    /// registry from ending up empty.
    ///
    /// The default active engine is `preferred` when it registered, else the
    /// first registered engine, else none.
    pub fn register_all(candidates: Vec<Box<dyn TtsEngine>>, preferred: &str) -> Self {
        let mut engines: Vec<(String, Box<dyn TtsEngine>)> = Vec::new();

        for engine in candidates {
            if !engine.is_available() {
                warn!("TTS engine not available, skipping: {}", engine.name());
                continue;
            }

            let id = derive_engine_id(engine.name());
            info!("Loaded TTS engine: {} with id: {}", engine.name(), id);

            // Id collisions are a configuration error; the later registration
            // wins silently, keeping the original position.
            if let Some(slot) = engines.iter_mut().find(|(existing, _)| *existing == id) {
                slot.1 = engine;
            } else {
                engines.push((id, engine));
            }
        }

        let active = if engines.iter().any(|(id, _)| id == preferred) {
            Some(preferred.to_string())
        } else {
            engines.first().map(|(id, _)| id.clone())
        };

        info!(
            "Engines registered: [{}], active: {:?}",
            engines
                .iter()
                .map(|(id, _)| id.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            active
        );

        Self {
            engines,
            active: RwLock::new(active),
        }
    }

    fn find(&self, id: &str) -> Option<&dyn TtsEngine> {
        self.engines
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, engine)| engine.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    pub fn active_id(&self) -> Option<String> {
        self.active.read().ok().and_then(|a| a.clone())
    }

    /// Registration-ordered snapshot; exactly one row is `current` once any
    /// engine is registered.
    pub fn list_engines(&self) -> Vec<EngineInfo> {
        let active = self.active_id();
        self.engines
            .iter()
            .map(|(id, engine)| EngineInfo {
                id: id.clone(),
                name: engine.name().to_string(),
                description: engine.description().to_string(),
                current: active.as_deref() == Some(id.as_str()),
            })
            .collect()
    }

    /// User-facing toggle: false (not an error) for an unknown id.
    pub fn switch_to(&self, id: &str) -> bool {
        if self.find(id).is_none() {
            return false;
        }
        if let Ok(mut active) = self.active.write() {
            *active = Some(id.to_string());
            info!("Switched to TTS engine: {}", id);
            true
        } else {
            false
        }
    }

    /// Display name of a registered engine, for switch responses.
    pub fn engine_name(&self, id: &str) -> Option<&'static str> {
        self.find(id).map(|engine| engine.name())
    }

    /// Voices of the named engine, or of the active one. Empty when nothing
    /// resolves; callers treat that as degraded, not an error.
    pub fn list_voices(&self, engine_id: Option<&str>) -> Vec<Voice> {
        let resolved = engine_id
            .map(str::to_string)
            .or_else(|| self.active_id());
        match resolved.and_then(|id| self.find(&id)) {
            Some(engine) => engine.voices(),
            None => Vec::new(),
        }
    }

    /// Delegate to the named engine, or the active one. The registry performs
    /// no fallback of its own; `Synthesis` errors propagate unchanged and the
    /// retry-with-placeholder policy lives in the request handler.
    pub fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        engine_id: Option<&str>,
    ) -> Result<AudioPayload, TtsError> {
        // Read the active id once; a concurrent switch must not change the
        // engine mid-call.
        let resolved = engine_id
            .map(str::to_string)
            .or_else(|| self.active_id())
            .ok_or(TtsError::NoActiveEngine)?;

        let engine = self.find(&resolved).ok_or(TtsError::NoActiveEngine)?;
        engine.synthesize(text, voice_id)
    }
}
