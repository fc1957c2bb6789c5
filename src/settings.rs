use config::{Config, File};
use lazy_static::lazy_static;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::RwLock;

#[derive(Debug, Deserialize)]
pub struct Settings {
    // HTTP server
    pub host: String,
    pub port: u16,
    // History retention
    pub storage_dir: String, // empty = platform data dir
    pub max_history_files: usize,
    pub cleanup_days: i64, // <= 0 disables timed eviction
    pub preview_chars: usize,
    // Synthesis
    pub max_text_chars: usize,
    pub default_engine: String,
    pub fallback_engine: String,
    pub request_timeout_secs: u64,
    // Backend configuration
    pub espeak_binary: String,
    pub google_tts_enabled: bool,
    pub openai_api_key: String, // empty = engine unavailable
    pub azure_speech_key: String,
    pub azure_region: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            storage_dir: String::new(),
            max_history_files: 100,
            cleanup_days: 7,
            preview_chars: 200,
            max_text_chars: 50_000,
            default_engine: "google".to_string(),
            fallback_engine: "kitten".to_string(),
            request_timeout_secs: 30,
            espeak_binary: "espeak-ng".to_string(),
            google_tts_enabled: true,
            openai_api_key: String::new(),
            azure_speech_key: String::new(),
            azure_region: "eastus".to_string(),
        }
    }
}

lazy_static! {
    pub static ref SETTINGS: RwLock<Settings> =
        RwLock::new(Settings::new().expect("Failed to load settings"));
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        let builder = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 5000)?
            .set_default("storage_dir", "")?
            .set_default("max_history_files", 100)?
            .set_default("cleanup_days", 7)?
            .set_default("preview_chars", 200)?
            .set_default("max_text_chars", 50_000)?
            .set_default("default_engine", "google")?
            .set_default("fallback_engine", "kitten")?
            .set_default("request_timeout_secs", 30)?
            .set_default("espeak_binary", "espeak-ng")?
            .set_default("google_tts_enabled", true)?
            .set_default("openai_api_key", std::env::var("OPENAI_API_KEY").unwrap_or_default())?
            .set_default("azure_speech_key", std::env::var("AZURE_SPEECH_KEY").unwrap_or_default())?
            .set_default(
                "azure_region",
                std::env::var("AZURE_SPEECH_REGION").unwrap_or_else(|_| "eastus".to_string()),
            )?
            // Merge with local config file (if exists)
            .add_source(File::with_name("Kitten").required(false))
            .add_source(
                File::with_name(&format!(
                    "{}/.config/kittentts-web/Kitten",
                    std::env::var("HOME").unwrap_or_default()
                ))
                .required(false),
            )
            // Merge with environment variables (e.g. KITTEN_PORT)
            .add_source(config::Environment::with_prefix("KITTEN"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.max_history_files == 0 {
            return Err(config::ConfigError::Message(
                "max_history_files must be greater than 0".to_string(),
            ));
        }
        if self.preview_chars == 0 {
            return Err(config::ConfigError::Message(
                "preview_chars must be greater than 0".to_string(),
            ));
        }
        if self.max_text_chars == 0 {
            return Err(config::ConfigError::Message(
                "max_text_chars must be greater than 0".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(config::ConfigError::Message(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolved history root: the configured dir, or `audio_history` under
    /// the platform data directory.
    pub fn storage_root(&self) -> PathBuf {
        if !self.storage_dir.is_empty() {
            return PathBuf::from(&self.storage_dir);
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kittentts-web")
            .join("audio_history")
    }
}
