use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::audio::AudioPayload;
use crate::error::TtsError;
use crate::history::HistoryStore;
use crate::registry::EngineRegistry;
use crate::settings::SETTINGS;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<EngineRegistry>,
    pub history: Arc<HistoryStore>,
}

/// JSON `{error}` body with a status code, the shape the web UI expects.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<TtsError> for ApiError {
    fn from(err: TtsError) -> Self {
        match err {
            TtsError::NoActiveEngine => Self::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
            TtsError::Synthesis(_) | TtsError::Storage(_) => Self::internal(err.to_string()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/engines", get(list_engines))
        .route("/api/engines/switch", post(switch_engine))
        .route("/api/voices", get(list_voices))
        .route("/api/generate", post(generate))
        .route("/api/download", post(download))
        .route("/api/history", get(history_list))
        .route("/api/history/stats", get(history_stats))
        .route("/api/history/clear", post(history_clear))
        .route("/api/history/cleanup", post(history_cleanup))
        .route("/api/history/:id/audio", get(history_audio))
        .route("/api/history/:id", delete(history_delete))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let engines = state.registry.list_engines();
    let voices = state.registry.list_voices(None);
    Json(json!({
        "status": "healthy",
        "engines": engines.len(),
        "active_engine": state.registry.active_id(),
        "available_voices": voices.len(),
    }))
}

async fn list_engines(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "engines": state.registry.list_engines() }))
}

#[derive(Deserialize)]
struct SwitchRequest {
    engine: String,
}

async fn switch_engine(
    State(state): State<AppState>,
    Json(req): Json<SwitchRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.registry.switch_to(&req.engine) {
        return Err(ApiError::not_found(format!(
            "Engine not found: {}",
            req.engine
        )));
    }
    let name = state.registry.engine_name(&req.engine).unwrap_or_default();
    Ok(Json(json!({ "success": true, "name": name })))
}

#[derive(Deserialize)]
struct VoicesQuery {
    engine: Option<String>,
}

async fn list_voices(
    State(state): State<AppState>,
    Query(query): Query<VoicesQuery>,
) -> Json<serde_json::Value> {
    let voices = state.registry.list_voices(query.engine.as_deref());
    Json(json!({ "voices": voices }))
}

#[derive(Deserialize)]
struct GenerateRequest {
    text: String,
    voice: String,
    engine: Option<String>,
}

async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let text = validate_text(&req.text)?;
    let (payload, engine_id) = run_synthesis(&state, &text, &req.voice, req.engine).await?;
    let wav = payload.to_wav_bytes()?;

    // Archiving must never fail the synthesis response; a storage failure
    // just means this one is not in the history list.
    let history_id = {
        let history = state.history.clone();
        let text = text.clone();
        let voice = req.voice.clone();
        let engine = engine_id.clone();
        let wav = wav.clone();
        tokio::task::spawn_blocking(move || history.add(&text, &voice, &engine, &wav))
            .await
            .map_err(|e| ApiError::internal(e.to_string()))?
            .map(|entry| entry.id)
            .map_err(|e| error!("Failed to archive synthesis: {}", e))
            .ok()
    };

    Ok(Json(json!({
        "success": true,
        "audio": BASE64.encode(&wav),
        "format": "wav",
        "sample_rate": payload.sample_rate,
        "duration": payload.duration_secs(),
        "engine": engine_id,
        "history_id": history_id,
    })))
}

async fn download(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Response, ApiError> {
    let text = validate_text(&req.text)?;
    let (payload, _) = run_synthesis(&state, &text, &req.voice, req.engine).await?;
    let wav = payload.to_wav_bytes()?;

    let disposition = format!("attachment; filename=\"kitten_tts_{}.wav\"", req.voice);
    Ok((
        [
            (header::CONTENT_TYPE, "audio/wav".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        wav,
    )
        .into_response())
}

#[derive(Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

async fn history_list(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<serde_json::Value> {
    Json(json!({ "history": state.history.list(query.limit) }))
}

async fn history_audio(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let history = state.history.clone();
    let path = tokio::task::spawn_blocking(move || history.payload_path(&id))
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Audio not found"))?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, "audio/wav")], bytes).into_response())
}

async fn history_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let history = state.history.clone();
    let deleted = tokio::task::spawn_blocking(move || history.delete(&id))
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(Json(json!({ "deleted": deleted })))
}

async fn history_clear(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let history = state.history.clone();
    let cleared = tokio::task::spawn_blocking(move || history.clear_all())
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(Json(json!({ "cleared": cleared })))
}

async fn history_stats(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let history = state.history.clone();
    let stats = tokio::task::spawn_blocking(move || history.stats())
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(Json(serde_json::to_value(stats).unwrap_or_default()))
}

async fn history_cleanup(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let history = state.history.clone();
    let removed =
        tokio::task::spawn_blocking(move || history.evict_expired(chrono::Utc::now()))
            .await
            .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(Json(json!({ "removed": removed })))
}

fn validate_text(text: &str) -> Result<String, ApiError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request("Text is required"));
    }

    let max_chars = SETTINGS
        .read()
        .map(|s| s.max_text_chars)
        .unwrap_or(50_000);
    if trimmed.chars().count() > max_chars {
        return Err(ApiError::bad_request(format!(
            "Text too long (max {} characters)",
            max_chars
        )));
    }

    Ok(trimmed.to_string())
}

/// Caller-level fallback policy: on a synthesis failure, retry once with the
/// configured placeholder engine before giving up, and report which engine
/// actually produced the audio. A request only visibly fails when the
/// fallback fails too. `NoActiveEngine` is surfaced as-is, never retried.
pub fn synthesize_with_retry(
    registry: &EngineRegistry,
    text: &str,
    voice: &str,
    engine: Option<&str>,
    fallback: &str,
) -> Result<(AudioPayload, String), TtsError> {
    let requested = engine
        .map(str::to_string)
        .or_else(|| registry.active_id());

    match registry.synthesize(text, voice, requested.as_deref()) {
        Ok(payload) => Ok((payload, requested.unwrap_or_default())),
        Err(TtsError::Synthesis(msg)) => {
            warn!(
                "Synthesis failed on {:?} ({}), retrying with fallback engine {}",
                requested, msg, fallback
            );
            let payload = registry.synthesize(text, voice, Some(fallback))?;
            info!("Fallback engine {} recovered the request", fallback);
            Ok((payload, fallback.to_string()))
        }
        Err(e) => Err(e),
    }
}

/// Engines block (HTTP, subprocess), so the whole attempt-plus-retry runs on
/// the blocking pool.
async fn run_synthesis(
    state: &AppState,
    text: &str,
    voice: &str,
    engine: Option<String>,
) -> Result<(AudioPayload, String), ApiError> {
    let registry = state.registry.clone();
    let fallback = SETTINGS
        .read()
        .map(|s| s.fallback_engine.clone())
        .unwrap_or_else(|_| "kitten".to_string());
    let text = text.to_string();
    let voice = voice.to_string();

    tokio::task::spawn_blocking(move || {
        synthesize_with_retry(&registry, &text, &voice, engine.as_deref(), &fallback)
    })
    .await
    .map_err(|e| ApiError::internal(e.to_string()))?
    .map_err(ApiError::from)
}
