use thiserror::Error;

/// Failure taxonomy for the synthesis core.
///
/// "Not found" conditions (unknown history id, unknown engine id on switch)
/// are deliberately not errors; they surface as `bool` / `Option` returns.
#[derive(Debug, Error)]
pub enum TtsError {
    /// No engine is active and none could be resolved from the request.
    #[error("no TTS engine is active")]
    NoActiveEngine,

    /// The backend call itself failed (network, auth/quota, subprocess,
    /// malformed input). Callers are expected to fall back to a placeholder
    /// engine rather than propagate this straight to the user.
    #[error("synthesis failed: {0}")]
    Synthesis(String),

    /// The history store could not write a payload to disk. Archiving
    /// failures never fail the synthesis response itself.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl TtsError {
    pub fn synthesis(msg: impl Into<String>) -> Self {
        TtsError::Synthesis(msg.into())
    }
}
