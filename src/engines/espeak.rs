use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::audio::{decode_to_mono, AudioPayload};
use crate::engines::{TtsEngine, Voice};
use crate::error::TtsError;

const SYNTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Local model backend: shells out to espeak-ng and decodes the WAV it
/// writes to stdout. No credentials, but only available when the binary
/// is installed.
pub struct EspeakEngine {
    binary_path: String,
}

impl EspeakEngine {
    pub fn new() -> Self {
        let binary_path = crate::settings::SETTINGS
            .read()
            .map(|s| s.espeak_binary.clone())
            .unwrap_or_else(|_| "espeak-ng".to_string());

        Self { binary_path }
    }

    pub fn with_binary(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Run the subprocess and capture its stdout within the timeout.
    ///
    /// Both pipes are drained on their own threads while we wait; a WAV for
    /// a normal sentence is far larger than the OS pipe buffer, and a child
    /// blocked on a full pipe would otherwise sit there until the deadline
    /// and get killed.
    fn run_synth(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, TtsError> {
        let mut child = Command::new(&self.binary_path)
            .arg("--stdout")
            .arg("-v")
            .arg(voice_id)
            .arg(text)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| TtsError::synthesis(format!("Failed to spawn espeak-ng: {}", e)))?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| TtsError::synthesis("espeak-ng stdout not captured"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| TtsError::synthesis("espeak-ng stderr not captured"))?;

        let out_reader = thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stdout.read_to_end(&mut buf);
            buf
        });
        let err_reader = thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf);
            buf
        });

        match child
            .wait_timeout(SYNTH_TIMEOUT)
            .map_err(|e| TtsError::synthesis(format!("espeak-ng wait failed: {}", e)))?
        {
            Some(status) => {
                let output = out_reader.join().unwrap_or_default();
                let errors = err_reader.join().unwrap_or_default();
                if status.success() {
                    Ok(output)
                } else {
                    let err_msg = String::from_utf8_lossy(&errors);
                    Err(TtsError::synthesis(format!("espeak error: {}", err_msg)))
                }
            }
            None => {
                // Timeout occurred, kill the process. The readers hit EOF
                // once the pipes close and can be left to finish on their own.
                let _ = child.kill();
                let _ = child.wait();
                Err(TtsError::synthesis("espeak-ng timed out after 5s"))
            }
        }
    }
}

impl TtsEngine for EspeakEngine {
    fn name(&self) -> &'static str {
        "eSpeak NG"
    }

    fn description(&self) -> &'static str {
        "Local formant synthesizer (espeak-ng subprocess)"
    }

    fn is_available(&self) -> bool {
        Command::new(&self.binary_path)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn voices(&self) -> Vec<Voice> {
        let catalog = [
            ("en", "English (US)", "en"),
            ("en-gb", "English (UK)", "en-gb"),
            ("en-sc", "English (Scotland)", "en-sc"),
            ("de", "German", "de"),
            ("fr", "French", "fr"),
            ("es", "Spanish", "es"),
            ("zh", "Chinese (Mandarin)", "zh"),
        ];
        catalog
            .iter()
            .map(|(id, name, lang)| {
                let mut v = Voice::new(id, name);
                v.language = Some(lang.to_string());
                v
            })
            .collect()
    }

    fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioPayload, TtsError> {
        let wav = self.run_synth(text, voice_id)?;
        decode_to_mono(wav)
    }
}
