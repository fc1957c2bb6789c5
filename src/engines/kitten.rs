use std::f32::consts::PI;

use crate::audio::AudioPayload;
use crate::engines::{TtsEngine, Voice};
use crate::error::TtsError;

const SAMPLE_RATE: u32 = 24_000;
const SECS_PER_CHAR: f32 = 0.07;

/// Deterministic placeholder for the lightweight Kitten voice model. Adds a
/// 5 Hz vibrato on top of a three-partial tone; per-voice frequency and
/// vibrato depth. Always available, used as the configured fallback engine.
pub struct KittenEngine;

impl KittenEngine {
    pub fn new() -> Self {
        Self
    }

    /// (base frequency, vibrato depth) for a voice id.
    fn voice_profile(voice_id: &str) -> (f32, f32) {
        match voice_id {
            "kitten-voice-1" => (250.0, 0.02),
            "kitten-voice-2" => (230.0, 0.01),
            "kitten-voice-3" => (170.0, 0.015),
            "kitten-voice-4" => (160.0, 0.005),
            _ => (200.0, 0.01),
        }
    }
}

impl Default for KittenEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TtsEngine for KittenEngine {
    fn name(&self) -> &'static str {
        "Kitten TTS"
    }

    fn description(&self) -> &'static str {
        "Lightweight 25MB AI voice model (simulated)"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn voices(&self) -> Vec<Voice> {
        let catalog = [
            ("kitten-voice-1", "Kitten Voice 1 - Expressive", "Female"),
            ("kitten-voice-2", "Kitten Voice 2 - Clear", "Female"),
            ("kitten-voice-3", "Kitten Voice 3 - Warm", "Male"),
            ("kitten-voice-4", "Kitten Voice 4 - Professional", "Male"),
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
        let (base_freq, vibrato_depth) = Self::voice_profile(voice_id);
        let char_count = text.chars().count();
        let duration = char_count as f32 * SECS_PER_CHAR;
        let total = (duration * SAMPLE_RATE as f32) as usize;

        let mut samples = Vec::with_capacity(total);
        for i in 0..total {
            let t = i as f32 / SAMPLE_RATE as f32;
            let vibrato = 1.0 + vibrato_depth * (2.0 * PI * 5.0 * t).sin();
            let tone = 0.4 * (2.0 * PI * base_freq * vibrato * t).sin()
                + 0.25 * (2.0 * PI * base_freq * 1.3 * vibrato * t).sin()
                + 0.15 * (2.0 * PI * base_freq * 0.7 * vibrato * t).sin();
            let envelope = (-t * 0.3).exp() * (1.0 - (-t * 15.0).exp());
            // Slow modulation tied to the text length for a little character.
            let char_mod = (2.0 * PI * char_count as f32 * 0.1 * t).sin() * 0.1;
            samples.push(tone * envelope * (1.0 + char_mod));
        }

        let peak = samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
        if peak > 0.0 {
            for s in &mut samples {
                *s = *s / peak * 0.85;
            }
        }

        Ok(AudioPayload::new(samples, SAMPLE_RATE))
    }
}
