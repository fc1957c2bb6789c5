use std::f32::consts::PI;

use crate::audio::AudioPayload;
use crate::engines::{TtsEngine, Voice};
use crate::error::TtsError;

const SAMPLE_RATE: u32 = 22_050;
const SECS_PER_CHAR: f32 = 0.08;

/// Deterministic placeholder standing in for the Coqui neural model: a small
/// harmonic stack with an attack/decay envelope, voiced by base frequency.
/// Carries no external dependency, so it is part of the fallback floor.
pub struct CoquiEngine;

impl CoquiEngine {
    pub fn new() -> Self {
        Self
    }

    fn base_frequency(voice_id: &str) -> f32 {
        match voice_id {
            "ljspeech" => 220.0,
            "vctk-p225" => 200.0,
            "vctk-p226" => 150.0,
            "vctk-p227" => 140.0,
            "jenny" => 210.0,
            "ryan" => 160.0,
            // Unknown voice ids fall back to a neutral profile.
            _ => 180.0,
        }
    }
}

impl Default for CoquiEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TtsEngine for CoquiEngine {
    fn name(&self) -> &'static str {
        "Coqui TTS"
    }

    fn description(&self) -> &'static str {
        "High-quality neural text-to-speech (simulated)"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn voices(&self) -> Vec<Voice> {
        let catalog = [
            ("ljspeech", "LJSpeech - Female", "Female"),
            ("vctk-p225", "VCTK P225 - Female British", "Female"),
            ("vctk-p226", "VCTK P226 - Male British", "Male"),
            ("vctk-p227", "VCTK P227 - Male British", "Male"),
            ("jenny", "Jenny - Neural Female", "Female"),
            ("ryan", "Ryan - Neural Male", "Male"),
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
        let base_freq = Self::base_frequency(voice_id);
        let duration = text.chars().count() as f32 * SECS_PER_CHAR;
        let total = (duration * SAMPLE_RATE as f32) as usize;

        // Deterministic pseudo-noise so identical requests produce identical
        // payloads (xorshift32 seeded from the voice profile and text length).
        let mut noise_state: u32 =
            0x9E37_79B9 ^ (base_freq as u32) ^ (text.len() as u32).wrapping_mul(2_654_435_761);
        let mut noise = move || {
            noise_state ^= noise_state << 13;
            noise_state ^= noise_state >> 17;
            noise_state ^= noise_state << 5;
            (noise_state as f32 / u32::MAX as f32) * 2.0 - 1.0
        };

        let mut samples = Vec::with_capacity(total);
        for i in 0..total {
            let t = i as f32 / SAMPLE_RATE as f32;
            let tone = 0.3 * (2.0 * PI * base_freq * t).sin()
                + 0.2 * (2.0 * PI * base_freq * 1.5 * t).sin()
                + 0.1 * (2.0 * PI * base_freq * 2.0 * t).sin()
                + 0.05 * noise();
            let envelope = (-t * 0.5).exp() * (1.0 - (-t * 10.0).exp());
            samples.push(tone * envelope);
        }

        let peak = samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
        if peak > 0.0 {
            for s in &mut samples {
                *s = *s / peak * 0.8;
            }
        }

        Ok(AudioPayload::new(samples, SAMPLE_RATE))
    }
}
