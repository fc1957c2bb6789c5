use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};
use rodio::{Decoder, Source};

use crate::error::TtsError;

/// One finished synthesis: mono f32 samples plus their rate.
/// Produced once by an engine call and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct AudioPayload {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioPayload {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Encode as a 16-bit PCM mono WAV container.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>, TtsError> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec)
                .map_err(|e| TtsError::synthesis(format!("WAV encode failed: {}", e)))?;
            for &sample in &self.samples {
                let clamped = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                writer
                    .write_sample(clamped)
                    .map_err(|e| TtsError::synthesis(format!("WAV encode failed: {}", e)))?;
            }
            writer
                .finalize()
                .map_err(|e| TtsError::synthesis(format!("WAV encode failed: {}", e)))?;
        }

        Ok(cursor.into_inner())
    }
}

/// Decode container bytes (WAV from espeak/OpenAI/Azure, MP3 from Google)
/// into a mono payload. Stereo input is averaged down to one channel.
pub fn decode_to_mono(bytes: Vec<u8>) -> Result<AudioPayload, TtsError> {
    let decoder = Decoder::new(Cursor::new(bytes))
        .map_err(|e| TtsError::synthesis(format!("Failed to decode audio: {}", e)))?;

    let source = decoder.convert_samples::<f32>();
    let channels = source.channels().max(1) as usize;
    let sample_rate = source.sample_rate();
    let interleaved: Vec<f32> = source.collect();

    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    if samples.is_empty() {
        return Err(TtsError::synthesis("Decoded audio contains no samples"));
    }

    Ok(AudioPayload::new(samples, sample_rate))
}
