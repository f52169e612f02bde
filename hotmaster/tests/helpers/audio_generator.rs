//! Audio Test Fixture Generator

use std::path::{Path, PathBuf};

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub frequency: f32,
    /// Peak level, 0.0 writes silence
    pub amplitude: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 1.0,
            sample_rate: 44100,
            channels: 2,
            frequency: 440.0,
            amplitude: 0.5,
        }
    }
}

/// Write a 16-bit sine tone whose level swells towards the middle, so the
/// loudest preview window is well defined
pub fn generate_test_wav(path: &Path, config: &AudioConfig) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let total_samples = (config.duration_seconds * config.sample_rate as f64) as usize;

    for i in 0..total_samples {
        let t = i as f32 / config.sample_rate as f32;
        let position = i as f32 / total_samples.max(1) as f32;
        let envelope = (std::f32::consts::PI * position).sin();
        let sample = (2.0 * std::f32::consts::PI * config.frequency * t).sin() * config.amplitude * envelope;
        let value = (sample * i16::MAX as f32) as i16;
        for _ in 0..config.channels {
            writer.write_sample(value)?;
        }
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}

/// Bytes of a generated WAV, for multipart uploads
pub fn test_wav_bytes(dir: &Path, name: &str, config: &AudioConfig) -> Vec<u8> {
    let path = dir.join(name);
    generate_test_wav(&path, config).unwrap();
    std::fs::read(path).unwrap()
}
