//! Bundled mastering engine
//!
//! Decodes with symphonia, resamples with rubato and writes PCM WAV with
//! hound. The target is matched to the reference loudness (RMS), then each
//! requested result is optionally limited and peak-normalized to the
//! configured ceiling.

use hotmaster_common::StereoFrame;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;
use tracing::debug;

use super::decode::decode_file;
use super::dsp;
use super::resample::resample_interleaved;
use super::{AudioData, EngineConfig, EngineError, MasteringEngine, ResultSpec};
use crate::models::BitDepth;

#[derive(Debug, Default, Clone, Copy)]
pub struct WavEngine;

impl WavEngine {
    pub fn new() -> Self {
        Self
    }

    fn load_validated(&self, path: &Path, config: &EngineConfig, role: &str) -> Result<Vec<StereoFrame>, EngineError> {
        let audio = self.load(path)?;
        self.validate(audio, config).map_err(|e| match e {
            EngineError::Validation(msg) => EngineError::Validation(format!("{}: {}", role, msg)),
            other => other,
        })
    }
}

impl MasteringEngine for WavEngine {
    fn load(&self, path: &Path) -> Result<AudioData, EngineError> {
        decode_file(path)
    }

    fn validate(&self, audio: AudioData, config: &EngineConfig) -> Result<Vec<StereoFrame>, EngineError> {
        if audio.channels == 0 || audio.channels > 2 {
            return Err(EngineError::Validation(format!(
                "Unsupported channel count: {}",
                audio.channels
            )));
        }
        if audio.frame_count() == 0 {
            return Err(EngineError::Validation("Audio is empty".to_string()));
        }

        let seconds = audio.frame_count() as f64 / audio.sample_rate.max(1) as f64;
        if seconds > config.max_length_seconds {
            return Err(EngineError::Validation(format!(
                "Audio is too long: {:.1} s (maximum {:.0} s)",
                seconds, config.max_length_seconds
            )));
        }

        let samples = resample_interleaved(
            &audio.samples,
            audio.channels,
            audio.sample_rate,
            config.internal_sample_rate,
        )?;

        let frames: Vec<StereoFrame> = if audio.channels == 1 {
            samples.iter().map(|s| [*s, *s]).collect()
        } else {
            samples.chunks_exact(2).map(|f| [f[0], f[1]]).collect()
        };

        if frames.is_empty() {
            return Err(EngineError::Validation("Audio is empty after resampling".to_string()));
        }
        Ok(frames)
    }

    fn save(
        &self,
        path: &Path,
        frames: &[StereoFrame],
        sample_rate: u32,
        bit_depth: BitDepth,
    ) -> Result<(), EngineError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let spec = WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: bit_depth.bits(),
            sample_format: SampleFormat::Int,
        };

        let mut writer = WavWriter::create(path, spec)
            .map_err(|e| EngineError::Save(format!("{}: {}", path.display(), e)))?;

        let full_scale = match bit_depth {
            BitDepth::Pcm16 => i16::MAX as f32,
            BitDepth::Pcm24 => 8_388_607.0,
        };

        for frame in frames {
            for sample in frame {
                let value = (sample.clamp(-1.0, 1.0) * full_scale).round();
                let written = match bit_depth {
                    BitDepth::Pcm16 => writer.write_sample(value as i16),
                    BitDepth::Pcm24 => writer.write_sample(value as i32),
                };
                written.map_err(|e| EngineError::Save(e.to_string()))?;
            }
        }

        writer
            .finalize()
            .map_err(|e| EngineError::Save(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }

    fn process(
        &self,
        target: &Path,
        reference: &Path,
        results: &[ResultSpec],
        config: &EngineConfig,
    ) -> Result<(), EngineError> {
        let target_frames = self.load_validated(target, config, "target")?;
        let reference_frames = self.load_validated(reference, config, "reference")?;

        let target_rms = dsp::rms(&target_frames);
        if target_rms <= dsp::EPSILON {
            return Err(EngineError::Process("Target audio is silent".to_string()));
        }
        let reference_rms = dsp::rms(&reference_frames);
        if reference_rms <= dsp::EPSILON {
            return Err(EngineError::Process("Reference audio is silent".to_string()));
        }

        let gain = reference_rms / target_rms;
        debug!(gain, target_rms, reference_rms, "Matched loudness");

        let mut matched = target_frames;
        dsp::scale(&mut matched, gain);

        let threshold = config.threshold as f32;
        for result in results {
            let mut rendered = matched.clone();
            if result.use_limiter {
                dsp::limit(&mut rendered, threshold, &config.limiter, config.internal_sample_rate);
            }
            if result.normalize {
                dsp::normalize_peak(&mut rendered, threshold);
            }
            self.save(&result.path, &rendered, config.internal_sample_rate, result.bit_depth)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_sine(path: &Path, channels: u16, sample_rate: u32, frames: usize, amplitude: f32) {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            let s = (i as f32 * 2.0 * std::f32::consts::PI * 440.0 / sample_rate as f32).sin() * amplitude;
            for _ in 0..channels {
                writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    fn audio(channels: usize, frames: usize) -> AudioData {
        AudioData {
            samples: vec![0.25; channels * frames],
            channels,
            sample_rate: 44100,
        }
    }

    #[test]
    fn test_validate_upmixes_mono() {
        let frames = WavEngine::new().validate(audio(1, 100), &EngineConfig::default()).unwrap();
        assert_eq!(frames.len(), 100);
        assert_eq!(frames[0], [0.25, 0.25]);
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let engine = WavEngine::new();
        let config = EngineConfig::default();

        assert!(matches!(engine.validate(audio(2, 0), &config), Err(EngineError::Validation(_))));
        assert!(matches!(engine.validate(audio(6, 10), &config), Err(EngineError::Validation(_))));

        let mut short_limit = config.clone();
        short_limit.max_length_seconds = 0.001;
        assert!(matches!(engine.validate(audio(2, 4410), &short_limit), Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_save_writes_requested_bit_depth() {
        let temp_dir = TempDir::new().unwrap();
        let engine = WavEngine::new();
        let frames = vec![[0.5, -0.5]; 64];

        let path16 = temp_dir.path().join("nested").join("out16.wav");
        engine.save(&path16, &frames, 44100, BitDepth::Pcm16).unwrap();
        let reader = hound::WavReader::open(&path16).unwrap();
        assert_eq!(reader.spec().bits_per_sample, 16);
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.len(), 128);

        let path24 = temp_dir.path().join("out24.wav");
        engine.save(&path24, &frames, 44100, BitDepth::Pcm24).unwrap();
        let reader = hound::WavReader::open(&path24).unwrap();
        assert_eq!(reader.spec().bits_per_sample, 24);
    }

    #[test]
    fn test_process_writes_every_result() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("target.wav");
        let reference = temp_dir.path().join("reference.wav");
        write_sine(&target, 2, 44100, 22050, 0.1);
        write_sine(&reference, 1, 44100, 22050, 0.8);

        let results = vec![
            ResultSpec {
                path: temp_dir.path().join("limited.wav"),
                bit_depth: BitDepth::Pcm16,
                use_limiter: true,
                normalize: true,
            },
            ResultSpec {
                path: temp_dir.path().join("raw.wav"),
                bit_depth: BitDepth::Pcm24,
                use_limiter: false,
                normalize: false,
            },
        ];

        WavEngine::new()
            .process(&target, &reference, &results, &EngineConfig::default())
            .unwrap();

        for result in &results {
            assert!(result.path.exists(), "missing {}", result.path.display());
        }
    }

    #[test]
    fn test_process_rejects_silent_target() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("silent.wav");
        let reference = temp_dir.path().join("reference.wav");
        write_sine(&target, 2, 44100, 4410, 0.0);
        write_sine(&reference, 2, 44100, 4410, 0.5);

        let err = WavEngine::new()
            .process(&target, &reference, &[], &EngineConfig::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::Process(_)));
    }
}
