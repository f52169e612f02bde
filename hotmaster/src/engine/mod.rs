//! Mastering Engine seam
//!
//! The actual mastering transform is a pluggable collaborator. The services
//! only rely on the four primitives of [`MasteringEngine`]; all of them are
//! blocking and are called from `tokio::task::spawn_blocking`.

pub mod config;
pub mod decode;
pub mod dsp;
pub mod resample;
pub mod wav;

pub use config::EngineConfig;
pub use wav::WavEngine;

use hotmaster_common::StereoFrame;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::BitDepth;

/// Engine failure; captured per reference and never retried
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to load audio: {0}")]
    Load(String),

    #[error("Audio validation failed: {0}")]
    Validation(String),

    #[error("Processing failed: {0}")]
    Process(String),

    #[error("Failed to save audio: {0}")]
    Save(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decoded audio as read from disk, before validation
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Interleaved samples, range [-1.0, 1.0]
    pub samples: Vec<f32>,
    pub channels: usize,
    pub sample_rate: u32,
}

impl AudioData {
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }
}

/// One rendering requested from [`MasteringEngine::process`]
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSpec {
    pub path: PathBuf,
    pub bit_depth: BitDepth,
    pub use_limiter: bool,
    pub normalize: bool,
}

/// Audio mastering engine
pub trait MasteringEngine: Send + Sync {
    /// Decode a file from disk
    fn load(&self, path: &Path) -> Result<AudioData, EngineError>;

    /// Bring loaded audio into the engine's working format: stereo frames at
    /// `config.internal_sample_rate`
    fn validate(&self, audio: AudioData, config: &EngineConfig) -> Result<Vec<StereoFrame>, EngineError>;

    /// Write stereo frames as PCM WAV
    fn save(
        &self,
        path: &Path,
        frames: &[StereoFrame],
        sample_rate: u32,
        bit_depth: BitDepth,
    ) -> Result<(), EngineError>;

    /// Master `target` against `reference`, writing every requested result
    fn process(
        &self,
        target: &Path,
        reference: &Path,
        results: &[ResultSpec],
        config: &EngineConfig,
    ) -> Result<(), EngineError>;
}
