//! Engine wrapper with scripted failures
//!
//! Delegates to [`WavEngine`] except when the reference file name asks for a
//! failure: names containing `broken` fail with a processing error, names
//! containing `panic` panic inside the engine call.

use hotmaster::engine::{AudioData, EngineConfig, EngineError, MasteringEngine, ResultSpec, WavEngine};
use hotmaster::models::BitDepth;
use hotmaster_common::StereoFrame;
use std::path::Path;

#[derive(Debug, Default)]
pub struct ScriptedEngine {
    inner: WavEngine,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MasteringEngine for ScriptedEngine {
    fn load(&self, path: &Path) -> Result<AudioData, EngineError> {
        self.inner.load(path)
    }

    fn validate(&self, audio: AudioData, config: &EngineConfig) -> Result<Vec<StereoFrame>, EngineError> {
        self.inner.validate(audio, config)
    }

    fn save(&self, path: &Path, frames: &[StereoFrame], sample_rate: u32, bit_depth: BitDepth) -> Result<(), EngineError> {
        self.inner.save(path, frames, sample_rate, bit_depth)
    }

    fn process(
        &self,
        target: &Path,
        reference: &Path,
        results: &[ResultSpec],
        config: &EngineConfig,
    ) -> Result<(), EngineError> {
        let name = reference
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if name.contains("panic") {
            panic!("scripted engine panic");
        }
        if name.contains("broken") {
            return Err(EngineError::Process("scripted failure".to_string()));
        }

        self.inner.process(target, reference, results, config)
    }
}
