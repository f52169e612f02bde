//! Engine configuration
//!
//! Lengths are stored in frames at the internal sample rate.

use hotmaster_common::config::{EngineSettings, PreviewSettings};
use hotmaster_common::limiter::DEFAULT_THRESHOLD;
use hotmaster_common::{FadeCurve, LimiterConfig, LimiterPreset};

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub internal_sample_rate: u32,
    pub max_length_seconds: f64,
    /// Output ceiling used by the limiter and by peak normalization
    pub threshold: f64,
    pub limiter: LimiterConfig,
    /// Preview clip length
    pub preview_size: usize,
    /// Hop between candidate preview windows
    pub preview_analysis_step: usize,
    /// Upper bound for the fade at each preview edge
    pub preview_fade_size: usize,
    /// The fade never exceeds clip length divided by this value
    pub preview_fade_coefficient: usize,
    pub preview_fade_curve: FadeCurve,
}

impl EngineConfig {
    pub fn from_settings(engine: &EngineSettings, preview: &PreviewSettings) -> Self {
        let rate = engine.internal_sample_rate;
        let frames = |seconds: f64| (seconds.max(0.0) * rate as f64).round() as usize;

        Self {
            internal_sample_rate: rate,
            max_length_seconds: engine.max_length_seconds,
            threshold: DEFAULT_THRESHOLD,
            limiter: LimiterConfig::default(),
            preview_size: frames(preview.size_seconds).max(1),
            preview_analysis_step: frames(preview.analysis_step_seconds).max(1),
            preview_fade_size: frames(preview.fade_seconds),
            preview_fade_coefficient: preview.fade_coefficient.max(1) as usize,
            preview_fade_curve: preview.fade_curve,
        }
    }

    /// Copy of this configuration driven by `preset`'s limiter and threshold
    pub fn with_preset(&self, preset: &LimiterPreset) -> Self {
        Self {
            limiter: preset.limiter,
            threshold: preset.threshold,
            ..self.clone()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_settings(&EngineSettings::default(), &PreviewSettings::default())
    }
}
