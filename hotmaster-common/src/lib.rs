//! # Hotmaster Common Library
//!
//! Shared code for the hotmaster service and its tooling:
//! - Error type
//! - Configuration loading and data folder resolution
//! - Limiter parameter model (loudness presets, overrides, validation)
//! - Fade envelopes for preview clips

pub mod config;
pub mod error;
pub mod fade;
pub mod limiter;

pub use error::{Error, Result};
pub use fade::FadeCurve;
pub use limiter::{LimiterConfig, LimiterOverrides, LimiterPreset, LoudnessPreset};

/// One stereo sample frame `[left, right]`, nominal range [-1.0, 1.0]
pub type StereoFrame = [f32; 2];
