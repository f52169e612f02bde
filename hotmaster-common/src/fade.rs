//! Edge fades for preview clips
//!
//! A preview is cut out of the middle of a track, so both edges get a
//! symmetric fade to avoid clicks. The fade length is the lesser of a
//! configured size and `clip_length / fade_coefficient`.

use crate::StereoFrame;
use serde::{Deserialize, Serialize};

/// Shape of the gain ramp at each clip edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// v(t) = t
    #[default]
    Linear,

    /// v(t) = 0.5 × (1 - cos(π × t))
    SCurve,
}

impl FadeCurve {
    /// Fade-in multiplier at normalized position `t` (0.0 → 1.0)
    pub fn fade_in(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => t,
            FadeCurve::SCurve => 0.5 * (1.0 - (std::f32::consts::PI * t).cos()),
        }
    }

    /// Fade-out multiplier at normalized position `t` (1.0 → 0.0)
    pub fn fade_out(&self, position: f32) -> f32 {
        self.fade_in(1.0 - position.clamp(0.0, 1.0))
    }
}

/// Fade length in frames for a clip of `clip_len` frames
pub fn fade_length(clip_len: usize, fade_size: usize, fade_coefficient: usize) -> usize {
    let proportional = clip_len / fade_coefficient.max(1);
    fade_size.min(proportional)
}

/// Apply a fade-in over the first `fade_len` frames and a fade-out over the
/// last `fade_len` frames. The first and last frames end up silent.
///
/// `fade_len == 0` leaves the clip untouched.
pub fn apply_edge_fades(frames: &mut [StereoFrame], fade_len: usize, curve: FadeCurve) {
    let fade_len = fade_len.min(frames.len());
    if fade_len == 0 {
        return;
    }

    let span = fade_len.saturating_sub(1).max(1) as f32;
    let total = frames.len();

    for i in 0..fade_len {
        let position = if fade_len == 1 { 0.0 } else { i as f32 / span };

        let gain_in = curve.fade_in(position);
        for sample in frames[i].iter_mut() {
            *sample *= gain_in;
        }

        let gain_out = curve.fade_out(position);
        for sample in frames[total - fade_len + i].iter_mut() {
            *sample *= gain_out;
        }
    }
}
