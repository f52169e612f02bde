//! Signal helpers used by the bundled engine and the preview extractor

use hotmaster_common::{LimiterConfig, StereoFrame};

/// Smallest level treated as non-silent
pub const EPSILON: f32 = 1e-9;

/// Root mean square over every sample of every channel
pub fn rms(frames: &[StereoFrame]) -> f32 {
    if frames.is_empty() {
        return 0.0;
    }
    let sum: f64 = frames
        .iter()
        .map(|[l, r]| (*l as f64) * (*l as f64) + (*r as f64) * (*r as f64))
        .sum();
    (sum / (frames.len() * 2) as f64).sqrt() as f32
}

/// Largest absolute sample value
pub fn peak(frames: &[StereoFrame]) -> f32 {
    frames
        .iter()
        .map(|[l, r]| l.abs().max(r.abs()))
        .fold(0.0, f32::max)
}

pub fn scale(frames: &mut [StereoFrame], gain: f32) {
    for frame in frames.iter_mut() {
        frame[0] *= gain;
        frame[1] *= gain;
    }
}

/// Scale so the peak sits exactly at `ceiling`. Silence is left alone.
pub fn normalize_peak(frames: &mut [StereoFrame], ceiling: f32) {
    let current = peak(frames);
    if current > EPSILON {
        scale(frames, ceiling / current);
    }
}

/// One-pole smoothing coefficient for a time constant in milliseconds
fn time_coefficient(ms: f64, sample_rate: u32) -> f32 {
    let samples = ms / 1000.0 * sample_rate as f64;
    if samples <= 0.0 {
        0.0
    } else {
        (-1.0 / samples).exp() as f32
    }
}

/// Peak limiter with attack/hold/release gain smoothing.
///
/// The gain envelope follows the limiter timing; a final clamp guarantees no
/// sample exceeds `threshold` even while the attack is still settling.
pub fn limit(frames: &mut [StereoFrame], threshold: f32, limiter: &LimiterConfig, sample_rate: u32) {
    let attack = time_coefficient(limiter.attack, sample_rate);
    let release = time_coefficient(limiter.release, sample_rate);
    let hold_frames = (limiter.hold.max(0.0) / 1000.0 * sample_rate as f64) as usize;

    let mut gain = 1.0f32;
    let mut held = 0usize;

    for frame in frames.iter_mut() {
        let level = frame[0].abs().max(frame[1].abs());
        let wanted = if level > threshold { threshold / level } else { 1.0 };

        if wanted < gain {
            gain = attack * gain + (1.0 - attack) * wanted;
            held = hold_frames;
        } else if held > 0 {
            held -= 1;
        } else {
            gain = release * gain + (1.0 - release) * wanted;
        }

        for sample in frame.iter_mut() {
            *sample = (*sample * gain).clamp(-threshold, threshold);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms_of_constant_signal() {
        let frames = vec![[0.5, -0.5]; 100];
        assert!((rms(&frames) - 0.5).abs() < 1e-6);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn test_normalize_peak() {
        let mut frames = vec![[0.1, -0.2], [0.05, 0.0]];
        normalize_peak(&mut frames, 0.9);
        assert!((peak(&frames) - 0.9).abs() < 1e-6);

        let mut silent = vec![[0.0, 0.0]; 4];
        normalize_peak(&mut silent, 0.9);
        assert_eq!(peak(&silent), 0.0);
    }

    #[test]
    fn test_limiter_respects_threshold() {
        let mut frames: Vec<StereoFrame> = (0..44100)
            .map(|i| {
                let s = (i as f32 * 0.05).sin() * 1.8;
                [s, -s]
            })
            .collect();

        limit(&mut frames, 0.9, &LimiterConfig::default(), 44100);
        assert!(peak(&frames) <= 0.9 + 1e-6);
    }

    #[test]
    fn test_limiter_leaves_quiet_audio_untouched() {
        let original: Vec<StereoFrame> = (0..1000).map(|i| [(i as f32 * 0.1).sin() * 0.3; 2]).collect();
        let mut frames = original.clone();
        limit(&mut frames, 0.9, &LimiterConfig::default(), 44100);
        assert_eq!(frames, original);
    }
}
