//! Sample rate conversion using rubato

use rubato::{FastFixedIn, PolynomialDegree, Resampler};

use super::EngineError;

/// Resample interleaved audio from `input_rate` to `output_rate`.
///
/// Returns a copy when the rates already match.
pub fn resample_interleaved(
    input: &[f32],
    channels: usize,
    input_rate: u32,
    output_rate: u32,
) -> Result<Vec<f32>, EngineError> {
    if input_rate == output_rate || input.is_empty() {
        return Ok(input.to_vec());
    }
    if channels == 0 {
        return Err(EngineError::Validation("Audio has no channels".to_string()));
    }

    tracing::debug!(input_rate, output_rate, channels, "Resampling");

    let planar = deinterleave(input, channels);
    let input_frames = planar[0].len();

    let mut resampler = FastFixedIn::<f32>::new(
        output_rate as f64 / input_rate as f64,
        1.0,
        PolynomialDegree::Septic,
        input_frames,
        channels,
    )
    .map_err(|e| EngineError::Validation(format!("Failed to create resampler: {}", e)))?;

    let output = resampler
        .process(&planar, None)
        .map_err(|e| EngineError::Validation(format!("Resampling failed: {}", e)))?;

    Ok(interleave(output))
}

/// [L, R, L, R, ...] → [[L, L, ...], [R, R, ...]]
fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = samples.len() / channels;
    let mut planar = vec![Vec::with_capacity(frames); channels];
    for frame in samples.chunks_exact(channels) {
        for (ch, sample) in frame.iter().enumerate() {
            planar[ch].push(*sample);
        }
    }
    planar
}

/// [[L, L, ...], [R, R, ...]] → [L, R, L, R, ...]
fn interleave(planar: Vec<Vec<f32>>) -> Vec<f32> {
    let channels = planar.len();
    let frames = planar.first().map(|c| c.len()).unwrap_or(0);
    let mut out = Vec::with_capacity(frames * channels);
    for i in 0..frames {
        for channel in &planar {
            out.push(channel[i]);
        }
    }
    out
}
