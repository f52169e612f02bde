//! Audio decoding
//!
//! Uses symphonia for format-agnostic decoding (WAV, FLAC, MP3, AIFF, OGG, AAC).
//! Channels are kept interleaved; down/up-mixing happens in validation.

use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::{AudioData, EngineError};

/// Decode a whole file into interleaved f32 samples
pub fn decode_file(file_path: &Path) -> Result<AudioData, EngineError> {
    tracing::debug!(path = %file_path.display(), "Decoding audio file");

    let file = std::fs::File::open(file_path).map_err(|e| {
        EngineError::Load(format!("Failed to open {}: {}", file_path.display(), e))
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = file_path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| EngineError::Load(format!("Failed to probe {}: {}", file_path.display(), e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| EngineError::Load(format!("No audio track in {}", file_path.display())))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track.codec_params.channels.map(|c| c.count());

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| {
            EngineError::Load(format!("Unsupported codec in {}: {}", file_path.display(), e))
        })?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut buf_frames = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => {
                return Err(EngineError::Load(format!("Error reading packet: {}", e)));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                // A corrupt packet is skipped, the rest of the stream is usable
                tracing::warn!(path = %file_path.display(), error = %e, "Skipping undecodable packet");
                continue;
            }
            Err(e) => {
                return Err(EngineError::Load(format!(
                    "Failed to decode {}: {}",
                    file_path.display(),
                    e
                )));
            }
        };

        let spec = *decoded.spec();
        sample_rate.get_or_insert(spec.rate);
        channels.get_or_insert(spec.channels.count());

        // Grow the scratch buffer if a packet is larger than any seen so far
        if buf_frames < decoded.capacity() {
            buf_frames = decoded.capacity();
            sample_buf = Some(SampleBuffer::<f32>::new(buf_frames as u64, spec));
        }
        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    let sample_rate = sample_rate
        .ok_or_else(|| EngineError::Load(format!("Sample rate unknown: {}", file_path.display())))?;
    let channels = channels
        .ok_or_else(|| EngineError::Load(format!("Channel layout unknown: {}", file_path.display())))?;

    tracing::debug!(
        path = %file_path.display(),
        sample_rate,
        channels,
        total_samples = samples.len(),
        "Audio decoding complete"
    );

    Ok(AudioData {
        samples,
        channels,
        sample_rate,
    })
}
