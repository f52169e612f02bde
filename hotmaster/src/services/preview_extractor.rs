//! Preview Extractor
//!
//! Cuts one short clip per variant (plus the untouched target) from the same
//! region of the song. The region is the loudest analysis window of the base
//! variant; every other track reuses that window index, clamped to its own
//! window count, so all clips line up even when lengths differ slightly.

use hotmaster_common::fade::{apply_edge_fades, fade_length};
use hotmaster_common::StereoFrame;
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::engine::{dsp, EngineConfig, EngineError, MasteringEngine};
use crate::models::{BitDepth, PreviewKey, VariantKey};
use crate::storage::StorageLayout;

/// Number of analysis windows of `size` frames, `step` apart.
///
/// A track no longer than one window has exactly one window: itself.
pub fn window_count(len: usize, size: usize, step: usize) -> usize {
    if len <= size {
        1
    } else {
        (len - size) / step.max(1) + 1
    }
}

/// Frame range covered by window `index`, clamped to the last window
pub fn window_bounds(len: usize, size: usize, step: usize, index: usize) -> Range<usize> {
    if len <= size {
        return 0..len;
    }
    let index = index.min(window_count(len, size, step) - 1);
    let start = index * step.max(1);
    start..start + size
}

/// Index of the window with the highest RMS; the first one wins ties
pub fn loudest_window(frames: &[StereoFrame], size: usize, step: usize) -> usize {
    let count = window_count(frames.len(), size, step);
    let mut best = (0, f32::MIN);
    for index in 0..count {
        let level = dsp::rms(&frames[window_bounds(frames.len(), size, step, index)]);
        if level > best.1 {
            best = (index, level);
        }
    }
    best.0
}

/// Clips cut from the same window of every track
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedClips {
    /// Window chosen on the base track
    pub window_index: usize,
    pub clips: BTreeMap<PreviewKey, Vec<StereoFrame>>,
}

/// Pick the base track's loudest window and cut every track at that index.
/// Each clip is faded at both edges.
///
/// Returns `None` when `tracks` holds no variant.
pub fn select_aligned(
    tracks: &BTreeMap<PreviewKey, Vec<StereoFrame>>,
    config: &EngineConfig,
) -> Option<AlignedClips> {
    let base_key = base_track(tracks)?;
    let size = config.preview_size;
    let step = config.preview_analysis_step;
    let window_index = loudest_window(&tracks[&base_key], size, step);

    let clips = tracks
        .iter()
        .map(|(key, frames)| {
            let mut clip = frames[window_bounds(frames.len(), size, step, window_index)].to_vec();
            let fade = fade_length(clip.len(), config.preview_fade_size, config.preview_fade_coefficient);
            apply_edge_fades(&mut clip, fade, config.preview_fade_curve);
            (*key, clip)
        })
        .collect();

    Some(AlignedClips { window_index, clips })
}

/// The limited rendering if present, otherwise the first other variant.
/// The target never drives alignment.
fn base_track(tracks: &BTreeMap<PreviewKey, Vec<StereoFrame>>) -> Option<PreviewKey> {
    let limited = PreviewKey::Variant(VariantKey::Limited);
    if tracks.contains_key(&limited) {
        return Some(limited);
    }
    tracks.keys().find(|key| **key != PreviewKey::Original).copied()
}

#[derive(Clone)]
pub struct PreviewExtractor {
    engine: Arc<dyn MasteringEngine>,
    config: EngineConfig,
    layout: StorageLayout,
}

impl PreviewExtractor {
    pub fn new(engine: Arc<dyn MasteringEngine>, config: EngineConfig, layout: StorageLayout) -> Self {
        Self { engine, config, layout }
    }

    fn load(&self, path: &Path) -> Result<Vec<StereoFrame>, EngineError> {
        let audio = self.engine.load(path)?;
        self.engine.validate(audio, &self.config)
    }

    /// Write aligned previews for one reference and return their paths.
    ///
    /// A target that fails to load yields no previews, and so does a set of
    /// variants none of which loads. A variant that fails to load is skipped.
    /// Failing to write a preview is an error.
    ///
    /// Blocking; run from `spawn_blocking`.
    pub fn extract(
        &self,
        job_id: Uuid,
        reference_index: usize,
        target: &Path,
        sources: &BTreeMap<VariantKey, PathBuf>,
    ) -> Result<BTreeMap<PreviewKey, PathBuf>, EngineError> {
        let mut tracks = BTreeMap::new();

        match self.load(target) {
            Ok(frames) => {
                tracks.insert(PreviewKey::Original, frames);
            }
            Err(e) => {
                warn!(
                    job_id = %job_id,
                    reference_index,
                    error = %e,
                    "Target could not be loaded, skipping previews"
                );
                return Ok(BTreeMap::new());
            }
        }

        for (variant, path) in sources {
            match self.load(path) {
                Ok(frames) => {
                    tracks.insert(PreviewKey::Variant(*variant), frames);
                }
                Err(e) => warn!(
                    job_id = %job_id,
                    reference_index,
                    variant = %variant,
                    error = %e,
                    "Variant could not be loaded, no preview"
                ),
            }
        }

        let Some(aligned) = select_aligned(&tracks, &self.config) else {
            warn!(job_id = %job_id, reference_index, "No variant could be loaded, skipping previews");
            return Ok(BTreeMap::new());
        };
        debug!(
            job_id = %job_id,
            reference_index,
            window_index = aligned.window_index,
            clips = aligned.clips.len(),
            "Selected preview window"
        );

        let mut written = BTreeMap::new();
        for (key, clip) in aligned.clips {
            let path = self.layout.preview_path(job_id, reference_index, key);
            self.engine
                .save(&path, &clip, self.config.internal_sample_rate, BitDepth::Pcm16)?;
            written.insert(key, path);
        }
        Ok(written)
    }
}
