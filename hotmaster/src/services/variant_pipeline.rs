//! Variant Pipeline
//!
//! Masters one target against one reference under every loudness preset.
//! What each preset renders is declared in [`VARIANT_PLAN`]; the pipeline
//! walks that table and makes one engine call per preset.

use hotmaster_common::{LimiterOverrides, LoudnessPreset};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::engine::{EngineConfig, EngineError, MasteringEngine, ResultSpec};
use crate::models::{DownloadFormat, VariantKey};
use crate::storage::StorageLayout;

/// One file rendered under a preset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedOutput {
    pub format: DownloadFormat,
    pub use_limiter: bool,
    pub normalize: bool,
}

/// Everything rendered under one preset, in a single engine call
#[derive(Debug, Clone, Copy)]
pub struct PresetPlan {
    pub preset: LoudnessPreset,
    pub outputs: &'static [PlannedOutput],
}

const fn limited(format: DownloadFormat) -> PlannedOutput {
    PlannedOutput {
        format,
        use_limiter: true,
        normalize: true,
    }
}

pub const VARIANT_PLAN: [PresetPlan; 3] = [
    PresetPlan {
        preset: LoudnessPreset::Low,
        outputs: &[limited(DownloadFormat::Wav24Low)],
    },
    PresetPlan {
        preset: LoudnessPreset::Medium,
        outputs: &[
            limited(DownloadFormat::Wav16),
            limited(DownloadFormat::Wav24),
            PlannedOutput {
                format: DownloadFormat::Wav24Nolimiter,
                use_limiter: false,
                normalize: false,
            },
            PlannedOutput {
                format: DownloadFormat::Wav24NolimiterNormalized,
                use_limiter: false,
                normalize: true,
            },
        ],
    },
    PresetPlan {
        preset: LoudnessPreset::High,
        outputs: &[limited(DownloadFormat::Wav24High)],
    },
];

/// Files produced for one reference
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantOutputs {
    pub files: BTreeMap<DownloadFormat, PathBuf>,
}

impl VariantOutputs {
    /// Files that get a preview clip, keyed by variant
    pub fn preview_sources(&self) -> BTreeMap<VariantKey, PathBuf> {
        self.files
            .iter()
            .filter_map(|(format, path)| format.preview_variant().map(|variant| (variant, path.clone())))
            .collect()
    }
}

#[derive(Clone)]
pub struct VariantPipeline {
    engine: Arc<dyn MasteringEngine>,
    base_config: EngineConfig,
    layout: StorageLayout,
}

impl VariantPipeline {
    pub fn new(engine: Arc<dyn MasteringEngine>, base_config: EngineConfig, layout: StorageLayout) -> Self {
        Self {
            engine,
            base_config,
            layout,
        }
    }

    /// Engine configuration for `preset` after applying caller overrides
    pub fn config_for(&self, preset: LoudnessPreset, overrides: &LimiterOverrides) -> EngineConfig {
        self.base_config
            .with_preset(&preset.params().with_overrides(overrides))
    }

    /// Render every planned output. The first engine failure aborts the
    /// reference.
    ///
    /// Blocking; run from `spawn_blocking`.
    pub fn run(
        &self,
        job_id: Uuid,
        reference_index: usize,
        target: &Path,
        reference: &Path,
        overrides: &LimiterOverrides,
    ) -> Result<VariantOutputs, EngineError> {
        let mut outputs = VariantOutputs::default();

        for plan in VARIANT_PLAN.iter() {
            let results: Vec<ResultSpec> = plan
                .outputs
                .iter()
                .map(|output| ResultSpec {
                    path: self.layout.result_path(job_id, reference_index, output.format),
                    bit_depth: output.format.bit_depth(),
                    use_limiter: output.use_limiter,
                    normalize: output.normalize,
                })
                .collect();

            debug!(
                job_id = %job_id,
                reference_index,
                preset = plan.preset.as_str(),
                outputs = results.len(),
                "Mastering preset"
            );

            let config = self.config_for(plan.preset, overrides);
            self.engine.process(target, reference, &results, &config)?;

            for (output, spec) in plan.outputs.iter().zip(results) {
                outputs.files.insert(output.format, spec.path);
            }
        }

        Ok(outputs)
    }
}
