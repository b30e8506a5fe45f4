//! Box array analysis pipeline
//!
//! Runs the full analysis on one array:
//!
//! 1. Normalize: scale the array so its extent is `target_width` wide
//! 2. Median dimensions of the normalized array
//! 3. Size consistency (configured mode) and uniformity verdicts
//! 4. Reconcile widths, heights, and both
//!
//! File-level helpers persist every intermediate array, and `run_batch`
//! processes many files in parallel.

use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use crate::boxa::{BoxArray, BoxError};
use crate::config::BoxReconConfig;
use crate::consistency::{
    evaluate_size_consistency, size_uniformity, ConsistencyMode, SizeDeviation, UniformityReport,
};
use crate::io::{self, BoxFormat, BoxIoError};
use crate::reconcile::{CheckMode, ReconcileStats, Reconciler, Reconciliation};
use crate::render::{self, RenderError};
use crate::stats::{median_dimensions, MedianDimensions};

/// Error type for the analysis pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Box array has a non-positive extent width: {0}")]
    DegenerateExtent(i64),

    #[error("Box array error: {0}")]
    Box(#[from] BoxError),

    #[error("Box array IO error: {0}")]
    BoxIo(#[from] BoxIoError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Correction counts for one check mode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileSummary {
    pub check: CheckMode,
    pub num_width_corrected: usize,
    pub num_height_corrected: usize,
    pub width_to_height_ratio: f64,
}

impl ReconcileSummary {
    fn new(check: CheckMode, stats: &ReconcileStats) -> Self {
        Self {
            check,
            num_width_corrected: stats.num_width_corrected,
            num_height_corrected: stats.num_height_corrected,
            width_to_height_ratio: stats.width_to_height_ratio,
        }
    }
}

/// Serializable summary of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSummary {
    pub input_len: usize,
    pub valid_count: usize,
    pub extent: (i64, i64),
    pub scale: f64,
    pub median_width: u32,
    pub median_height: u32,
    pub deviation_mode: ConsistencyMode,
    pub deviation: SizeDeviation,
    pub uniformity: UniformityReport,
    pub reconciled: Vec<ReconcileSummary>,
}

/// Everything produced by one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub normalized: BoxArray,
    pub medians: MedianDimensions,
    pub width: Reconciliation,
    pub height: Reconciliation,
    pub both: Reconciliation,
    pub summary: PipelineSummary,
}

impl PipelineReport {
    /// Reconciled array and stats for a check mode
    pub fn reconciliation(&self, check: CheckMode) -> &Reconciliation {
        match check {
            CheckMode::Width => &self.width,
            CheckMode::Height => &self.height,
            CheckMode::Both => &self.both,
        }
    }
}

/// Result of processing one file
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub summary: PipelineSummary,
    /// Files written, in order: normalized, width, height, both, then PNG tiles
    pub outputs: Vec<PathBuf>,
    pub elapsed_seconds: f64,
}

/// Box array analysis pipeline
#[derive(Debug, Clone, Default)]
pub struct BoxaPipeline {
    config: BoxReconConfig,
}

impl BoxaPipeline {
    pub fn new(config: BoxReconConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BoxReconConfig {
        &self.config
    }

    /// Run the analysis on an in-memory array
    pub fn run(&self, boxes: &BoxArray) -> Result<PipelineReport> {
        // Step 1: Normalize to the target width
        let extent = boxes.extent()?;
        if extent.0 <= 0 {
            return Err(PipelineError::DegenerateExtent(extent.0));
        }
        let scale = self.config.normalize.target_width / extent.0 as f64;
        let normalized = boxes.transform(0, 0, scale, scale)?;
        debug!(extent_w = extent.0, extent_h = extent.1, scale, "normalized box array");

        // Step 2: Median sizes
        let medians = median_dimensions(&normalized)?;

        // Step 3: Consistency
        let consistency = &self.config.consistency;
        let deviation = evaluate_size_consistency(&normalized, consistency.mode);
        let uniformity = size_uniformity(
            &normalized,
            consistency.pair_threshold,
            consistency.median_threshold,
        );

        // Step 4: Reconcile each dimension, then both
        let reconcile = |check: CheckMode| {
            Reconciler::new(self.config.reconcile.options(check)).run(&normalized)
        };
        let width = reconcile(CheckMode::Width)?;
        let height = reconcile(CheckMode::Height)?;
        let both = reconcile(CheckMode::Both)?;

        let summary = PipelineSummary {
            input_len: boxes.len(),
            valid_count: boxes.valid_count(),
            extent,
            scale,
            median_width: medians.width,
            median_height: medians.height,
            deviation_mode: consistency.mode,
            deviation,
            uniformity,
            reconciled: vec![
                ReconcileSummary::new(CheckMode::Width, &width.stats),
                ReconcileSummary::new(CheckMode::Height, &height.stats),
                ReconcileSummary::new(CheckMode::Both, &both.stats),
            ],
        };

        Ok(PipelineReport {
            normalized,
            medians,
            width,
            height,
            both,
            summary,
        })
    }

    /// Load, analyze and optionally persist every array of one file
    pub fn run_file(&self, input: &Path, out_dir: Option<&Path>) -> Result<FileOutcome> {
        let start_time = Instant::now();

        if !input.is_file() {
            return Err(PipelineError::InputNotFound(input.to_path_buf()));
        }

        let boxes = io::read_boxa(input)?;
        let report = self.run(&boxes)?;

        let outputs = match out_dir {
            Some(dir) => self.write_outputs(input, dir, &report)?,
            None => Vec::new(),
        };

        let elapsed = start_time.elapsed().as_secs_f64();
        info!(
            input = %input.display(),
            boxes = report.summary.input_len,
            width_corrected = report.both.stats.num_width_corrected,
            height_corrected = report.both.stats.num_height_corrected,
            "analyzed box array"
        );

        Ok(FileOutcome {
            input: input.to_path_buf(),
            summary: report.summary,
            outputs,
            elapsed_seconds: elapsed,
        })
    }

    /// Process files in parallel; results keep the input order
    pub fn run_batch(
        &self,
        inputs: &[PathBuf],
        out_dir: Option<&Path>,
    ) -> Vec<(PathBuf, Result<FileOutcome>)> {
        inputs
            .par_iter()
            .map(|input| (input.clone(), self.run_file(input, out_dir)))
            .collect()
    }

    fn write_outputs(&self, input: &Path, dir: &Path, report: &PipelineReport) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let stem = input
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let ext = BoxFormat::from_path(input).extension();

        let arrays = [
            ("normalized", &report.normalized),
            ("width", &report.width.boxes),
            ("height", &report.height.boxes),
            ("both", &report.both.boxes),
        ];

        let mut outputs = Vec::with_capacity(arrays.len() * 2);
        for (label, boxes) in arrays {
            let path = dir.join(format!("{}.{}.{}", stem, label, ext));
            io::write_boxa(&path, boxes)?;
            outputs.push(path);
        }

        if self.config.render.enabled {
            let tiles = self.config.render.tile_options();
            for (label, boxes) in arrays {
                let path = dir.join(format!("{}.{}.png", stem, label));
                render::save_tiled_png(boxes, &tiles, &path)?;
                outputs.push(path);
            }
        }

        Ok(outputs)
    }
}
