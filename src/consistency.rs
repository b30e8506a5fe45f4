//! Size consistency evaluation
//!
//! Measures how much box widths and heights vary within an array, either
//! between neighbouring boxes or against the array median. The result is a
//! diagnostic; it does not feed the reconciler.

use serde::{Deserialize, Serialize};

use crate::boxa::{BoundingBox, BoxArray, Dimension};
use crate::stats::median_sizes;

/// Reference used when measuring deviation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyMode {
    /// `|a - b| / mean(a, b)` over consecutive valid boxes
    #[default]
    Pairwise,
    /// `|v - median| / median` over all valid boxes
    Median,
}

/// Average fractional deviation per dimension
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SizeDeviation {
    pub width: f64,
    pub height: f64,
}

/// Verdict on whether a dimension is uniform across the array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeUniformity {
    /// Both deviations below their thresholds
    Same,
    /// Both deviations above their thresholds
    Different,
    /// The two measures disagree
    Undetermined,
}

/// Both deviation measures and the resulting verdicts
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UniformityReport {
    pub pairwise: SizeDeviation,
    pub median: SizeDeviation,
    pub width: SizeUniformity,
    pub height: SizeUniformity,
}

/// Evaluate size consistency of the valid boxes
///
/// Returns zero deviation when fewer than two valid boxes exist.
pub fn evaluate_size_consistency(boxes: &BoxArray, mode: ConsistencyMode) -> SizeDeviation {
    if boxes.valid_count() < 2 {
        return SizeDeviation::default();
    }

    match mode {
        ConsistencyMode::Pairwise => SizeDeviation {
            width: pairwise_deviation(boxes, Dimension::Width),
            height: pairwise_deviation(boxes, Dimension::Height),
        },
        ConsistencyMode::Median => match median_sizes(boxes) {
            Ok((med_w, med_h)) => SizeDeviation {
                width: median_deviation(boxes, Dimension::Width, med_w),
                height: median_deviation(boxes, Dimension::Height, med_h),
            },
            Err(_) => SizeDeviation::default(),
        },
    }
}

/// Classify width and height uniformity from both deviation measures
pub fn size_uniformity(
    boxes: &BoxArray,
    pair_threshold: f64,
    median_threshold: f64,
) -> UniformityReport {
    let pairwise = evaluate_size_consistency(boxes, ConsistencyMode::Pairwise);
    let median = evaluate_size_consistency(boxes, ConsistencyMode::Median);

    let verdict = |p: f64, m: f64| {
        if p < pair_threshold && m < median_threshold {
            SizeUniformity::Same
        } else if p > pair_threshold && m > median_threshold {
            SizeUniformity::Different
        } else {
            SizeUniformity::Undetermined
        }
    };

    UniformityReport {
        pairwise,
        median,
        width: verdict(pairwise.width, median.width),
        height: verdict(pairwise.height, median.height),
    }
}

fn pairwise_deviation(boxes: &BoxArray, dim: Dimension) -> f64 {
    let valid: Vec<&BoundingBox> = boxes.iter_valid().map(|(_, b)| b).collect();

    let ratios: Vec<f64> = valid
        .windows(2)
        .filter_map(|pair| {
            let a = pair[0].dimension(dim) as f64;
            let b = pair[1].dimension(dim) as f64;
            let mean = (a + b) / 2.0;
            (mean > 0.0).then(|| (a - b).abs() / mean)
        })
        .collect();

    average(&ratios)
}

fn median_deviation(boxes: &BoxArray, dim: Dimension, median: f64) -> f64 {
    if median <= 0.0 {
        return 0.0;
    }
    let ratios: Vec<f64> = boxes
        .iter_valid()
        .map(|(_, b)| (b.dimension(dim) as f64 - median).abs() / median)
        .collect();
    average(&ratios)
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
