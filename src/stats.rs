//! Dimension statistics for box arrays
//!
//! Medians are used as the reference size throughout the crate: a single
//! abnormally large or small box must not move the value the other boxes are
//! compared against.

use serde::Serialize;

use crate::boxa::{BoxArray, BoxError, Result};

/// Median sizes of a box array
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedianDimensions {
    /// Median width, rounded to the nearest pixel
    pub width: u32,
    /// Median height, rounded to the nearest pixel
    pub height: u32,
    /// Median width of valid boxes at even slot indices
    pub width_even: Option<u32>,
    /// Median width of valid boxes at odd slot indices
    pub width_odd: Option<u32>,
    /// Median height of valid boxes at even slot indices
    pub height_even: Option<u32>,
    /// Median height of valid boxes at odd slot indices
    pub height_odd: Option<u32>,
    /// `w - width` for every valid box, in order
    pub width_deltas: Vec<i64>,
    /// `h - height` for every valid box, in order
    pub height_deltas: Vec<i64>,
}

/// Median of `values`; even counts average the two middle values
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Exact median width and height over valid boxes
pub fn median_sizes(boxes: &BoxArray) -> Result<(f64, f64)> {
    let (widths, heights) = valid_sizes(boxes, |_| true);
    match (median(&widths), median(&heights)) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(BoxError::EmptyInput),
    }
}

/// Mean width and height over valid boxes
pub fn mean_sizes(boxes: &BoxArray) -> Result<(f64, f64)> {
    let (widths, heights) = valid_sizes(boxes, |_| true);
    if widths.is_empty() {
        return Err(BoxError::EmptyInput);
    }
    let n = widths.len() as f64;
    Ok((widths.iter().sum::<f64>() / n, heights.iter().sum::<f64>() / n))
}

/// Median dimensions, even/odd medians and per-box deltas
pub fn median_dimensions(boxes: &BoxArray) -> Result<MedianDimensions> {
    let (med_w, med_h) = median_sizes(boxes)?;

    let (even_w, even_h) = valid_sizes(boxes, |i| i % 2 == 0);
    let (odd_w, odd_h) = valid_sizes(boxes, |i| i % 2 == 1);

    let width = round_px(med_w);
    let height = round_px(med_h);

    Ok(MedianDimensions {
        width,
        height,
        width_even: median(&even_w).map(round_px),
        width_odd: median(&odd_w).map(round_px),
        height_even: median(&even_h).map(round_px),
        height_odd: median(&odd_h).map(round_px),
        width_deltas: boxes
            .iter_valid()
            .map(|(_, b)| b.width() as i64 - width as i64)
            .collect(),
        height_deltas: boxes
            .iter_valid()
            .map(|(_, b)| b.height() as i64 - height as i64)
            .collect(),
    })
}

fn valid_sizes(boxes: &BoxArray, keep: impl Fn(usize) -> bool) -> (Vec<f64>, Vec<f64>) {
    boxes
        .iter_valid()
        .filter(|(i, _)| keep(*i))
        .map(|(_, b)| (b.width() as f64, b.height() as f64))
        .unzip()
}

fn round_px(v: f64) -> u32 {
    v.round() as u32
}
