//! Box size reconciliation
//!
//! Finds boxes whose width or height is far from the array median and moves
//! their trailing side so the dimension falls back inside a tolerance band
//! around the median. Works on sequences where most boxes are expected to
//! have similar size (words on a line, pages of a book).
//!
//! # Algorithm
//!
//! 1. Compute median width and height over the valid boxes
//! 2. For each checked dimension, flag boxes with `|v - median| / median > thresh_factor`
//! 3. Clamp flagged values to `[median / size_factor, median * size_factor]`,
//!    widened to include the two middle values so the median does not move
//! 4. Move only the right (width) or bottom (height) edge; the origin is kept
//!
//! Unflagged boxes and missing slots are shared with the input array.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::boxa::{BoxArray, BoxError, BoxSlot, Dimension, Result};

// ============================================================
// Constants
// ============================================================

/// Default fractional deviation above which a box is corrected
pub const DEFAULT_THRESH_FACTOR: f64 = 0.05;

/// Default multiplicative tolerance band around the median
pub const DEFAULT_SIZE_FACTOR: f64 = 1.03;

/// Smallest allowed size factor (no tolerance band)
pub const MIN_SIZE_FACTOR: f64 = 1.0;

// ============================================================
// Options
// ============================================================

/// Which dimensions to check and correct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckMode {
    Width,
    Height,
    #[default]
    Both,
}

impl CheckMode {
    /// Dimensions covered by this mode
    pub fn dimensions(&self) -> &'static [Dimension] {
        match self {
            CheckMode::Width => &[Dimension::Width],
            CheckMode::Height => &[Dimension::Height],
            CheckMode::Both => &[Dimension::Width, Dimension::Height],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CheckMode::Width => "width",
            CheckMode::Height => "height",
            CheckMode::Both => "both",
        }
    }
}

/// Reconciliation options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconcileOptions {
    /// Dimensions to check
    pub check: CheckMode,
    /// Fractional deviation from the median that marks a box anomalous (default: 0.05)
    pub thresh_factor: f64,
    /// Corrected values stay within `[median / f, median * f]` (default: 1.03)
    pub size_factor: f64,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            check: CheckMode::default(),
            thresh_factor: DEFAULT_THRESH_FACTOR,
            size_factor: DEFAULT_SIZE_FACTOR,
        }
    }
}

impl ReconcileOptions {
    /// Create a new options builder
    pub fn builder() -> ReconcileOptionsBuilder {
        ReconcileOptionsBuilder::default()
    }

    /// Check that both factors are usable
    pub fn validate(&self) -> Result<()> {
        if !self.thresh_factor.is_finite() || self.thresh_factor < 0.0 {
            return Err(BoxError::InvalidParameter(format!(
                "thresh_factor must be finite and >= 0, got {}",
                self.thresh_factor
            )));
        }
        if !self.size_factor.is_finite() || self.size_factor < MIN_SIZE_FACTOR {
            return Err(BoxError::InvalidParameter(format!(
                "size_factor must be finite and >= {}, got {}",
                MIN_SIZE_FACTOR, self.size_factor
            )));
        }
        Ok(())
    }
}

/// Builder for ReconcileOptions
#[derive(Debug, Default)]
pub struct ReconcileOptionsBuilder {
    options: ReconcileOptions,
}

impl ReconcileOptionsBuilder {
    /// Set dimensions to check
    #[must_use]
    pub fn check(mut self, check: CheckMode) -> Self {
        self.options.check = check;
        self
    }

    /// Set deviation threshold (clamped to >= 0)
    #[must_use]
    pub fn thresh_factor(mut self, factor: f64) -> Self {
        self.options.thresh_factor = factor.max(0.0);
        self
    }

    /// Set tolerance band factor (clamped to >= 1)
    #[must_use]
    pub fn size_factor(mut self, factor: f64) -> Self {
        self.options.size_factor = factor.max(MIN_SIZE_FACTOR);
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> ReconcileOptions {
        self.options
    }
}

// ============================================================
// Results
// ============================================================

/// What a reconciliation pass changed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileStats {
    /// Boxes whose width was changed
    pub num_width_corrected: usize,
    /// Boxes whose height was changed
    pub num_height_corrected: usize,
    /// Median width divided by median height (0.0 when undefined)
    pub width_to_height_ratio: f64,
    /// Per slot: `w - median` for boxes flagged on width, 0.0 otherwise
    pub width_deltas: Vec<f64>,
    /// Per slot: `h - median` for boxes flagged on height, 0.0 otherwise
    pub height_deltas: Vec<f64>,
}

impl ReconcileStats {
    fn unchanged(len: usize, width_to_height_ratio: f64) -> Self {
        Self {
            num_width_corrected: 0,
            num_height_corrected: 0,
            width_to_height_ratio,
            width_deltas: vec![0.0; len],
            height_deltas: vec![0.0; len],
        }
    }

    /// Total number of corrected sides
    pub fn total_corrected(&self) -> usize {
        self.num_width_corrected + self.num_height_corrected
    }

    fn record(&mut self, dim: Dimension, index: usize, delta: f64, changed: bool) {
        let (deltas, count) = match dim {
            Dimension::Width => (&mut self.width_deltas, &mut self.num_width_corrected),
            Dimension::Height => (&mut self.height_deltas, &mut self.num_height_corrected),
        };
        deltas[index] = delta;
        if changed {
            *count += 1;
        }
    }
}

/// Reconciled array with statistics
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub boxes: BoxArray,
    pub stats: ReconcileStats,
}

// ============================================================
// Reconciler
// ============================================================

/// Median-based box size reconciler
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    options: ReconcileOptions,
}

impl Reconciler {
    pub fn new(options: ReconcileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Reconcile box sizes against the array median
    ///
    /// # Errors
    /// `EmptyInput` for an array with no slots at all, `InvalidParameter` for
    /// unusable factors. Arrays with fewer than two valid boxes are returned
    /// unchanged.
    pub fn run(&self, boxes: &BoxArray) -> Result<Reconciliation> {
        self.options.validate()?;
        if boxes.is_empty() {
            return Err(BoxError::EmptyInput);
        }

        if boxes.valid_count() < 2 {
            let ratio = boxes
                .iter_valid()
                .next()
                .map_or(0.0, |(_, b)| width_height_ratio(b.width() as f64, b.height() as f64));
            debug!(
                valid = boxes.valid_count(),
                "too few valid boxes for a reliable median, returning input unchanged"
            );
            return Ok(Reconciliation {
                boxes: boxes.clone(),
                stats: ReconcileStats::unchanged(boxes.len(), ratio),
            });
        }

        let (pair_w, pair_h) = match (
            middle_pair(boxes, Dimension::Width),
            middle_pair(boxes, Dimension::Height),
        ) {
            (Some(w), Some(h)) => (w, h),
            _ => return Err(BoxError::EmptyInput),
        };
        let (med_w, med_h) = (pair_median(pair_w), pair_median(pair_h));
        let mut stats = ReconcileStats::unchanged(boxes.len(), width_height_ratio(med_w, med_h));

        let checks: Vec<(Dimension, f64, (u32, u32))> = self
            .options
            .check
            .dimensions()
            .iter()
            .filter_map(|&dim| {
                let (median, pair) = match dim {
                    Dimension::Width => (med_w, pair_w),
                    Dimension::Height => (med_h, pair_h),
                };
                if median <= 0.0 {
                    warn!(dimension = dim.name(), "median is zero, skipping correction");
                    return None;
                }
                Some((dim, median, correction_bounds(median, self.options.size_factor, pair)))
            })
            .collect();

        let mut slots = Vec::with_capacity(boxes.len());
        for (index, slot) in boxes.slots().iter().enumerate() {
            let Some(original) = slot.as_box() else {
                slots.push(BoxSlot::Missing);
                continue;
            };

            let mut corrected = *original;
            for &(dim, median, (lo, hi)) in &checks {
                let value = original.dimension(dim);
                let delta = value as f64 - median;
                if delta.abs() / median <= self.options.thresh_factor {
                    continue;
                }

                let fixed = value.clamp(lo, hi);
                stats.record(dim, index, delta, fixed != value);
                if fixed != value {
                    trace!(index, dimension = dim.name(), from = value, to = fixed, "corrected box");
                    corrected = corrected.with_dimension(dim, fixed);
                }
            }

            if corrected == *original {
                slots.push(slot.clone());
            } else {
                slots.push(BoxSlot::valid(corrected));
            }
        }

        debug!(
            check = self.options.check.name(),
            median_width = med_w,
            median_height = med_h,
            width_corrected = stats.num_width_corrected,
            height_corrected = stats.num_height_corrected,
            "reconciled box sizes"
        );

        Ok(Reconciliation {
            boxes: BoxArray::new(slots),
            stats,
        })
    }
}

/// Reconcile with explicit parameters
pub fn reconcile(
    boxes: &BoxArray,
    check: CheckMode,
    thresh_factor: f64,
    size_factor: f64,
) -> Result<Reconciliation> {
    Reconciler::new(ReconcileOptions {
        check,
        thresh_factor,
        size_factor,
    })
    .run(boxes)
}

/// Integer band `[ceil(m / f), floor(m * f)]`, widened to cover the middle pair
///
/// The two middle order statistics define the median. A corrected value never
/// crosses them, so the median of the output equals the median of the input.
fn correction_bounds(median: f64, size_factor: f64, (low_mid, high_mid): (u32, u32)) -> (u32, u32) {
    let lo = (median / size_factor).ceil() as u32;
    let hi = (median * size_factor).floor() as u32;
    (lo.min(low_mid), hi.max(high_mid))
}

/// Lower and upper middle values of a dimension (equal for odd counts)
fn middle_pair(boxes: &BoxArray, dim: Dimension) -> Option<(u32, u32)> {
    let mut values: Vec<u32> = boxes.iter_valid().map(|(_, b)| b.dimension(dim)).collect();
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let n = values.len();
    Some((values[(n - 1) / 2], values[n / 2]))
}

fn pair_median((low_mid, high_mid): (u32, u32)) -> f64 {
    (low_mid as f64 + high_mid as f64) / 2.0
}

fn width_height_ratio(w: f64, h: f64) -> f64 {
    if h > 0.0 {
        w / h
    } else {
        0.0
    }
}
