//! Box array core types
//!
//! Contains the rectangle record, the slot variant used for sparse arrays and
//! the error type shared by every box array operation.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

// ============================================================
// Error Types
// ============================================================

/// Box array error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoxError {
    #[error("No valid boxes in input")]
    EmptyInput,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Index {index} out of bounds for box array of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, BoxError>;

// ============================================================
// Core Data Structures
// ============================================================

/// Box dimension selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Width,
    Height,
}

impl Dimension {
    /// Short lowercase name, used in logs and reports
    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Width => "width",
            Dimension::Height => "height",
        }
    }
}

/// Axis-aligned rectangle in pixel units
///
/// Immutable once created; the `with_*` methods return a resized copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    x: i32,
    y: i32,
    w: u32,
    h: u32,
}

impl BoundingBox {
    /// Create a new box
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn width(&self) -> u32 {
        self.w
    }

    pub fn height(&self) -> u32 {
        self.h
    }

    /// Right edge (exclusive)
    pub fn right(&self) -> i64 {
        self.x as i64 + self.w as i64
    }

    /// Bottom edge (exclusive)
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.h as i64
    }

    /// Calculate area
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    /// Extent along the given dimension
    pub fn dimension(&self, dim: Dimension) -> u32 {
        match dim {
            Dimension::Width => self.w,
            Dimension::Height => self.h,
        }
    }

    /// Copy with the right edge moved so the width becomes `w`
    #[must_use]
    pub fn with_width(&self, w: u32) -> Self {
        Self { w, ..*self }
    }

    /// Copy with the bottom edge moved so the height becomes `h`
    #[must_use]
    pub fn with_height(&self, h: u32) -> Self {
        Self { h, ..*self }
    }

    /// Copy with the trailing side of `dim` moved
    #[must_use]
    pub fn with_dimension(&self, dim: Dimension, value: u32) -> Self {
        match dim {
            Dimension::Width => self.with_width(value),
            Dimension::Height => self.with_height(value),
        }
    }
}

/// One position in a box array
///
/// `Missing` marks a detection gap; the position still counts for ordering.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BoxSlot {
    Valid(Arc<BoundingBox>),
    #[default]
    Missing,
}

impl BoxSlot {
    /// Wrap a box in a fresh shared handle
    pub fn valid(b: BoundingBox) -> Self {
        BoxSlot::Valid(Arc::new(b))
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, BoxSlot::Valid(_))
    }

    pub fn as_box(&self) -> Option<&BoundingBox> {
        match self {
            BoxSlot::Valid(b) => Some(b.as_ref()),
            BoxSlot::Missing => None,
        }
    }

    /// True when both slots hold the same shared box (not merely equal ones)
    pub fn shares_with(&self, other: &BoxSlot) -> bool {
        match (self, other) {
            (BoxSlot::Valid(a), BoxSlot::Valid(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<BoundingBox> for BoxSlot {
    fn from(b: BoundingBox) -> Self {
        BoxSlot::valid(b)
    }
}

impl From<Option<BoundingBox>> for BoxSlot {
    fn from(b: Option<BoundingBox>) -> Self {
        b.map_or(BoxSlot::Missing, BoxSlot::valid)
    }
}
