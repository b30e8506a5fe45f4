//! Box array module
//!
//! Ordered, possibly sparse sequences of axis-aligned boxes, as produced by
//! line or word segmentation of a scanned page.

mod array;
mod types;

pub use array::BoxArray;
pub use types::{BoundingBox, BoxError, BoxSlot, Dimension, Result};
