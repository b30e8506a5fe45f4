//! Box array container
//!
//! Slots are shared handles, so cloning an array or carrying unchanged boxes
//! into a derived array never copies the boxes themselves.

use super::types::{BoundingBox, BoxError, BoxSlot, Result};

/// Ordered sequence of box slots
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoxArray {
    slots: Vec<BoxSlot>,
}

impl BoxArray {
    /// Create an array from slots
    pub fn new(slots: Vec<BoxSlot>) -> Self {
        Self { slots }
    }

    /// Create an array where every slot is valid
    pub fn from_boxes<I: IntoIterator<Item = BoundingBox>>(boxes: I) -> Self {
        boxes.into_iter().map(BoxSlot::valid).collect()
    }

    /// Create an array of `len` missing slots
    pub fn with_missing(len: usize) -> Self {
        Self {
            slots: vec![BoxSlot::Missing; len],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of valid slots
    pub fn valid_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_valid()).count()
    }

    /// Box at `index`, `None` when the slot is missing or out of range
    pub fn get(&self, index: usize) -> Option<&BoundingBox> {
        self.slots.get(index).and_then(BoxSlot::as_box)
    }

    pub fn slot(&self, index: usize) -> Option<&BoxSlot> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> &[BoxSlot] {
        &self.slots
    }

    /// Replace the slot at `index`; the length never changes
    pub fn set(&mut self, index: usize, slot: impl Into<BoxSlot>) -> Result<()> {
        let len = self.slots.len();
        let target = self
            .slots
            .get_mut(index)
            .ok_or(BoxError::IndexOutOfBounds { index, len })?;
        *target = slot.into();
        Ok(())
    }

    /// Valid boxes with their slot index, in order
    pub fn iter_valid(&self) -> impl Iterator<Item = (usize, &BoundingBox)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_box().map(|b| (i, b)))
    }

    /// Maximum right and bottom edge over all valid boxes
    pub fn extent(&self) -> Result<(i64, i64)> {
        self.iter_valid()
            .map(|(_, b)| (b.right(), b.bottom()))
            .reduce(|(w, h), (r, b)| (w.max(r), h.max(b)))
            .ok_or(BoxError::EmptyInput)
    }

    /// Smallest box containing every valid box
    pub fn bounding_region(&self) -> Result<BoundingBox> {
        let (min_x, min_y, max_r, max_b) = self
            .iter_valid()
            .map(|(_, b)| (b.x() as i64, b.y() as i64, b.right(), b.bottom()))
            .reduce(|a, b| (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3)))
            .ok_or(BoxError::EmptyInput)?;

        let too_large = |_| BoxError::InvalidParameter("bounding region exceeds u32".to_string());
        let w = u32::try_from(max_r - min_x).map_err(too_large)?;
        let h = u32::try_from(max_b - min_y).map_err(too_large)?;
        Ok(BoundingBox::new(min_x as i32, min_y as i32, w, h))
    }

    /// Translate by `(dx, dy)`, then scale about the origin
    ///
    /// Coordinates are rounded to the nearest pixel. A non-zero extent never
    /// rounds below one pixel. Missing slots stay missing. Results that do not
    /// fit the box field types are `InvalidParameter`.
    pub fn transform(&self, dx: i32, dy: i32, scale_x: f64, scale_y: f64) -> Result<BoxArray> {
        for (name, s) in [("scale_x", scale_x), ("scale_y", scale_y)] {
            if !s.is_finite() || s <= 0.0 {
                return Err(BoxError::InvalidParameter(format!(
                    "{} must be finite and positive, got {}",
                    name, s
                )));
            }
        }

        self.slots
            .iter()
            .map(|slot| -> Result<BoxSlot> {
                let Some(b) = slot.as_box() else {
                    return Ok(BoxSlot::Missing);
                };
                Ok(BoxSlot::valid(BoundingBox::new(
                    scale_coord("x", b.x() as f64 + dx as f64, scale_x)?,
                    scale_coord("y", b.y() as f64 + dy as f64, scale_y)?,
                    scale_extent("w", b.width(), scale_x)?,
                    scale_extent("h", b.height(), scale_y)?,
                )))
            })
            .collect()
    }
}

fn scale_coord(name: &str, v: f64, scale: f64) -> Result<i32> {
    let scaled = (v * scale).round();
    i32::try_from(scaled as i64).map_err(|_| out_of_range(name, scaled))
}

fn scale_extent(name: &str, v: u32, scale: f64) -> Result<u32> {
    if v == 0 {
        return Ok(0);
    }
    let scaled = (v as f64 * scale).round().max(1.0);
    u32::try_from(scaled as i64).map_err(|_| out_of_range(name, scaled))
}

fn out_of_range(name: &str, value: f64) -> BoxError {
    BoxError::InvalidParameter(format!("transformed {} out of range: {}", name, value))
}

impl FromIterator<BoxSlot> for BoxArray {
    fn from_iter<I: IntoIterator<Item = BoxSlot>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a BoxArray {
    type Item = &'a BoxSlot;
    type IntoIter = std::slice::Iter<'a, BoxSlot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}
