//! Rectangular placement items.

use u_rack_core::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A cross-section to be mounted on a tier.
///
/// The `id` is the index of the rectangle in the optimizer's input list and
/// is what containers and chromosomes refer to.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rectangle {
    /// Index into the input list.
    pub id: usize,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Rectangle {
    /// Creates a new rectangle.
    pub fn new(id: usize, width: f64, height: f64) -> Self {
        Self { id, width, height }
    }

    /// Returns the area.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Checks that both dimensions are finite and positive.
    pub fn validate(&self) -> Result<()> {
        if !self.width.is_finite() || self.width <= 0.0 {
            return Err(Error::InvalidRectangle {
                id: self.id,
                reason: format!("width must be positive, got {}", self.width),
            });
        }
        if !self.height.is_finite() || self.height <= 0.0 {
            return Err(Error::InvalidRectangle {
                id: self.id,
                reason: format!("height must be positive, got {}", self.height),
            });
        }
        Ok(())
    }
}

/// Builds the indexed rectangle set from `(width, height)` pairs.
pub fn rectangles_from_dims(dims: &[(f64, f64)]) -> Result<Vec<Rectangle>> {
    if dims.is_empty() {
        return Err(Error::InvalidConfig(
            "at least one rectangle is required".into(),
        ));
    }

    dims.iter()
        .enumerate()
        .map(|(id, &(width, height))| {
            let rect = Rectangle::new(id, width, height);
            rect.validate()?;
            Ok(rect)
        })
        .collect()
}

/// Returns true if the open intervals `[a_start, a_start + a_width)` and
/// `[b_start, b_start + b_width)` share any length.
pub fn spans_overlap(a_start: f64, a_width: f64, b_start: f64, b_width: f64) -> bool {
    !(a_start + a_width <= b_start || a_start >= b_start + b_width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_area() {
        let rect = Rectangle::new(0, 4.0, 3.0);
        assert!((rect.area() - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_rectangle_validation() {
        assert!(Rectangle::new(0, 1.0, 1.0).validate().is_ok());
        assert!(Rectangle::new(1, 0.0, 1.0).validate().is_err());
        assert!(Rectangle::new(2, 1.0, -2.0).validate().is_err());
        assert!(Rectangle::new(3, f64::NAN, 1.0).validate().is_err());
        assert!(Rectangle::new(4, 1.0, f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_rectangles_from_dims() {
        let rects = rectangles_from_dims(&[(4.0, 3.0), (2.0, 5.0)]).unwrap();
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[1].id, 1);
        assert_eq!(rects[1].height, 5.0);

        assert!(rectangles_from_dims(&[]).is_err());
        match rectangles_from_dims(&[(1.0, 1.0), (0.0, 1.0)]) {
            Err(Error::InvalidRectangle { id, .. }) => assert_eq!(id, 1),
            other => panic!("expected InvalidRectangle, got {:?}", other),
        }
    }

    #[test]
    fn test_spans_overlap() {
        assert!(spans_overlap(0.0, 3.0, 2.0, 3.0));
        assert!(spans_overlap(1.0, 1.0, 0.0, 5.0));
        // Touching edges do not overlap
        assert!(!spans_overlap(0.0, 3.0, 3.0, 2.0));
        assert!(!spans_overlap(5.0, 1.0, 0.0, 5.0));
    }
}
