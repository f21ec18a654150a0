//! Axis-aligned integer geometry
//!
//! Bounds are inclusive on both ends: a box from 0 to 79 is 80 units wide.

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// A 2D integer point in world units
pub type Point = IVec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl BoundingBox {
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        debug_assert!(min_x <= max_x && min_y <= max_y);
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Box covering a `w` x `h` rectangle whose top-left corner is at (x, y)
    pub fn from_size(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self::new(x, y, x + w - 1, y + h - 1)
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.max_x - self.min_x + 1
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.max_y - self.min_y + 1
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    /// Whether `other` lies entirely inside this box
    pub fn encloses(&self, other: &BoundingBox) -> bool {
        self.contains(other.min_x, other.min_y) && self.contains(other.max_x, other.max_y)
    }

    /// Two boxes overlap when their ranges intersect on both axes
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// Geometric center, rounding toward the max corner on even sizes
    pub fn center(&self) -> Point {
        Point::new(
            self.min_x + self.width() / 2,
            self.min_y + self.height() / 2,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_inclusive() {
        let b = BoundingBox::new(0, 0, 79, 29);
        assert!(b.contains(0, 0));
        assert!(b.contains(79, 29));
        assert!(!b.contains(80, 0));
        assert!(!b.contains(0, -1));
        assert_eq!(b.width(), 80);
        assert_eq!(b.height(), 30);
    }

    #[test]
    fn test_overlaps_touching_and_disjoint() {
        let a = BoundingBox::from_size(0, 0, 4, 4);
        assert!(a.overlaps(&BoundingBox::from_size(3, 3, 4, 4)));
        assert!(!a.overlaps(&BoundingBox::from_size(4, 0, 4, 4)));
        assert!(!a.overlaps(&BoundingBox::from_size(0, 4, 4, 4)));
    }

    #[test]
    fn test_overlaps_cross_shape() {
        // No corner of either box lies inside the other
        let horizontal = BoundingBox::new(0, 4, 10, 5);
        let vertical = BoundingBox::new(4, 0, 5, 10);
        assert!(horizontal.overlaps(&vertical));
        assert!(vertical.overlaps(&horizontal));
    }

    #[test]
    fn test_center() {
        assert_eq!(BoundingBox::new(0, 0, 79, 29).center(), Point::new(40, 15));
        assert_eq!(BoundingBox::new(10, 10, 12, 12).center(), Point::new(11, 11));
    }

    #[test]
    fn test_encloses() {
        let outer = BoundingBox::new(0, 0, 9, 9);
        assert!(outer.encloses(&BoundingBox::from_size(8, 8, 2, 2)));
        assert!(!outer.encloses(&BoundingBox::from_size(9, 8, 2, 2)));
    }
}
