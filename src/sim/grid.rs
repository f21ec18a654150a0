//! Occupancy ("rigid") matrix
//!
//! A dense counter per world unit of the play box. A cell is solid while at
//! least one platform covers it. The player is never inserted, only platforms,
//! and every platform move goes through `subtract_platform`/`add_platform` or
//! `slide_platform_x` so the counters always match the platform list.

use serde::{Deserialize, Serialize};

use super::geometry::BoundingBox;
use super::platform::Platform;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RigidMatrix {
    bbox: BoundingBox,
    cells: Vec<u16>,
}

impl RigidMatrix {
    pub fn new(bbox: BoundingBox) -> Self {
        let size = bbox.width() as usize * bbox.height() as usize;
        Self {
            bbox,
            cells: vec![0; size],
        }
    }

    /// Build a matrix from scratch for the given platforms
    pub fn from_platforms(bbox: BoundingBox, platforms: &[Platform]) -> Self {
        let mut matrix = Self::new(bbox);
        for platform in platforms {
            matrix.add_platform(platform);
        }
        matrix
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        let base_x = (x - self.bbox.min_x) as usize;
        let base_y = (y - self.bbox.min_y) as usize;
        base_x + base_y * self.bbox.width() as usize
    }

    /// Number of platforms covering (x, y); zero outside the box
    #[inline]
    pub fn count(&self, x: i32, y: i32) -> u16 {
        if self.bbox.contains(x, y) {
            self.cells[self.index(x, y)]
        } else {
            0
        }
    }

    #[inline]
    pub fn query(&self, x: i32, y: i32) -> bool {
        self.count(x, y) != 0
    }

    /// Adjust the counter of one cell; cells outside the box are ignored
    ///
    /// # Panics
    ///
    /// Panics if the counter would underflow or overflow.
    pub fn modify(&mut self, x: i32, y: i32, delta: i32) {
        if !self.bbox.contains(x, y) {
            return;
        }
        let index = self.index(x, y);
        let cell = &mut self.cells[index];
        *cell = u16::try_from(i32::from(*cell) + delta)
            .unwrap_or_else(|_| panic!("rigid matrix counter out of range at ({x}, {y})"));
    }

    fn modify_area(&mut self, x: i32, y: i32, w: i32, h: i32, delta: i32) {
        for i in x..x + w {
            for j in y..y + h {
                self.modify(i, j, delta);
            }
        }
    }

    pub fn add_platform(&mut self, platform: &Platform) {
        self.modify_area(platform.x, platform.y, platform.w, platform.h, 1);
    }

    pub fn subtract_platform(&mut self, platform: &Platform) {
        self.modify_area(platform.x, platform.y, platform.w, platform.h, -1);
    }

    /// Whether any cell of the `w` x `h` box at (x, y) is solid
    pub fn violates(&self, x: i32, y: i32, w: i32, h: i32) -> bool {
        (x..x + w).any(|i| (y..y + h).any(|j| self.query(i, j)))
    }

    pub fn is_free(&self, x: i32, y: i32, w: i32, h: i32) -> bool {
        !self.violates(x, y, w, h)
    }

    /// Whether any cell of the row right below the `w` x `h` box is solid
    pub fn has_rigid_support(&self, x: i32, y: i32, w: i32, h: i32) -> bool {
        (x..x + w).any(|i| self.query(i, y + h))
    }

    /// Move a platform horizontally, touching only the columns it leaves and enters
    ///
    /// # Panics
    ///
    /// Panics on a zero displacement.
    pub fn slide_platform_x(&mut self, platform: &mut Platform, dx: i32) {
        assert!(dx != 0, "slide_platform_x called with zero displacement");
        let size = platform.w.min(dx.abs());
        let (leaving, entering) = if dx > 0 {
            (platform.x, platform.x + platform.w.max(dx))
        } else {
            (
                platform.x.max(platform.x + platform.w - size),
                platform.x + dx,
            )
        };
        self.modify_area(leaving, platform.y, size, platform.h, -1);
        self.modify_area(entering, platform.y, size, platform.h, 1);
        platform.x += dx;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn platform(x: i32, y: i32, w: i32) -> Platform {
        Platform {
            x,
            y,
            w,
            h: 1,
            speed: 1,
            rarity: 0.0,
        }
    }

    #[test]
    fn test_query_outside_box_is_empty() {
        let bbox = BoundingBox::new(0, 0, 9, 9);
        let matrix = RigidMatrix::from_platforms(bbox, &[platform(-5, 0, 20)]);
        assert!(matrix.query(0, 0));
        assert!(matrix.query(9, 0));
        assert!(!matrix.query(-1, 0));
        assert!(!matrix.query(10, 0));
        assert!(!matrix.query(0, 1));
    }

    #[test]
    fn test_add_subtract_is_balanced() {
        let bbox = BoundingBox::new(0, 0, 19, 4);
        let p = platform(2, 3, 5);
        let mut matrix = RigidMatrix::new(bbox);
        matrix.add_platform(&p);
        matrix.add_platform(&p);
        assert_eq!(matrix.count(4, 3), 2);
        matrix.subtract_platform(&p);
        assert_eq!(matrix.count(4, 3), 1);
        matrix.subtract_platform(&p);
        assert_eq!(matrix, RigidMatrix::new(bbox));
    }

    #[test]
    #[should_panic(expected = "rigid matrix counter out of range")]
    fn test_subtracting_absent_platform_panics() {
        let mut matrix = RigidMatrix::new(BoundingBox::new(0, 0, 9, 9));
        matrix.subtract_platform(&platform(0, 0, 2));
    }

    #[test]
    fn test_support_and_violation() {
        let bbox = BoundingBox::new(0, 0, 19, 9);
        let matrix = RigidMatrix::from_platforms(bbox, &[platform(5, 5, 4)]);
        // Standing on the platform's left edge
        assert!(matrix.has_rigid_support(4, 4, 2, 1));
        // One unit to the left of it
        assert!(!matrix.has_rigid_support(3, 4, 2, 1));
        assert!(matrix.violates(8, 4, 2, 2));
        assert!(!matrix.violates(9, 4, 2, 2));
        assert!(matrix.is_free(0, 0, 20, 5));
    }

    #[test]
    #[should_panic(expected = "zero displacement")]
    fn test_zero_slide_panics() {
        let mut matrix = RigidMatrix::new(BoundingBox::new(0, 0, 9, 9));
        let mut p = platform(0, 0, 2);
        matrix.add_platform(&p);
        matrix.slide_platform_x(&mut p, 0);
    }

    #[test]
    fn test_slide_across_box_edge() {
        let bbox = BoundingBox::new(0, 0, 9, 0);
        let mut p = platform(7, 0, 4);
        let mut matrix = RigidMatrix::from_platforms(bbox, &[p]);
        matrix.slide_platform_x(&mut p, 1);
        assert_eq!(p.x, 8);
        assert_eq!(matrix, RigidMatrix::from_platforms(bbox, &[p]));
        assert!(!matrix.query(7, 0));
        assert!(matrix.query(9, 0));
    }

    proptest! {
        #[test]
        fn prop_slides_match_recount(
            x in -30i32..60,
            y in 0i32..8,
            w in 1i32..12,
            h in 1i32..3,
            moves in prop::collection::vec(
                (-15i32..15).prop_filter("non-zero", |dx| *dx != 0),
                1..20,
            ),
        ) {
            let bbox = BoundingBox::new(0, 0, 39, 9);
            let other = Platform { x: 10, y: 0, w: 6, h: 1, speed: 1, rarity: 0.5 };
            let mut p = Platform { x, y, w, h, speed: 1, rarity: 0.0 };
            let mut matrix = RigidMatrix::from_platforms(bbox, &[other, p]);
            for dx in moves {
                matrix.slide_platform_x(&mut p, dx);
                prop_assert_eq!(&matrix, &RigidMatrix::from_platforms(bbox, &[other, p]));
            }
        }
    }
}
