use serde::{Deserialize, Serialize};

/// Axis-aligned rectangular region on screen, in pixels.
///
/// Bounds are half-open on the right/bottom edge: a pixel (x, y) is inside
/// when `left <= x < right` and `top <= y < bottom`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Region {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Region {
    /// Create a region from explicit bounds
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Create a region from a top-left corner and dimensions
    pub fn from_origin(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            left: x,
            top: y,
            right: x + width as i32,
            bottom: y + height as i32,
        }
    }

    /// Axis-aligned hull of a detector quadrilateral (4 corner points).
    ///
    /// Text detectors report slightly rotated quads; the locator only ever
    /// needs the enclosing upright box.
    pub fn from_quad(quad: &[[f64; 2]]) -> Result<Self, String> {
        if quad.len() != 4 {
            return Err(format!("Expected 4 corner points, got {}", quad.len()));
        }

        let left = quad.iter().map(|p| p[0]).fold(f64::INFINITY, f64::min);
        let right = quad.iter().map(|p| p[0]).fold(f64::NEG_INFINITY, f64::max);
        let top = quad.iter().map(|p| p[1]).fold(f64::INFINITY, f64::min);
        let bottom = quad.iter().map(|p| p[1]).fold(f64::NEG_INFINITY, f64::max);

        Ok(Self {
            left: left as i32,
            top: top as i32,
            right: right as i32,
            bottom: bottom as i32,
        })
    }

    /// Center point, truncated to integer coordinates
    pub fn center(&self) -> (i32, i32) {
        ((self.left + self.right) / 2, (self.top + self.bottom) / 2)
    }

    pub fn width(&self) -> u32 {
        (self.right - self.left).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.bottom - self.top).max(0) as u32
    }

    pub fn is_valid(&self) -> bool {
        self.right > self.left && self.bottom > self.top
    }

    /// Check if the region contains a point
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_center_truncates() {
        let region = Region::new(100, 100, 150, 140);
        assert_eq!(region.center(), (125, 120));

        // Odd sums truncate toward zero, matching integer division
        let odd = Region::new(0, 0, 5, 5);
        assert_eq!(odd.center(), (2, 2));
    }

    #[test]
    fn test_region_from_origin() {
        let region = Region::from_origin(10, 20, 30, 40);
        assert_eq!(region.right, 40);
        assert_eq!(region.bottom, 60);
        assert_eq!(region.width(), 30);
        assert_eq!(region.height(), 40);
    }

    #[test]
    fn test_region_from_quad() {
        // Detector-style quad: top-left, top-right, bottom-right, bottom-left
        let quad = [
            [100.0, 100.0],
            [150.0, 100.0],
            [150.0, 140.0],
            [100.0, 140.0],
        ];
        let region = Region::from_quad(&quad).unwrap();
        assert_eq!(region, Region::new(100, 100, 150, 140));
        assert_eq!(region.center(), (125, 120));
    }

    #[test]
    fn test_region_from_rotated_quad_takes_hull() {
        let quad = [[10.0, 5.0], [30.0, 10.0], [25.0, 40.0], [5.0, 35.0]];
        let region = Region::from_quad(&quad).unwrap();
        assert_eq!(region, Region::new(5, 5, 30, 40));
    }

    #[test]
    fn test_region_from_quad_wrong_count() {
        let result = Region::from_quad(&[[0.0, 0.0], [1.0, 1.0]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_region_contains() {
        let region = Region::new(100, 100, 300, 300);
        assert!(region.contains(100, 100));
        assert!(region.contains(299, 299));
        assert!(!region.contains(300, 150));
        assert!(!region.contains(50, 150));
    }

    #[test]
    fn test_region_validity() {
        assert!(Region::new(0, 0, 10, 10).is_valid());
        assert!(!Region::new(10, 0, 10, 10).is_valid());
        assert!(!Region::new(0, 20, 10, 10).is_valid());
    }

    #[test]
    fn test_region_serialization() {
        let region = Region::new(1, 2, 3, 4);
        let json = serde_json::to_string(&region).unwrap();
        let back: Region = serde_json::from_str(&json).unwrap();
        assert_eq!(region, back);
    }
}
