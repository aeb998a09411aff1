//! Points, sizes, and letterbox geometry.

use serde::{Deserialize, Serialize};

/// A 2D point. Normalized `[0, 1]` unless a field says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    /// Screen center in normalized space.
    pub const CENTER: Point2D = Point2D { x: 0.5, y: 0.5 };

    pub const ZERO: Point2D = Point2D { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Vector length when the point is used as a velocity.
    pub fn magnitude(&self) -> f64 {
        self.distance_to(&Point2D::ZERO)
    }

    /// Linear interpolation between two points.
    pub fn lerp(a: &Point2D, b: &Point2D, t: f64) -> Point2D {
        let t = t.clamp(0.0, 1.0);
        Point2D {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
        }
    }

    /// Clamp both coordinates into `[0, 1]`. NaN collapses to center.
    pub fn clamped01(&self) -> Point2D {
        let clamp = |v: f64| if v.is_nan() { 0.5 } else { v.clamp(0.0, 1.0) };
        Point2D {
            x: clamp(self.x),
            y: clamp(self.y),
        }
    }
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both dimensions finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Width over height; 1.0 for degenerate sizes.
    pub fn aspect(&self) -> f64 {
        if self.is_valid() {
            self.width / self.height
        } else {
            1.0
        }
    }
}

/// Where a source is drawn inside a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawRect {
    pub offset_x: f64,
    pub offset_y: f64,
    pub width: f64,
    pub height: f64,
}

impl DrawRect {
    /// Rect covering the entire canvas.
    pub fn full(canvas: Size) -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            width: canvas.width,
            height: canvas.height,
        }
    }

    /// Fit `source` inside `canvas` preserving aspect ratio, centered
    /// (letterbox or pillarbox). Unknown source sizes fill the canvas.
    pub fn contain(source: Size, canvas: Size) -> Self {
        if !source.is_valid() || !canvas.is_valid() {
            return Self::full(canvas);
        }

        let scale = (canvas.width / source.width).min(canvas.height / source.height);
        let width = source.width * scale;
        let height = source.height * scale;

        Self {
            offset_x: (canvas.width - width) / 2.0,
            offset_y: (canvas.height - height) / 2.0,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Uniform scale that makes this rect cover the whole canvas.
    pub fn fill_scale(&self, canvas: Size) -> f64 {
        if self.width <= 0.0 || self.height <= 0.0 || !canvas.is_valid() {
            return 1.0;
        }
        (canvas.width / self.width)
            .max(canvas.height / self.height)
            .max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_point2d_distance() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-9);
        assert!((b.magnitude() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamped01() {
        let p = Point2D::new(-0.2, 1.7).clamped01();
        assert_eq!(p, Point2D::new(0.0, 1.0));
        let nan = Point2D::new(f64::NAN, 0.3).clamped01();
        assert_eq!(nan, Point2D::new(0.5, 0.3));
    }

    #[test]
    fn test_contain_letterboxes_wide_source() {
        // 2:1 source in a 16:9 canvas leaves bars top and bottom.
        let rect = DrawRect::contain(Size::new(2000.0, 1000.0), Size::new(1920.0, 1080.0));
        assert!((rect.width - 1920.0).abs() < 1e-9);
        assert!((rect.height - 960.0).abs() < 1e-9);
        assert!((rect.offset_x - 0.0).abs() < 1e-9);
        assert!((rect.offset_y - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_contain_pillarboxes_tall_source() {
        let rect = DrawRect::contain(Size::new(1080.0, 1920.0), Size::new(1920.0, 1080.0));
        assert!((rect.height - 1080.0).abs() < 1e-9);
        assert!(rect.offset_x > 0.0);
        assert!((rect.offset_y - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_contain_unknown_source_fills() {
        let canvas = Size::new(1280.0, 720.0);
        assert_eq!(DrawRect::contain(Size::default(), canvas), DrawRect::full(canvas));
    }

    #[test]
    fn test_fill_scale() {
        let canvas = Size::new(1920.0, 1080.0);
        let rect = DrawRect::contain(Size::new(2000.0, 1000.0), canvas);
        assert!((rect.fill_scale(canvas) - 1080.0 / 960.0).abs() < 1e-9);
        assert_eq!(DrawRect::full(canvas).fill_scale(canvas), 1.0);
    }

    proptest! {
        #[test]
        fn prop_contain_stays_inside_canvas(
            sw in 1.0f64..8000.0,
            sh in 1.0f64..8000.0,
            cw in 1.0f64..8000.0,
            ch in 1.0f64..8000.0,
        ) {
            let canvas = Size::new(cw, ch);
            let rect = DrawRect::contain(Size::new(sw, sh), canvas);
            prop_assert!(rect.offset_x >= -1e-9 && rect.offset_y >= -1e-9);
            prop_assert!(rect.offset_x + rect.width <= cw + 1e-6);
            prop_assert!(rect.offset_y + rect.height <= ch + 1e-6);
            prop_assert!((rect.width / rect.height - sw / sh).abs() < 1e-6 * (sw / sh).max(1.0));
            prop_assert!(rect.fill_scale(canvas) >= 1.0);
        }
    }
}
