//! PDF space to viewport space geometry
//!
//! PDF space has its origin at the bottom-left of the page and grows upward.
//! Viewport space is in rendered pixels with the origin at the top-left.

use serde::Serialize;

use super::types::{HighlightError, Location};

/// Axis-aligned box in viewport pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct OverlayRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl OverlayRect {
    /// Smallest box containing both points, whatever their order
    #[must_use]
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            left: a.0.min(b.0),
            top: a.1.min(b.1),
            width: (a.0 - b.0).abs(),
            height: (a.1 - b.1).abs(),
        }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Project a highlight rectangle through a page's point transform.
///
/// The two opposite corners `(left, top)` and `(right, bottom)` are mapped
/// independently. The y-flip between PDF and viewport space (and any page
/// rotation) can swap which one lands top-left, so the result is normalised
/// with min/abs.
pub fn project<F>(location: &Location, to_viewport: F) -> OverlayRect
where
    F: Fn(f64, f64) -> (f64, f64),
{
    let first = to_viewport(location.left(), location.top());
    let second = to_viewport(location.right(), location.bottom());
    OverlayRect::from_corners(first, second)
}

/// Affine page-to-viewport transform for a rendered page.
///
/// Matrix layout is `[a, b, c, d, e, f]` mapping `(x, y)` to
/// `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageTransform {
    matrix: [f64; 6],
    viewport_width: f64,
    viewport_height: f64,
}

impl PageTransform {
    /// Transform for a page of `page_width` x `page_height` points rendered
    /// at `scale`, rotated clockwise by `rotation` degrees.
    pub fn new(
        page_width: f64,
        page_height: f64,
        scale: f64,
        rotation: i32,
    ) -> Result<Self, HighlightError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(page_width) || !valid(page_height) || !valid(scale) {
            return Err(HighlightError::PageSize {
                width: page_width,
                height: page_height,
            });
        }

        let (ra, rb, rc, rd) = match rotation.rem_euclid(360) {
            0 => (1.0, 0.0, 0.0, -1.0),
            90 => (0.0, 1.0, 1.0, 0.0),
            180 => (-1.0, 0.0, 0.0, 1.0),
            270 => (0.0, -1.0, -1.0, 0.0),
            _ => return Err(HighlightError::Rotation(rotation)),
        };

        let center_x = page_width / 2.0;
        let center_y = page_height / 2.0;

        // Quarter turns swap the rendered width and height
        let (offset_x, offset_y, viewport_width, viewport_height) = if ra == 0.0 {
            (
                center_y * scale,
                center_x * scale,
                page_height * scale,
                page_width * scale,
            )
        } else {
            (
                center_x * scale,
                center_y * scale,
                page_width * scale,
                page_height * scale,
            )
        };

        let matrix = [
            ra * scale,
            rb * scale,
            rc * scale,
            rd * scale,
            offset_x - ra * scale * center_x - rc * scale * center_y,
            offset_y - rb * scale * center_x - rd * scale * center_y,
        ];

        Ok(Self {
            matrix,
            viewport_width,
            viewport_height,
        })
    }

    /// Like [`Self::new`], for coordinates anchored at the top edge of the
    /// page: y grows upward from the top, so points on the page have y <= 0.
    /// Exported highlight lists use this frame.
    pub fn top_anchored(
        page_width: f64,
        page_height: f64,
        scale: f64,
        rotation: i32,
    ) -> Result<Self, HighlightError> {
        let mut transform = Self::new(page_width, page_height, scale, rotation)?;
        let [_, _, c, d, e, f] = transform.matrix;
        transform.matrix[4] = e + c * page_height;
        transform.matrix[5] = f + d * page_height;
        Ok(transform)
    }

    /// A transform that returns its input unchanged
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            matrix: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            viewport_width: 0.0,
            viewport_height: 0.0,
        }
    }

    #[must_use]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let [a, b, c, d, e, f] = self.matrix;
        (a * x + c * y + e, b * x + d * y + f)
    }

    /// Rendered page size in pixels
    #[must_use]
    pub const fn viewport_size(&self) -> (f64, f64) {
        (self.viewport_width, self.viewport_height)
    }

    #[must_use]
    pub const fn matrix(&self) -> [f64; 6] {
        self.matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn approx(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < EPS && (a.1 - b.1).abs() < EPS
    }

    #[test]
    fn identity_projection_of_fixture() {
        let loc = Location::new(10.0, -50.0, 20.0, -30.0);
        let rect = project(&loc, |x, y| (x, y));

        assert_eq!(
            rect,
            OverlayRect {
                left: 10.0,
                top: -80.0,
                width: 20.0,
                height: 30.0,
            }
        );
    }

    #[test]
    fn size_is_never_negative_for_any_corner_order() {
        let loc = Location::new(10.0, -50.0, 20.0, -30.0);
        let flips: [fn(f64, f64) -> (f64, f64); 4] = [
            |x, y| (x, y),
            |x, y| (-x, y),
            |x, y| (x, -y),
            |x, y| (-x, -y),
        ];

        for flip in flips {
            let rect = project(&loc, flip);
            assert!(rect.width >= 0.0 && rect.height >= 0.0, "{rect:?}");
            assert_eq!(rect.width, 20.0);
            assert_eq!(rect.height, 30.0);
        }

        let positive = Location::new(5.0, 5.0, 10.0, 10.0);
        let rect = project(&positive, |x, y| (x * 2.0, -y * 2.0));
        assert!(rect.width >= 0.0 && rect.height >= 0.0);
    }

    #[test]
    fn unrotated_page_flips_y() {
        let t = PageTransform::new(612.0, 792.0, 1.0, 0).unwrap();
        assert!(approx(t.apply(0.0, 0.0), (0.0, 792.0)));
        assert!(approx(t.apply(612.0, 792.0), (612.0, 0.0)));
        assert_eq!(t.viewport_size(), (612.0, 792.0));
    }

    #[test]
    fn scale_multiplies_coordinates() {
        let t = PageTransform::new(100.0, 200.0, 1.5, 0).unwrap();
        assert!(approx(t.apply(10.0, 50.0), (15.0, 225.0)));
        assert_eq!(t.viewport_size(), (150.0, 300.0));
    }

    #[test]
    fn quarter_turn_swaps_viewport_axes() {
        let t = PageTransform::new(100.0, 200.0, 1.0, 90).unwrap();
        assert_eq!(t.viewport_size(), (200.0, 100.0));
        // Bottom-left of the page ends up top-left after a clockwise turn
        assert!(approx(t.apply(0.0, 0.0), (0.0, 0.0)));
        assert!(approx(t.apply(100.0, 200.0), (200.0, 100.0)));
    }

    #[test]
    fn half_turn_maps_corners_to_opposites() {
        let t = PageTransform::new(100.0, 200.0, 1.0, 180).unwrap();
        assert!(approx(t.apply(0.0, 0.0), (100.0, 0.0)));
        assert!(approx(t.apply(100.0, 200.0), (0.0, 200.0)));
    }

    #[test]
    fn top_anchored_fixture_lands_on_page() {
        let t = PageTransform::top_anchored(612.0, 792.0, 1.0, 0).unwrap();
        assert!(approx(t.apply(0.0, 0.0), (0.0, 0.0)));
        assert!(approx(t.apply(10.0, -50.0), (10.0, 50.0)));

        let rect = project(&Location::new(10.0, -50.0, 20.0, -30.0), |x, y| t.apply(x, y));
        assert!((rect.left - 10.0).abs() < EPS && (rect.top - 50.0).abs() < EPS);
        assert!((rect.width - 20.0).abs() < EPS && (rect.height - 30.0).abs() < EPS);
    }

    #[test]
    fn top_anchored_scales() {
        let t = PageTransform::top_anchored(100.0, 200.0, 2.0, 0).unwrap();
        assert!(approx(t.apply(10.0, -20.0), (20.0, 40.0)));
        assert_eq!(t.viewport_size(), (200.0, 400.0));
    }

    #[test]
    fn negative_rotation_is_normalised() {
        let a = PageTransform::new(100.0, 200.0, 1.0, -90).unwrap();
        let b = PageTransform::new(100.0, 200.0, 1.0, 270).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_odd_rotation_and_empty_page() {
        assert!(matches!(
            PageTransform::new(100.0, 100.0, 1.0, 45),
            Err(HighlightError::Rotation(45))
        ));
        assert!(matches!(
            PageTransform::new(0.0, 100.0, 1.0, 0),
            Err(HighlightError::PageSize { .. })
        ));
    }
}
