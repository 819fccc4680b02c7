//! FAST-9 corner detection with Harris scoring and grid non-maximum suppression.
//!
//! A pixel is a corner when 9 contiguous pixels on the 16-pixel Bresenham
//! circle of radius 3 are all brighter or all darker than the centre by the
//! threshold. Candidates are scored with the Harris response and only the
//! strongest candidate per grid cell survives.
use super::gradient::{sobel_gradients, Gradients};
use crate::image::{ImageF32, ImageView};

/// Offsets of the 16-pixel Bresenham circle, clockwise from the top.
const CIRCLE: [(isize, isize); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

const ARC_LENGTH: usize = 9;
const HARRIS_RADIUS: usize = 3;

/// Minimum distance from the border needed by the circle test.
pub const FAST_BORDER: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Corner {
    pub x: usize,
    pub y: usize,
    pub response: f32,
}

#[derive(Clone, Debug)]
pub struct FastDetector {
    /// Intensity difference in `[0, 1]` units.
    pub threshold: f32,
    /// Grid cell edge for suppression, in pixels of the scanned level.
    pub cell: usize,
    pub harris_k: f32,
    /// Pixels skipped along each image edge (at least [`FAST_BORDER`]).
    pub border: usize,
}

impl FastDetector {
    /// `threshold_u8` is expressed in 8-bit intensity units.
    pub fn new(threshold_u8: u8, cell: usize, harris_k: f32, border: usize) -> Self {
        Self {
            threshold: threshold_u8 as f32 / 255.0,
            cell: cell.max(1),
            harris_k,
            border: border.max(FAST_BORDER),
        }
    }

    /// Detect corners, strongest first.
    pub fn detect(&self, level: &ImageF32) -> Vec<Corner> {
        let (w, h) = (level.w, level.h);
        if w <= 2 * self.border || h <= 2 * self.border {
            return Vec::new();
        }

        let mut candidates = Vec::new();
        for y in self.border..h - self.border {
            for x in self.border..w - self.border {
                if is_fast_corner(level, x, y, self.threshold) {
                    candidates.push((x, y));
                }
            }
        }
        if candidates.is_empty() {
            return Vec::new();
        }

        let grad = sobel_gradients(level);
        let mut corners = self.suppress(&grad, &candidates, w, h);
        corners.sort_by(|a, b| {
            b.response
                .total_cmp(&a.response)
                .then(a.y.cmp(&b.y))
                .then(a.x.cmp(&b.x))
        });
        corners
    }

    fn suppress(
        &self,
        grad: &Gradients,
        candidates: &[(usize, usize)],
        w: usize,
        h: usize,
    ) -> Vec<Corner> {
        let cells_x = w.div_ceil(self.cell);
        let cells_y = h.div_ceil(self.cell);
        let mut grid: Vec<Option<Corner>> = vec![None; cells_x * cells_y];
        for &(x, y) in candidates {
            let response = grad.harris(x, y, HARRIS_RADIUS, self.harris_k);
            if !response.is_finite() {
                continue;
            }
            let slot = &mut grid[(y / self.cell) * cells_x + x / self.cell];
            match slot {
                Some(existing) if existing.response >= response => {}
                _ => *slot = Some(Corner { x, y, response }),
            }
        }
        grid.into_iter().flatten().collect()
    }
}

fn is_fast_corner(level: &ImageF32, x: usize, y: usize, t: f32) -> bool {
    let center = level.get(x, y);
    let pixel = |i: usize| {
        let (dx, dy) = CIRCLE[i];
        level.get(
            (x as isize + dx) as usize,
            (y as isize + dy) as usize,
        )
    };

    // Any 9-arc covers at least two of the four compass points.
    let compass = [pixel(0), pixel(4), pixel(8), pixel(12)];
    let brighter = compass.iter().filter(|&&p| p > center + t).count();
    let darker = compass.iter().filter(|&&p| p < center - t).count();
    if brighter < 2 && darker < 2 {
        return false;
    }

    let ring: [f32; 16] = std::array::from_fn(pixel);
    has_arc(&ring, |p| p > center + t) || has_arc(&ring, |p| p < center - t)
}

fn has_arc(ring: &[f32; 16], pred: impl Fn(f32) -> bool) -> bool {
    let mut run = 0;
    for i in 0..16 + ARC_LENGTH - 1 {
        if pred(ring[i % 16]) {
            run += 1;
            if run >= ARC_LENGTH {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

/// Orientation of the intensity centroid inside a disc of `radius`, in radians.
pub fn intensity_centroid_angle(level: &ImageF32, x: usize, y: usize, radius: usize) -> f32 {
    let r = radius as isize;
    let (mut m10, mut m01) = (0.0f32, 0.0f32);
    for dy in -r..=r {
        let py = y as isize + dy;
        if py < 0 || py >= level.h as isize {
            continue;
        }
        let row = level.row(py as usize);
        for dx in -r..=r {
            if dx * dx + dy * dy > r * r {
                continue;
            }
            let px = x as isize + dx;
            if px < 0 || px >= level.w as isize {
                continue;
            }
            let v = row[px as usize];
            m10 += dx as f32 * v;
            m01 += dy as f32 * v;
        }
    }
    m01.atan2(m10)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_image() -> ImageF32 {
        let mut img = ImageF32::new(40, 40);
        for y in 15..40 {
            for x in 15..40 {
                img.set(x, y, 1.0);
            }
        }
        img
    }

    #[test]
    fn uniform_and_tiny_images_have_no_corners() {
        let det = FastDetector::new(20, 8, 0.04, 3);
        assert!(det.detect(&ImageF32::new(60, 60)).is_empty());
        assert!(det.detect(&ImageF32::new(5, 5)).is_empty());
    }

    #[test]
    fn square_corner_is_detected() {
        let det = FastDetector::new(20, 8, 0.04, 3);
        let corners = det.detect(&square_image());
        assert!(!corners.is_empty());
        let best = corners[0];
        assert!((best.x as i32 - 15).abs() <= 2 && (best.y as i32 - 15).abs() <= 2);
        assert!(corners.windows(2).all(|w| w[0].response >= w[1].response));
    }

    #[test]
    fn centroid_points_towards_bright_quadrant() {
        let img = square_image();
        let angle = intensity_centroid_angle(&img, 15, 15, 7);
        // Bright region is down-right: +x, +y.
        assert!((angle - std::f32::consts::FRAC_PI_4).abs() < 0.2);
    }
}
