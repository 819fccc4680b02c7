//! Steered BRIEF: 256 intensity comparisons rotated by the keypoint angle.
use super::types::BinaryDescriptor;
use crate::image::ImageF32;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Radius of the disc holding every test point. Rotated points stay inside it.
pub const PATTERN_RADIUS: isize = 13;
/// Comparisons are drawn from an isotropic Gaussian of this deviation.
const PATTERN_SIGMA: f64 = 31.0 / 5.0;
const PATTERN_SEED: u64 = 0x0b51_ef00;

#[derive(Clone, Debug)]
pub struct BriefPattern {
    pairs: Vec<[(f32, f32); 2]>,
}

impl Default for BriefPattern {
    fn default() -> Self {
        Self::generate(PATTERN_SEED)
    }
}

impl BriefPattern {
    /// Deterministic pattern for `seed`.
    pub fn generate(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let pairs = (0..BinaryDescriptor::BITS)
            .map(|_| [sample_point(&mut rng), sample_point(&mut rng)])
            .collect();
        Self { pairs }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Describe the neighbourhood of `(x, y)` on a smoothed level.
    ///
    /// The caller keeps `(x, y)` at least [`PATTERN_RADIUS`] pixels from every edge.
    pub fn describe(&self, smoothed: &ImageF32, x: usize, y: usize, angle: f32) -> BinaryDescriptor {
        let (s, c) = angle.sin_cos();
        let sample = |(dx, dy): (f32, f32)| {
            let rx = (c * dx - s * dy).round() as isize;
            let ry = (s * dx + c * dy).round() as isize;
            let px = (x as isize + rx).clamp(0, smoothed.w as isize - 1) as usize;
            let py = (y as isize + ry).clamp(0, smoothed.h as isize - 1) as usize;
            smoothed.get(px, py)
        };
        let mut desc = BinaryDescriptor::default();
        for (bit, [a, b]) in self.pairs.iter().enumerate() {
            if sample(*a) < sample(*b) {
                desc.set_bit(bit);
            }
        }
        desc
    }
}

fn sample_point(rng: &mut StdRng) -> (f32, f32) {
    let r2 = (PATTERN_RADIUS * PATTERN_RADIUS) as f64;
    loop {
        let (gx, gy) = gaussian_pair(rng);
        let (x, y) = ((gx * PATTERN_SIGMA).round(), (gy * PATTERN_SIGMA).round());
        if x * x + y * y <= r2 {
            return (x as f32, y as f32);
        }
    }
}

/// Two independent standard normal samples (Box-Muller).
fn gaussian_pair(rng: &mut StdRng) -> (f64, f64) {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    let r = (-2.0 * u1.ln()).sqrt();
    let theta = 2.0 * std::f64::consts::PI * u2;
    (r * theta.cos(), r * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_is_deterministic_and_bounded() {
        let a = BriefPattern::generate(3);
        let b = BriefPattern::generate(3);
        assert_eq!(a.len(), 256);
        for (pa, pb) in a.pairs.iter().zip(&b.pairs) {
            assert_eq!(pa, pb);
            for &(x, y) in pa {
                assert!(x * x + y * y <= (PATTERN_RADIUS * PATTERN_RADIUS) as f32);
            }
        }
    }

    #[test]
    fn shifted_content_gives_identical_descriptor() {
        let mut img = ImageF32::new(64, 64);
        for y in 0..64 {
            for x in 0..64 {
                img.set(x, y, ((x * 7 + y * 13) % 17) as f32 / 17.0);
            }
        }
        let mut shifted = ImageF32::new(64, 64);
        for y in 0..64 {
            for x in 0..60 {
                shifted.set(x + 4, y, img.get(x, y));
            }
        }
        let pattern = BriefPattern::default();
        let a = pattern.describe(&img, 30, 30, 0.3);
        let b = pattern.describe(&shifted, 34, 30, 0.3);
        assert_eq!(a.hamming(&b), 0);
    }
}
