//! Synthetic "dot" scenes with an extractor that reads them back exactly.
//!
//! Every dot has a unique intensity. The extractor turns each lit pixel into
//! a keypoint whose binary descriptor is seeded by that intensity, so equal
//! dots in two images match at distance 0 and different dots sit roughly 128
//! bits apart.
use planar_tracker::features::{BinaryDescriptor, Descriptors, FeatureExtractor, FeatureSet, KeyPoint};
use planar_tracker::image::ImageU8;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

pub struct DotExtractor;

impl FeatureExtractor for DotExtractor {
    fn extract(&self, image: ImageU8<'_>) -> FeatureSet {
        let mut keypoints = Vec::new();
        let mut rows = Vec::new();
        for y in 0..image.h {
            for x in 0..image.w {
                let v = image.get(x, y);
                if v == 0 {
                    continue;
                }
                keypoints.push(KeyPoint {
                    x: x as f32,
                    y: y as f32,
                    size: 1.0,
                    angle: 0.0,
                    response: v as f32,
                    octave: 0,
                });
                rows.push(descriptor_for(v));
            }
        }
        FeatureSet {
            keypoints,
            descriptors: Descriptors::Binary(rows),
        }
    }

    fn name(&self) -> &'static str {
        "dots"
    }
}

fn descriptor_for(intensity: u8) -> BinaryDescriptor {
    let mut rng = StdRng::seed_from_u64(intensity as u64 * 7919);
    BinaryDescriptor([rng.gen(), rng.gen(), rng.gen(), rng.gen()])
}

/// `count` dots at distinct random positions with `x < max_x`, `y < max_y`
/// and distinct intensities `5, 10, …`.
pub fn random_dots(count: usize, max_x: usize, max_y: usize, seed: u64) -> Vec<(usize, usize, u8)> {
    assert!(count <= 50, "intensities must stay unique");
    let mut rng = StdRng::seed_from_u64(seed);
    let mut used = HashSet::new();
    let mut dots = Vec::with_capacity(count);
    while dots.len() < count {
        let x = rng.gen_range(2..max_x);
        let y = rng.gen_range(2..max_y);
        if used.insert((x, y)) {
            dots.push((x, y, (5 * (dots.len() + 1)) as u8));
        }
    }
    dots
}

/// The same dots moved `dx` pixels to the right.
pub fn shifted(dots: &[(usize, usize, u8)], dx: usize) -> Vec<(usize, usize, u8)> {
    dots.iter().map(|&(x, y, v)| (x + dx, y, v)).collect()
}
