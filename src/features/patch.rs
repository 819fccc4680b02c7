//! Orientation-normalized float patch descriptors on FAST corners.
use super::fast::{intensity_centroid_angle, FastDetector};
use super::types::{Descriptors, FeatureSet, KeyPoint};
use super::FeatureExtractor;
use crate::image::{ImageF32, ImageU8, ImageView};
use crate::pyramid::{blur, GAUSSIAN_5TAP};
use serde::{Deserialize, Serialize};

/// Samples per patch side; descriptors have `GRID * GRID` entries.
const GRID: usize = 8;
pub const PATCH_DESCRIPTOR_DIM: usize = GRID * GRID;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct PatchOptions {
    pub max_features: usize,
    pub fast_threshold: u8,
    pub nms_cell_px: usize,
    pub harris_k: f32,
    /// Half edge of the sampled square, in pixels.
    pub patch_radius: usize,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            max_features: 500,
            fast_threshold: 20,
            nms_cell_px: 8,
            harris_k: 0.04,
            patch_radius: 8,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PatchExtractor {
    options: PatchOptions,
    detector: FastDetector,
}

impl PatchExtractor {
    pub fn new(options: PatchOptions) -> Self {
        let radius = options.patch_radius.max(1);
        let detector = FastDetector::new(
            options.fast_threshold,
            options.nms_cell_px,
            options.harris_k,
            radius + 1,
        );
        Self { options, detector }
    }

    fn describe(&self, smoothed: &ImageF32, x: f32, y: f32, angle: f32) -> Option<[f32; PATCH_DESCRIPTOR_DIM]> {
        let radius = self.options.patch_radius.max(1) as f32;
        let step = 2.0 * radius / GRID as f32;
        let (s, c) = angle.sin_cos();
        let mut out = [0.0f32; PATCH_DESCRIPTOR_DIM];
        for gy in 0..GRID {
            let v = -radius + (gy as f32 + 0.5) * step;
            for gx in 0..GRID {
                let u = -radius + (gx as f32 + 0.5) * step;
                let sx = x + c * u - s * v;
                let sy = y + s * u + c * v;
                out[gy * GRID + gx] = smoothed.sample_bilinear(sx, sy);
            }
        }
        let mean = out.iter().sum::<f32>() / PATCH_DESCRIPTOR_DIM as f32;
        out.iter_mut().for_each(|v| *v -= mean);
        let norm = out.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm <= 1e-6 {
            return None;
        }
        out.iter_mut().for_each(|v| *v /= norm);
        Some(out)
    }
}

impl Default for PatchExtractor {
    fn default() -> Self {
        Self::new(PatchOptions::default())
    }
}

impl FeatureExtractor for PatchExtractor {
    fn extract(&self, image: ImageU8<'_>) -> FeatureSet {
        if image.is_empty() || !image.is_well_formed() || self.options.max_features == 0 {
            return FeatureSet::empty();
        }
        let level = ImageF32::from_u8(image);
        let corners = self.detector.detect(&level);
        if corners.is_empty() {
            return FeatureSet::empty();
        }
        let smoothed = blur(&level, &GAUSSIAN_5TAP);
        let radius = self.options.patch_radius.max(1);

        let mut keypoints = Vec::new();
        let mut data = Vec::new();
        for c in corners {
            if keypoints.len() >= self.options.max_features {
                break;
            }
            let angle = intensity_centroid_angle(&level, c.x, c.y, radius);
            let Some(row) = self.describe(&smoothed, c.x as f32, c.y as f32, angle) else {
                continue;
            };
            keypoints.push(KeyPoint {
                x: c.x as f32,
                y: c.y as f32,
                size: (2 * radius + 1) as f32,
                angle,
                response: c.response,
                octave: 0,
            });
            data.extend_from_slice(&row);
        }
        FeatureSet {
            keypoints,
            descriptors: Descriptors::Float {
                dim: PATCH_DESCRIPTOR_DIM,
                data,
            },
        }
    }

    fn name(&self) -> &'static str {
        "patch"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_are_zero_mean_unit_norm() {
        let (w, h) = (64usize, 64usize);
        let mut data = vec![40u8; w * h];
        for y in 20..44 {
            for x in 20..44 {
                data[y * w + x] = 200;
            }
        }
        let set = PatchExtractor::default().extract(ImageU8::new(w, h, &data));
        assert!(!set.is_empty());
        assert_eq!(set.descriptors.len(), set.len());
        for i in 0..set.len() {
            let row = set.descriptors.float_row(i).expect("float row");
            assert_eq!(row.len(), PATCH_DESCRIPTOR_DIM);
            let mean: f32 = row.iter().sum::<f32>() / row.len() as f32;
            let norm: f32 = row.iter().map(|v| v * v).sum::<f32>().sqrt();
            assert!(mean.abs() < 1e-4);
            assert!((norm - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn empty_image_yields_empty_set() {
        assert!(PatchExtractor::default().extract(ImageU8::empty()).is_empty());
    }
}
