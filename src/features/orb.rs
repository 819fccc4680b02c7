//! Oriented FAST + rotated BRIEF over a scale pyramid.
use super::brief::{BriefPattern, PATTERN_RADIUS};
use super::fast::{intensity_centroid_angle, FastDetector};
use super::types::{Descriptors, FeatureSet, KeyPoint};
use super::FeatureExtractor;
use crate::image::{ImageU8, ImageView};
use crate::pyramid::{blur, Pyramid, PyramidOptions, GAUSSIAN_5TAP};
use serde::{Deserialize, Serialize};

const BORDER: usize = PATTERN_RADIUS as usize + 1;
const CENTROID_RADIUS: usize = PATTERN_RADIUS as usize;
/// Neighbourhood diameter reported in [`KeyPoint::size`] at level 0.
const PATCH_SIZE: f32 = 31.0;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct OrbOptions {
    pub max_features: usize,
    /// FAST threshold in 8-bit intensity units.
    pub fast_threshold: u8,
    pub pyramid_levels: usize,
    pub nms_cell_px: usize,
    pub harris_k: f32,
}

impl Default for OrbOptions {
    fn default() -> Self {
        Self {
            max_features: 500,
            fast_threshold: 20,
            pyramid_levels: 4,
            nms_cell_px: 8,
            harris_k: 0.04,
        }
    }
}

#[derive(Clone, Debug)]
pub struct OrbExtractor {
    options: OrbOptions,
    detector: FastDetector,
    pattern: BriefPattern,
}

impl OrbExtractor {
    pub fn new(options: OrbOptions) -> Self {
        let detector = FastDetector::new(
            options.fast_threshold,
            options.nms_cell_px,
            options.harris_k,
            BORDER,
        );
        Self {
            options,
            detector,
            pattern: BriefPattern::default(),
        }
    }

    pub fn options(&self) -> &OrbOptions {
        &self.options
    }
}

impl Default for OrbExtractor {
    fn default() -> Self {
        Self::new(OrbOptions::default())
    }
}

impl FeatureExtractor for OrbExtractor {
    fn extract(&self, image: ImageU8<'_>) -> FeatureSet {
        if image.is_empty() || !image.is_well_formed() || self.options.max_features == 0 {
            return FeatureSet::empty();
        }
        let levels = self.options.pyramid_levels.max(1);
        let pyramid = Pyramid::build_u8(image, PyramidOptions::new(levels).with_blur_levels(levels));

        let mut found = Vec::new();
        for (octave, level) in pyramid.levels.iter().enumerate() {
            let mut corners = self.detector.detect(level);
            if corners.is_empty() {
                continue;
            }
            corners.truncate(self.options.max_features);
            let smoothed = blur(level, &GAUSSIAN_5TAP);
            let scale = pyramid.scale_of(octave);
            for c in corners {
                let angle = intensity_centroid_angle(level, c.x, c.y, CENTROID_RADIUS);
                let descriptor = self.pattern.describe(&smoothed, c.x, c.y, angle);
                let keypoint = KeyPoint {
                    x: c.x as f32 * scale,
                    y: c.y as f32 * scale,
                    size: PATCH_SIZE * scale,
                    angle,
                    response: c.response,
                    octave: octave as u32,
                };
                found.push((keypoint, descriptor));
            }
        }

        found.sort_by(|(a, _), (b, _)| {
            b.response
                .total_cmp(&a.response)
                .then(a.octave.cmp(&b.octave))
                .then(a.y.total_cmp(&b.y))
                .then(a.x.total_cmp(&b.x))
        });
        found.truncate(self.options.max_features);
        let (keypoints, rows): (Vec<_>, Vec<_>) = found.into_iter().unzip();
        log::trace!(
            "orb: {} keypoints over {} levels",
            keypoints.len(),
            pyramid.levels.len()
        );
        FeatureSet {
            keypoints,
            descriptors: Descriptors::Binary(rows),
        }
    }

    fn name(&self) -> &'static str {
        "orb"
    }
}
