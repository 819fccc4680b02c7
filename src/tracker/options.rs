//! Configuration of a tracking session.
//!
//! Every field has a default; JSON configs only need to name what they change.
use crate::error::{Result, TrackerError};
use crate::features::ExtractorConfig;
use crate::geometry::{EpipolarOptions, HomographyOptions};
use crate::matching::MatcherConfig;
use crate::region::{RegionOptions, TemplateSize};
use crate::stabilizer::StabilizerOptions;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Consecutive failed cycles while tracking before the feedback
    /// transform is dropped.
    pub lost_after_failures: usize,
    /// Threads running the two per-cycle extractions.
    pub worker_pool_size: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            lost_after_failures: 30,
            worker_pool_size: 2,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub extractor: ExtractorConfig,
    pub matcher: MatcherConfig,
    pub ratio_threshold: f32,
    pub epipolar: EpipolarOptions,
    pub homography: HomographyOptions,
    pub stabilizer: StabilizerOptions,
    pub region: RegionOptions,
    pub session: SessionOptions,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            extractor: ExtractorConfig::default(),
            matcher: MatcherConfig::default(),
            ratio_threshold: 0.75,
            epipolar: EpipolarOptions::default(),
            homography: HomographyOptions::default(),
            stabilizer: StabilizerOptions::default(),
            region: RegionOptions::default(),
            session: SessionOptions::default(),
        }
    }
}

impl TrackerConfig {
    /// Reject settings no cycle could run with.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(TrackerError::Config(msg));
        if !(self.ratio_threshold > 0.0 && self.ratio_threshold <= 1.0) {
            return fail(format!(
                "ratio_threshold must be in (0, 1], got {}",
                self.ratio_threshold
            ));
        }
        if self.homography.min_correspondences < 4 {
            return fail(format!(
                "homography.min_correspondences must be at least 4, got {}",
                self.homography.min_correspondences
            ));
        }
        if !(self.homography.reprojection_threshold > 0.0) {
            return fail("homography.reprojection_threshold must be positive".to_string());
        }
        if !(self.homography.confidence > 0.0 && self.homography.confidence < 1.0) {
            return fail("homography.confidence must be in (0, 1)".to_string());
        }
        if self.homography.max_iterations == 0 {
            return fail("homography.max_iterations must be positive".to_string());
        }
        if !(self.epipolar.distance_threshold > 0.0) {
            return fail("epipolar.distance_threshold must be positive".to_string());
        }
        if !(self.stabilizer.max_change_threshold > 0.0) {
            return fail("stabilizer.max_change_threshold must be positive".to_string());
        }
        if self.session.lost_after_failures == 0 {
            return fail("session.lost_after_failures must be at least 1".to_string());
        }
        if self.session.worker_pool_size == 0 {
            return fail("session.worker_pool_size must be at least 1".to_string());
        }
        if self.extractor.max_features() == 0 {
            return fail("extractor.max_features must be positive".to_string());
        }
        if let MatcherConfig::Lsh(lsh) = &self.matcher {
            if let Some(msg) = lsh.check() {
                return fail(msg);
            }
        }
        if let TemplateSize::Fixed { width, height } = self.region.template {
            if !(width > 0.0 && height > 0.0) {
                return fail(format!(
                    "region.template must have a positive size, got {width}x{height}"
                ));
            }
        }
        Ok(())
    }
}
