//! One tracking cycle, from two frames to a transform and a region record.
//!
//! Stages:
//! 1. Grayscale conversion of both frames.
//! 2. Feature extraction, primary and secondary in parallel on the worker pool.
//! 3. k = 2 matching (primary = query, secondary = train) and the ratio test.
//! 4. Optional epipolar filter.
//! 5. Minimum-correspondence gate, then RANSAC homography.
//! 6. Temporal stabilization against the previous transform.
//! 7. Projection of the template outline.
//!
//! Any stage may end the cycle with no output. The reason is recorded in the
//! cycle report and nothing escapes as an error.
use super::options::TrackerConfig;
use crate::diagnostics::{
    CycleReport, EpipolarStage, ExtractionStage, HomographyStage, InputDescriptor, MatchingStage,
    SkipReason, StabilizerStage,
};
use crate::error::Result;
use crate::features::{FeatureExtractor, FeatureSet};
use crate::geometry::{filter_epipolar, HomographyEstimator};
use crate::image::{ImageFrame, ImageU8};
use crate::matching::{ratio_test, DescriptorMatcher, Match};
use crate::region::{project_region, RegionFrame, TrackedRegion};
use crate::stabilizer::TemporalStabilizer;
use crate::types::{Correspondence, Transform};
use log::{debug, error, warn};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

/// Frames and capture time of one cycle.
#[derive(Clone, Copy, Debug)]
pub struct CycleInput<'a> {
    /// Live frame.
    pub primary: ImageFrame<'a>,
    /// Template frame.
    pub secondary: ImageFrame<'a>,
    pub time_msec: i64,
}

#[derive(Clone, Debug)]
pub struct CycleOutput {
    /// Stabilized transform to feed into the next cycle; `None` when the
    /// cycle failed.
    pub transform: Option<Transform>,
    pub region: Option<TrackedRegion>,
    pub report: CycleReport,
}

pub struct Pipeline {
    config: TrackerConfig,
    extractor: Box<dyn FeatureExtractor>,
    matcher: Box<dyn DescriptorMatcher>,
    estimator: HomographyEstimator,
    stabilizer: TemporalStabilizer,
    pool: rayon::ThreadPool,
}

impl Pipeline {
    /// Validate `config` and build the extractor, matcher and worker pool it names.
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        let extractor = config.extractor.build();
        let matcher = config.matcher.build();
        Self::with_components(config, extractor, matcher)
    }

    /// Use caller-provided extractor and matcher instead of the configured ones.
    pub fn with_components(
        config: TrackerConfig,
        extractor: Box<dyn FeatureExtractor>,
        matcher: Box<dyn DescriptorMatcher>,
    ) -> Result<Self> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.session.worker_pool_size)
            .thread_name(|i| format!("tracker-extract-{i}"))
            .build()?;
        Ok(Self {
            estimator: HomographyEstimator::new(config.homography.clone()),
            stabilizer: TemporalStabilizer::new(config.stabilizer.clone()),
            config,
            extractor,
            matcher,
            pool,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Run one cycle. `previous` is the transform emitted by the last
    /// successful cycle; the region is flagged as a reacquisition when it is
    /// absent.
    pub fn run_cycle(
        &self,
        primary: ImageFrame<'_>,
        secondary: ImageFrame<'_>,
        previous: Option<&Transform>,
        time_msec: i64,
    ) -> CycleOutput {
        let start = Instant::now();
        let mut report = CycleReport::new(
            time_msec,
            InputDescriptor {
                primary_width: primary.width,
                primary_height: primary.height,
                secondary_width: secondary.width,
                secondary_height: secondary.height,
            },
        );
        let result = self.run_stages(primary, secondary, previous, time_msec, &mut report);
        report.timings.total_ms = start.elapsed().as_secs_f64() * 1000.0;
        match result {
            Ok((transform, region)) => CycleOutput {
                transform: Some(transform),
                region: Some(region),
                report,
            },
            Err(reason) => {
                debug!("cycle {time_msec}: skipped ({reason:?})");
                report.skip(reason);
                CycleOutput {
                    transform: None,
                    region: None,
                    report,
                }
            }
        }
    }

    fn run_stages(
        &self,
        primary: ImageFrame<'_>,
        secondary: ImageFrame<'_>,
        previous: Option<&Transform>,
        time_msec: i64,
        report: &mut CycleReport,
    ) -> std::result::Result<(Transform, TrackedRegion), SkipReason> {
        let usable = |f: &ImageFrame<'_>| !f.is_empty() && f.is_well_formed();
        if !usable(&primary) || !usable(&secondary) {
            return Err(SkipReason::EmptyInput);
        }

        let (gray_p, gray_s) = report
            .timings
            .time("grayscale", || (primary.to_gray(), secondary.to_gray()));
        let ((feat_p, panic_p), (feat_s, panic_s)) = report.timings.time("extract", || {
            self.extract_pair(gray_p.as_view(), gray_s.as_view())
        });
        report.extraction = Some(ExtractionStage {
            extractor: self.extractor.name(),
            primary_features: feat_p.len(),
            secondary_features: feat_s.len(),
            contained_panics: panic_p as usize + panic_s as usize,
        });
        debug!(
            "cycle {time_msec}: features primary={} secondary={}",
            feat_p.len(),
            feat_s.len()
        );
        if feat_p.is_empty() || feat_s.is_empty() {
            return Err(SkipReason::NoFeatures);
        }

        let (knn_entries, matches) = report
            .timings
            .time("match", || self.match_features(&feat_p, &feat_s))
            .ok_or(SkipReason::MatchFailed)?;
        report.matching = Some(MatchingStage {
            matcher: self.matcher.name(),
            knn_entries,
            ratio_kept: matches.len(),
        });

        let mut correspondences = to_correspondences(&matches, &feat_p, &feat_s);
        if self.config.epipolar.enabled {
            let input = correspondences.len();
            correspondences = report.timings.time("epipolar", || {
                filter_epipolar(&correspondences, &self.config.epipolar)
                    .into_iter()
                    .map(|i| correspondences[i])
                    .collect()
            });
            report.epipolar = Some(EpipolarStage {
                input,
                kept: correspondences.len(),
            });
        }

        let required = self.config.homography.min_correspondences;
        if correspondences.len() < required {
            return Err(SkipReason::TooFewCorrespondences {
                found: correspondences.len(),
                required,
            });
        }

        let estimate = report
            .timings
            .time("homography", || self.estimator.estimate(&correspondences));
        let estimate = estimate.ok_or(SkipReason::HomographyRejected)?;
        report.homography = Some(HomographyStage {
            correspondences: correspondences.len(),
            inliers: estimate.inlier_count,
            iterations: estimate.iterations,
        });

        let stabilized = self.stabilizer.blend(&estimate.transform, previous);
        report.stabilizer = Some(StabilizerStage {
            delta: stabilized.delta,
            damped: stabilized.damped,
        });

        let frame = RegionFrame {
            template: self
                .config
                .region
                .template
                .resolve(secondary.width, secondary.height),
            primary: (primary.width, primary.height),
            time_msec,
            reacquisition: previous.is_none(),
        };
        let region = project_region(&stabilized.transform, frame, self.config.region.id)
            .ok_or(SkipReason::RegionRejected)?;
        Ok((stabilized.transform, region))
    }

    /// Extract both frames on the worker pool. The flag reports a contained panic.
    fn extract_pair(
        &self,
        primary: ImageU8<'_>,
        secondary: ImageU8<'_>,
    ) -> ((FeatureSet, bool), (FeatureSet, bool)) {
        let extractor = self.extractor.as_ref();
        self.pool.join(
            || extract_contained(extractor, primary, "primary"),
            || extract_contained(extractor, secondary, "secondary"),
        )
    }

    /// knn entry count and ratio-test survivors, or `None` on a matcher fault.
    fn match_features(
        &self,
        primary: &FeatureSet,
        secondary: &FeatureSet,
    ) -> Option<(usize, Vec<Match>)> {
        match self
            .matcher
            .knn_match(&primary.descriptors, &secondary.descriptors, 2)
        {
            Ok(knn) => Some((knn.len(), ratio_test(&knn, self.config.ratio_threshold))),
            Err(err) => {
                warn!("{} matcher failed: {err}", self.matcher.name());
                None
            }
        }
    }
}

fn extract_contained(
    extractor: &dyn FeatureExtractor,
    image: ImageU8<'_>,
    side: &str,
) -> (FeatureSet, bool) {
    match catch_unwind(AssertUnwindSafe(|| extractor.extract(image))) {
        Ok(set) if set.keypoints.len() == set.descriptors.len() => (set, false),
        Ok(set) => {
            warn!(
                "{} extractor returned {} keypoints but {} descriptors for the {side} frame",
                extractor.name(),
                set.keypoints.len(),
                set.descriptors.len()
            );
            (FeatureSet::empty(), false)
        }
        Err(_) => {
            error!(
                "{} extractor panicked on the {side} frame; treating it as featureless",
                extractor.name()
            );
            (FeatureSet::empty(), true)
        }
    }
}

fn to_correspondences(
    matches: &[Match],
    primary: &FeatureSet,
    secondary: &FeatureSet,
) -> Vec<Correspondence> {
    matches
        .iter()
        .filter_map(|m| {
            let p = primary.keypoints.get(m.query_idx)?;
            let s = secondary.keypoints.get(m.train_idx)?;
            Some(Correspondence::new(
                [s.x as f64, s.y as f64],
                [p.x as f64, p.y as f64],
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Exploding;

    impl FeatureExtractor for Exploding {
        fn extract(&self, _image: ImageU8<'_>) -> FeatureSet {
            panic!("extractor failure");
        }

        fn name(&self) -> &'static str {
            "exploding"
        }
    }

    #[test]
    fn panicking_extractor_is_contained() {
        let data = [0u8; 16];
        let (set, panicked) = extract_contained(&Exploding, ImageU8::new(4, 4, &data), "primary");
        assert!(set.is_empty());
        assert!(panicked);
    }

    #[test]
    fn invalid_config_is_fatal() {
        let mut config = TrackerConfig::default();
        config.ratio_threshold = 2.0;
        assert!(Pipeline::new(config).is_err());
    }

    #[test]
    fn oversized_lsh_config_is_rejected() {
        let config = TrackerConfig {
            matcher: crate::matching::MatcherConfig::Lsh(crate::matching::LshOptions {
                table_number: 0,
                key_size: 64,
                multi_probe_level: 7,
                ..Default::default()
            }),
            ..TrackerConfig::default()
        };
        assert!(matches!(
            Pipeline::new(config),
            Err(crate::error::TrackerError::Config(_))
        ));
    }

    #[test]
    fn panicking_extractor_skips_cycle() {
        let pipeline = Pipeline::with_components(
            TrackerConfig::default(),
            Box::new(Exploding),
            TrackerConfig::default().matcher.build(),
        )
        .expect("pipeline");
        let data = vec![0u8; 32 * 32];
        let frame = ImageFrame::gray(ImageU8::new(32, 32, &data));
        let out = pipeline.run_cycle(frame, frame, None, 0);
        assert!(out.transform.is_none() && out.region.is_none());
        assert_eq!(out.report.outcome.skip_reason(), Some(SkipReason::NoFeatures));
        assert_eq!(out.report.extraction.map(|e| e.contained_panics), Some(2));
    }
}
