//! Two-view geometry on matched correspondences.
//!
//! - [`homography`]: normalized DLT inside adaptive RANSAC.
//! - [`epipolar`]: RANSAC 8-point fundamental matrix and epipolar gating.
//! - [`projection`]: applying transforms to point lists.
pub mod epipolar;
pub mod homography;
mod normalize;
pub mod projection;
mod sampling;

pub use epipolar::{filter_epipolar, EpipolarOptions, FundamentalEstimate};
pub use homography::{HomographyEstimate, HomographyEstimator, HomographyOptions};
pub use projection::apply_homography_points;

/// Iterations needed to draw one all-inlier sample of `sample_size` with
/// probability `confidence`, given the current inlier ratio.
pub(crate) fn adaptive_iterations(
    confidence: f64,
    inlier_ratio: f64,
    sample_size: i32,
    max_iterations: usize,
) -> usize {
    let good = inlier_ratio.clamp(0.0, 1.0).powi(sample_size);
    if good <= f64::EPSILON {
        return max_iterations;
    }
    if good >= 1.0 - f64::EPSILON {
        return 1;
    }
    let num = (1.0 - confidence.clamp(0.0, 1.0 - 1e-12)).ln();
    let den = (1.0 - good).ln();
    let n = (num / den).ceil();
    if !n.is_finite() || n < 1.0 {
        return 1;
    }
    (n as usize).min(max_iterations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adaptive_iterations_shrink_with_inlier_ratio() {
        assert_eq!(adaptive_iterations(0.995, 0.0, 4, 2000), 2000);
        assert_eq!(adaptive_iterations(0.995, 1.0, 4, 2000), 1);
        let half = adaptive_iterations(0.995, 0.5, 4, 2000);
        let most = adaptive_iterations(0.995, 0.9, 4, 2000);
        assert!(most < half && half < 2000);
        // ln(0.005) / ln(1 - 0.0625) rounds up to 83.
        assert_eq!(half, 83);
    }
}
