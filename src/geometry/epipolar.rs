//! Epipolar consistency filter.
//!
//! A fundamental matrix `F` is fitted with the normalized 8-point algorithm
//! inside RANSAC (rank 2 enforced on every fit). A correspondence survives
//! when the primary point lies within `distance_threshold` pixels of its
//! epipolar line `F·x_secondary`.
use super::adaptive_iterations;
use super::homography::null_vector_3x3;
use super::normalize::hartley;
use super::sampling::draw;
use crate::types::Correspondence;
use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

const SAMPLE_SIZE: usize = 8;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct EpipolarOptions {
    pub enabled: bool,
    /// Point-to-line distance gate in primary-image pixels.
    pub distance_threshold: f64,
    pub confidence: f64,
    pub max_iterations: usize,
    pub seed: u64,
}

impl Default for EpipolarOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            distance_threshold: 1.0,
            confidence: 0.99,
            max_iterations: 1000,
            seed: 0xe91_0a7,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FundamentalEstimate {
    /// Maps secondary points to epipolar lines in the primary image.
    pub matrix: Matrix3<f64>,
    pub inliers: Vec<bool>,
    pub inlier_count: usize,
}

/// Distance from `primary` to the epipolar line of `secondary`.
pub fn epipolar_distance(f: &Matrix3<f64>, secondary: &Point2<f64>, primary: &Point2<f64>) -> f64 {
    let line = f * Vector3::new(secondary.x, secondary.y, 1.0);
    let norm = (line.x * line.x + line.y * line.y).sqrt();
    if !norm.is_finite() || norm <= f64::EPSILON {
        return f64::INFINITY;
    }
    (line.x * primary.x + line.y * primary.y + line.z).abs() / norm
}

/// RANSAC fundamental matrix. `None` with fewer than eight correspondences or
/// when no sample yields a model.
pub fn estimate_fundamental(
    correspondences: &[Correspondence],
    options: &EpipolarOptions,
) -> Option<FundamentalEstimate> {
    let n = correspondences.len();
    if n < SAMPLE_SIZE {
        return None;
    }
    let max_iterations = options.max_iterations.max(1);
    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut best: Option<FundamentalEstimate> = None;
    let mut budget = max_iterations;
    let mut iterations = 0usize;

    while iterations < budget {
        iterations += 1;
        let idx: [usize; SAMPLE_SIZE] = draw(&mut rng, n);
        let sample = idx.map(|i| correspondences[i]);
        let Some(f) = fit_eight_point(&sample) else {
            continue;
        };
        let candidate = score(f, correspondences, options.distance_threshold);
        if best
            .as_ref()
            .map_or(true, |b| candidate.inlier_count > b.inlier_count)
        {
            budget = adaptive_iterations(
                options.confidence,
                candidate.inlier_count as f64 / n as f64,
                SAMPLE_SIZE as i32,
                max_iterations,
            )
            .max(iterations);
            best = Some(candidate);
        }
    }

    let best = best?;
    if best.inlier_count >= SAMPLE_SIZE {
        let support: Vec<Correspondence> = correspondences
            .iter()
            .zip(&best.inliers)
            .filter_map(|(c, &keep)| keep.then_some(*c))
            .collect();
        if let Some(f) = fit_eight_point(&support) {
            let refit = score(f, correspondences, options.distance_threshold);
            if refit.inlier_count >= best.inlier_count {
                return Some(refit);
            }
        }
    }
    Some(best)
}

/// Indices of correspondences consistent with the estimated epipolar
/// geometry.
///
/// With fewer than eight correspondences, on estimation failure, or when
/// nothing would survive, every index is kept.
pub fn filter_epipolar(correspondences: &[Correspondence], options: &EpipolarOptions) -> Vec<usize> {
    let all = || (0..correspondences.len()).collect::<Vec<_>>();
    let Some(estimate) = estimate_fundamental(correspondences, options) else {
        log::debug!(
            "epipolar: no model from {} correspondences, passing through",
            correspondences.len()
        );
        return all();
    };
    if estimate.inlier_count == 0 {
        log::debug!("epipolar: model rejects every correspondence, passing through");
        return all();
    }
    estimate
        .inliers
        .iter()
        .enumerate()
        .filter_map(|(i, &keep)| keep.then_some(i))
        .collect()
}

fn score(f: Matrix3<f64>, correspondences: &[Correspondence], threshold: f64) -> FundamentalEstimate {
    let inliers: Vec<bool> = correspondences
        .iter()
        .map(|c| epipolar_distance(&f, &c.secondary, &c.primary) < threshold)
        .collect();
    let inlier_count = inliers.iter().filter(|&&m| m).count();
    FundamentalEstimate {
        matrix: f,
        inliers,
        inlier_count,
    }
}

/// Normalized 8-point fit with rank-2 projection.
pub fn fit_eight_point(correspondences: &[Correspondence]) -> Option<Matrix3<f64>> {
    if correspondences.len() < SAMPLE_SIZE {
        return None;
    }
    let src: Vec<Point2<f64>> = correspondences.iter().map(|c| c.secondary).collect();
    let dst: Vec<Point2<f64>> = correspondences.iter().map(|c| c.primary).collect();
    let (t_src, n_src) = hartley(&src)?;
    let (t_dst, n_dst) = hartley(&dst)?;

    let mut ata = SMatrix::<f64, 9, 9>::zeros();
    for (s, d) in n_src.iter().zip(&n_dst) {
        let (x, y, u, v) = (s.x, s.y, d.x, d.y);
        let row = SVector::<f64, 9>::from_column_slice(&[
            u * x,
            u * y,
            u,
            v * x,
            v * y,
            v,
            x,
            y,
            1.0,
        ]);
        ata += row * row.transpose();
    }
    let f_n = enforce_rank2(null_vector_3x3(ata))?;
    let f = t_dst.transpose() * f_n * t_src;
    let scale = f.norm();
    if !scale.is_finite() || scale <= f64::EPSILON {
        return None;
    }
    Some(f / scale)
}

fn enforce_rank2(f: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let mut svd = f.svd(true, true);
    let (min_idx, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))?;
    svd.singular_values[min_idx] = 0.0;
    svd.recompose().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Rotation3;

    /// Two pinhole views of a non-planar point cloud.
    fn two_view_scene() -> Vec<Correspondence> {
        let k = Matrix3::new(500.0, 0.0, 320.0, 0.0, 500.0, 240.0, 0.0, 0.0, 1.0);
        let r = Rotation3::from_euler_angles(0.02, -0.05, 0.01);
        let t = Vector3::new(0.3, 0.05, 0.02);
        let mut out = Vec::new();
        for i in 0..40 {
            let fx = (i % 8) as f64 - 3.5;
            let fy = (i / 8) as f64 - 2.0;
            let z = 4.0 + ((i * 7) % 5) as f64 * 0.6;
            let p = Vector3::new(fx * 0.4, fy * 0.4, z);
            let a = k * p;
            let b = k * (r * p + t);
            out.push(Correspondence::new([a.x / a.z, a.y / a.z], [b.x / b.z, b.y / b.z]));
        }
        out
    }

    #[test]
    fn rank_two_and_zero_residual_on_exact_views() {
        let corr = two_view_scene();
        let f = fit_eight_point(&corr).expect("fit");
        assert!(f.determinant().abs() < 1e-9);
        for c in &corr {
            assert!(epipolar_distance(&f, &c.secondary, &c.primary) < 1e-4);
        }
    }

    #[test]
    fn filter_drops_off_line_outliers() {
        let mut corr = two_view_scene();
        let inliers = corr.len();
        let f = fit_eight_point(&corr).expect("fit");
        for i in 0..10 {
            let c = corr[i * 3];
            let line = f * Vector3::new(c.secondary.x, c.secondary.y, 1.0);
            let n = (line.x * line.x + line.y * line.y).sqrt();
            let shifted = [c.primary.x + 25.0 * line.x / n, c.primary.y + 25.0 * line.y / n];
            corr.push(Correspondence::new([c.secondary.x, c.secondary.y], shifted));
        }
        let options = EpipolarOptions {
            enabled: true,
            ..EpipolarOptions::default()
        };
        let kept = filter_epipolar(&corr, &options);
        assert!((0..inliers).all(|i| kept.contains(&i)));
        let surviving_outliers = kept.iter().filter(|&&i| i >= inliers).count();
        assert!(surviving_outliers <= 2, "{surviving_outliers} outliers kept");
    }

    #[test]
    fn few_correspondences_pass_through() {
        let corr: Vec<Correspondence> = two_view_scene().into_iter().take(5).collect();
        assert_eq!(filter_epipolar(&corr, &EpipolarOptions::default()), vec![0, 1, 2, 3, 4]);
    }
}
