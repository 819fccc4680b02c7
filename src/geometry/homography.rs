//! Robust homography estimation.
//!
//! Each RANSAC round draws four correspondences, rejects samples with three
//! nearly collinear points in either image, and fits a Hartley-normalized DLT.
//! The DLT null vector is the eigenvector of `AᵀA` with the smallest
//! eigenvalue, which stays well defined for exactly four points. Inliers are
//! correspondences whose forward transfer error is below the reprojection
//! threshold. The iteration budget shrinks as better models are found. The
//! winning model is refitted on all of its inliers and the refit is kept when
//! it does not lose support.
use super::adaptive_iterations;
use super::normalize::hartley;
use super::projection::transfer_error;
use super::sampling::draw;
use crate::types::{Correspondence, Transform};
use nalgebra::{Matrix3, Point2, SMatrix, SVector, SymmetricEigen};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

const SAMPLE_SIZE: usize = 4;
/// Sine of the smallest angle accepted between two sample edges.
const COLLINEAR_SIN: f64 = 1e-3;
const MIN_ABS_DET: f64 = 1e-9;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct HomographyOptions {
    /// Fewer correspondences than this produce no estimate (at least 4).
    pub min_correspondences: usize,
    /// Inlier gate on forward transfer error, in primary-image pixels.
    pub reprojection_threshold: f64,
    pub confidence: f64,
    pub max_iterations: usize,
    pub seed: u64,
}

impl Default for HomographyOptions {
    fn default() -> Self {
        Self {
            min_correspondences: 8,
            reprojection_threshold: 3.0,
            confidence: 0.995,
            max_iterations: 2000,
            seed: 0x4d0d_e1,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HomographyEstimate {
    pub transform: Transform,
    /// Per-correspondence inlier flags, aligned with the input.
    pub inliers: Vec<bool>,
    pub inlier_count: usize,
    pub iterations: usize,
}

#[derive(Clone, Debug, Default)]
pub struct HomographyEstimator {
    options: HomographyOptions,
}

impl HomographyEstimator {
    pub fn new(options: HomographyOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &HomographyOptions {
        &self.options
    }

    /// Estimate the secondary → primary homography. Degenerate input gives `None`.
    pub fn estimate(&self, correspondences: &[Correspondence]) -> Option<HomographyEstimate> {
        let n = correspondences.len();
        if n < self.options.min_correspondences.max(SAMPLE_SIZE) {
            return None;
        }

        let max_iterations = self.options.max_iterations.max(1);
        let mut rng = StdRng::seed_from_u64(self.options.seed);
        let mut best: Option<(Transform, Vec<bool>, usize)> = None;
        let mut budget = max_iterations;
        let mut iterations = 0usize;

        while iterations < budget {
            iterations += 1;
            let idx: [usize; SAMPLE_SIZE] = draw(&mut rng, n);
            let sample = idx.map(|i| correspondences[i]);
            if has_collinear_triple(&sample.map(|c| c.secondary))
                || has_collinear_triple(&sample.map(|c| c.primary))
            {
                continue;
            }
            let Some(h) = fit_dlt(&sample) else {
                continue;
            };
            let (mask, count) = self.score(&h, correspondences);
            if best.as_ref().map_or(true, |(_, _, c)| count > *c) {
                budget = adaptive_iterations(
                    self.options.confidence,
                    count as f64 / n as f64,
                    SAMPLE_SIZE as i32,
                    max_iterations,
                )
                .max(iterations);
                best = Some((h, mask, count));
            }
        }

        let (mut transform, mut inliers, mut inlier_count) = best?;
        if inlier_count >= SAMPLE_SIZE {
            let support: Vec<Correspondence> = correspondences
                .iter()
                .zip(&inliers)
                .filter_map(|(c, &keep)| keep.then_some(*c))
                .collect();
            if let Some(refit) = fit_dlt(&support) {
                let (mask, count) = self.score(&refit, correspondences);
                if count >= inlier_count {
                    transform = refit;
                    inliers = mask;
                    inlier_count = count;
                }
            }
        }

        if inlier_count < SAMPLE_SIZE || !is_usable(&transform) {
            log::debug!(
                "homography rejected: inliers={} finite={}",
                inlier_count,
                transform.is_finite()
            );
            return None;
        }

        Some(HomographyEstimate {
            transform,
            inliers,
            inlier_count,
            iterations,
        })
    }

    fn score(&self, h: &Transform, correspondences: &[Correspondence]) -> (Vec<bool>, usize) {
        let threshold = self.options.reprojection_threshold;
        let mask: Vec<bool> = correspondences
            .iter()
            .map(|c| transfer_error(h, &c.secondary, &c.primary) < threshold)
            .collect();
        let count = mask.iter().filter(|&&m| m).count();
        (mask, count)
    }
}

fn is_usable(h: &Transform) -> bool {
    h.is_finite() && h.matrix().determinant().abs() > MIN_ABS_DET
}

/// Least-squares DLT over all given correspondences (at least four).
pub fn fit_dlt(correspondences: &[Correspondence]) -> Option<Transform> {
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
        let r1 = SVector::<f64, 9>::from_column_slice(&[
            -x,
            -y,
            -1.0,
            0.0,
            0.0,
            0.0,
            u * x,
            u * y,
            u,
        ]);
        let r2 = SVector::<f64, 9>::from_column_slice(&[
            0.0,
            0.0,
            0.0,
            -x,
            -y,
            -1.0,
            v * x,
            v * y,
            v,
        ]);
        ata += r1 * r1.transpose() + r2 * r2.transpose();
    }

    let hn = null_vector_3x3(ata);
    let h = t_dst.try_inverse()? * hn * t_src;
    let transform = Transform::new(h);
    transform.is_finite().then_some(transform)
}

/// Reshape the smallest-eigenvalue eigenvector of a 9×9 normal matrix into a
/// row-major 3×3 matrix.
pub(crate) fn null_vector_3x3(ata: SMatrix<f64, 9, 9>) -> Matrix3<f64> {
    let eig = SymmetricEigen::new(ata);
    let min_idx = eig
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(8);
    let h = eig.eigenvectors.column(min_idx);
    Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8])
}

fn has_collinear_triple(pts: &[Point2<f64>; SAMPLE_SIZE]) -> bool {
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIPLES.iter().any(|&[a, b, c]| {
        let ab = pts[b] - pts[a];
        let ac = pts[c] - pts[a];
        let cross = ab.x * ac.y - ab.y * ac.x;
        cross.abs() <= COLLINEAR_SIN * ab.norm() * ac.norm()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(h: &Matrix3<f64>, p: [f64; 2]) -> [f64; 2] {
        let v = h * nalgebra::Vector3::new(p[0], p[1], 1.0);
        [v.x / v.z, v.y / v.z]
    }

    fn grid_points() -> Vec<[f64; 2]> {
        let mut pts = Vec::new();
        for j in 0..6 {
            for i in 0..6 {
                pts.push([10.0 + 17.0 * i as f64 + (j % 2) as f64 * 3.0, 12.0 + 15.0 * j as f64]);
            }
        }
        pts
    }

    fn truth() -> Matrix3<f64> {
        Matrix3::new(0.9, 0.08, 12.0, -0.05, 1.1, -7.0, 1e-4, -2e-4, 1.0)
    }

    #[test]
    fn exact_four_point_fit_recovers_model() {
        let h = truth();
        let corr: Vec<Correspondence> = [[0.0, 0.0], [100.0, 0.0], [100.0, 80.0], [0.0, 80.0]]
            .iter()
            .map(|&p| Correspondence::new(p, project(&h, p)))
            .collect();
        let fit = fit_dlt(&corr).expect("fit");
        for (a, b) in fit.matrix().iter().zip(h.iter()) {
            assert!((a - b).abs() < 1e-6, "{a} vs {b}");
        }
    }

    #[test]
    fn ransac_tolerates_outliers() {
        let h = truth();
        let mut corr: Vec<Correspondence> = grid_points()
            .into_iter()
            .map(|p| Correspondence::new(p, project(&h, p)))
            .collect();
        let inlier_total = corr.len();
        for k in 0..12 {
            let p = [5.0 + 9.0 * k as f64, 90.0 - 6.0 * k as f64];
            let q = project(&h, p);
            corr.push(Correspondence::new(p, [q[0] + 40.0 + k as f64, q[1] - 35.0]));
        }
        let est = HomographyEstimator::default().estimate(&corr).expect("estimate");
        assert_eq!(est.inlier_count, inlier_total);
        assert!(est.inliers[..inlier_total].iter().all(|&m| m));
        assert!(est.inliers[inlier_total..].iter().all(|&m| !m));
        let p = est.transform.apply(&Point2::new(50.0, 50.0)).expect("finite");
        let q = project(&h, [50.0, 50.0]);
        assert!((p.x - q[0]).abs() < 1e-6 && (p.y - q[1]).abs() < 1e-6);
    }

    #[test]
    fn too_few_or_collinear_points_give_none() {
        let est = HomographyEstimator::default();
        let few: Vec<Correspondence> = (0..7)
            .map(|i| Correspondence::new([i as f64 * 10.0, (i * i) as f64], [i as f64, 0.0]))
            .collect();
        assert!(est.estimate(&few).is_none());
        let line: Vec<Correspondence> = (0..20)
            .map(|i| Correspondence::new([i as f64, 2.0 * i as f64], [i as f64 + 1.0, 2.0 * i as f64]))
            .collect();
        assert!(est.estimate(&line).is_none());
    }

    #[test]
    fn collinear_sample_detection() {
        let line = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 2.0),
            Point2::new(5.0, 0.0),
        ];
        assert!(has_collinear_triple(&line));
        let square = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(!has_collinear_triple(&square));
    }
}
