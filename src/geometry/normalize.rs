//! Hartley normalization: centroid to the origin, mean distance √2.
use nalgebra::{Matrix3, Point2};

const MIN_SPREAD: f64 = 1e-9;

/// Similarity `T` and the normalized points `T·p`. `None` when all points coincide.
pub(crate) fn hartley(points: &[Point2<f64>]) -> Option<(Matrix3<f64>, Vec<Point2<f64>>)> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / n;
    let mean_dist = points
        .iter()
        .map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    if !mean_dist.is_finite() || mean_dist < MIN_SPREAD {
        return None;
    }
    let s = std::f64::consts::SQRT_2 / mean_dist;
    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = points
        .iter()
        .map(|p| Point2::new(s * (p.x - cx), s * (p.y - cy)))
        .collect();
    Some((t, normalized))
}
