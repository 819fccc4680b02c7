use crate::types::Transform;
use nalgebra::Point2;

/// Map every point through `h`; `None` if any point projects to infinity or
/// to a non-finite location.
pub fn apply_homography_points(h: &Transform, pts: &[[f64; 2]]) -> Option<Vec<[f64; 2]>> {
    let mut out = Vec::with_capacity(pts.len());
    for &p in pts {
        let q = h.apply(&Point2::new(p[0], p[1]))?;
        out.push([q.x, q.y]);
    }
    Some(out)
}

/// Forward transfer error `‖h·secondary − primary‖`, infinite when `secondary`
/// maps to infinity.
pub(crate) fn transfer_error(h: &Transform, secondary: &Point2<f64>, primary: &Point2<f64>) -> f64 {
    match h.apply(secondary) {
        Some(q) => (q - primary).norm(),
        None => f64::INFINITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_moves_all_points() {
        let h = Transform::translation(10.0, -2.0);
        let out = apply_homography_points(&h, &[[0.0, 0.0], [5.0, 5.0]]).expect("finite");
        assert_eq!(out, vec![[10.0, -2.0], [15.0, 3.0]]);
        let err = transfer_error(&h, &Point2::new(1.0, 1.0), &Point2::new(11.0, 2.0));
        assert!((err - 3.0).abs() < 1e-12);
    }
}
