use nalgebra::{Matrix3, Point2, Vector3};
use serde::{Deserialize, Serialize};

const NORMALIZE_EPS: f64 = 1e-12;

/// Projective transform mapping secondary-image pixels to primary-image
/// pixels. Replaced as a whole, never edited in place.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform(Matrix3<f64>);

impl Transform {
    /// Wrap `m`, rescaling so that `m[(2, 2)] == 1` unless that entry is near zero.
    pub fn new(m: Matrix3<f64>) -> Self {
        let h22 = m[(2, 2)];
        if h22.abs() > NORMALIZE_EPS && h22.is_finite() {
            Self(m / h22)
        } else {
            Self(m)
        }
    }

    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self(Matrix3::new(1.0, 0.0, tx, 0.0, 1.0, ty, 0.0, 0.0, 1.0))
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// Map a point; `None` when it lands on or near the line at infinity.
    pub fn apply(&self, p: &Point2<f64>) -> Option<Point2<f64>> {
        let v = self.0 * Vector3::new(p.x, p.y, 1.0);
        let w = v[2];
        if !w.is_finite() || w.abs() <= 1e-9 || !v[0].is_finite() || !v[1].is_finite() {
            return None;
        }
        Some(Point2::new(v[0] / w, v[1] / w))
    }

    /// Row-major entries.
    pub fn to_row_major(&self) -> [f64; 9] {
        let m = &self.0;
        [
            m[(0, 0)],
            m[(0, 1)],
            m[(0, 2)],
            m[(1, 0)],
            m[(1, 1)],
            m[(1, 2)],
            m[(2, 0)],
            m[(2, 1)],
            m[(2, 2)],
        ]
    }
}

impl From<Matrix3<f64>> for Transform {
    fn from(m: Matrix3<f64>) -> Self {
        Transform::new(m)
    }
}

/// A matched point pair: `secondary` in the template, `primary` in the live frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Correspondence {
    pub secondary: Point2<f64>,
    pub primary: Point2<f64>,
}

impl Correspondence {
    pub fn new(secondary: [f64; 2], primary: [f64; 2]) -> Self {
        Self {
            secondary: Point2::new(secondary[0], secondary[1]),
            primary: Point2::new(primary[0], primary[1]),
        }
    }
}
