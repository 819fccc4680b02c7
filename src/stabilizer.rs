//! Temporal damping of the per-cycle homography.
//!
//! With `Δ = ‖H_new − H_prev‖_F`, a jump larger than `max_change_threshold`
//! is pulled back towards the previous transform with weight
//! `w = threshold / Δ`: `w·H_new + (1 − w)·H_prev`. Smaller changes pass
//! through untouched. There is no motion model, so fast targets lag.
use crate::types::Transform;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct StabilizerOptions {
    pub max_change_threshold: f64,
}

impl Default for StabilizerOptions {
    fn default() -> Self {
        Self {
            max_change_threshold: 1.14,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct TemporalStabilizer {
    options: StabilizerOptions,
}

impl TemporalStabilizer {
    pub fn new(options: StabilizerOptions) -> Self {
        Self { options }
    }

    pub fn stabilize(&self, current: &Transform, previous: Option<&Transform>) -> Transform {
        self.blend(current, previous).transform
    }

    /// Like [`stabilize`](Self::stabilize), also reporting `Δ` and whether damping applied.
    pub fn blend(&self, current: &Transform, previous: Option<&Transform>) -> Stabilized {
        let Some(previous) = previous else {
            return Stabilized {
                transform: *current,
                delta: None,
                damped: false,
            };
        };
        let delta = (current.matrix() - previous.matrix()).norm();
        let threshold = self.options.max_change_threshold;
        if !delta.is_finite() || delta <= threshold {
            return Stabilized {
                transform: *current,
                delta: Some(delta),
                damped: false,
            };
        }
        let w = threshold / delta;
        log::trace!("stabilizer: delta={delta:.3} weight={w:.3}");
        Stabilized {
            transform: Transform::new(current.matrix() * w + previous.matrix() * (1.0 - w)),
            delta: Some(delta),
            damped: true,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Stabilized {
    pub transform: Transform,
    /// Frobenius distance to the previous transform, if there was one.
    pub delta: Option<f64>,
    pub damped: bool,
}
