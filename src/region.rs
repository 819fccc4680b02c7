//! Tracked-region record: the template outline projected into the primary frame.
use crate::geometry::apply_homography_points;
use crate::types::Transform;
use serde::{Deserialize, Serialize};

/// Projections farther than this many pixels are treated as degenerate.
const MAX_PROJECTED_COORD: f64 = 1e7;

/// Template rectangle used for projection.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TemplateSize {
    /// Width and height of the secondary image of the cycle.
    #[default]
    SecondaryImage,
    Fixed { width: f64, height: f64 },
}

impl TemplateSize {
    pub fn resolve(&self, secondary_width: usize, secondary_height: usize) -> (f64, f64) {
        match self {
            TemplateSize::SecondaryImage => (secondary_width as f64, secondary_height as f64),
            TemplateSize::Fixed { width, height } => (*width, *height),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct RegionOptions {
    pub id: i32,
    pub template: TemplateSize,
}

impl Default for RegionOptions {
    fn default() -> Self {
        Self {
            id: 420,
            template: TemplateSize::SecondaryImage,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedRegion {
    pub id: i32,
    /// True on the first cycle after acquiring (or re-acquiring) the target.
    pub reacquisition: bool,
    pub aspect_ratio: f32,
    pub time_msec: i64,
    /// Corners normalized by the primary size, counter-clockwise from the
    /// projected template top-left.
    pub vertices: [[f32; 2]; 4],
}

impl TrackedRegion {
    /// `x0, y0, …, x3, y3`.
    pub fn to_floats(&self) -> [f32; 8] {
        let mut out = [0.0f32; 8];
        for (i, v) in self.vertices.iter().enumerate() {
            out[2 * i] = v[0];
            out[2 * i + 1] = v[1];
        }
        out
    }
}

/// Inputs to [`project_region`] beyond the transform.
#[derive(Clone, Copy, Debug)]
pub struct RegionFrame {
    pub template: (f64, f64),
    pub primary: (usize, usize),
    pub time_msec: i64,
    pub reacquisition: bool,
}

/// Project the template outline through `transform`. `None` when the primary
/// frame is empty or any corner projects to infinity.
pub fn project_region(transform: &Transform, frame: RegionFrame, id: i32) -> Option<TrackedRegion> {
    let (pw, ph) = frame.primary;
    if pw == 0 || ph == 0 {
        return None;
    }
    let (tw, th) = frame.template;
    let corners = [[0.0, 0.0], [tw, 0.0], [tw, th], [0.0, th]];
    let projected = apply_homography_points(transform, &corners)?;
    if projected
        .iter()
        .any(|p| p[0].abs() > MAX_PROJECTED_COORD || p[1].abs() > MAX_PROJECTED_COORD)
    {
        return None;
    }
    let (pw, ph) = (pw as f64, ph as f64);
    let vertices = [0usize, 3, 2, 1].map(|i| {
        let p = projected[i];
        [(p[0] / pw) as f32, (p[1] / ph) as f32]
    });
    Some(TrackedRegion {
        id,
        reacquisition: frame.reacquisition,
        aspect_ratio: (pw / ph) as f32,
        time_msec: frame.time_msec,
        vertices,
    })
}
