use super::filters::{StaticSeparableFilter, GAUSSIAN_5TAP};

use serde::Deserialize;

/// How the ORB extractor builds its scale space.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct PyramidOptions {
    /// Levels including the full-resolution one (>= 1).
    pub levels: usize,
    /// Downscale steps, counted from level 0, that blur before decimating.
    /// `0` means plain decimation everywhere.
    pub blur_levels: usize,
    #[serde(skip)]
    pub filter: StaticSeparableFilter,
}

impl Default for PyramidOptions {
    fn default() -> Self {
        Self::new(4).with_blur_levels(usize::MAX)
    }
}

impl PyramidOptions {
    pub fn new(levels: usize) -> Self {
        Self {
            levels,
            blur_levels: 0,
            filter: GAUSSIAN_5TAP,
        }
    }

    pub fn with_blur_levels(mut self, blur_levels: usize) -> Self {
        self.blur_levels = blur_levels;
        self
    }

    /// Whether the step producing level `index` from `index - 1` blurs.
    pub fn blurs_into(&self, index: usize) -> bool {
        index >= 1 && index - 1 < self.blur_levels
    }
}
