//! Grayscale image pyramid with configurable separable blur and 2× decimation.
//!
//! The pyramid converts level 0 from 8-bit grayscale to `ImageF32` in `[0, 1]`
//! and repeatedly downsamples by 2×. Prior to each decimation step an optional
//! separable filter (Gaussian by default) can be applied. Border samples clamp
//! to the image extents.
//!
//! The ORB-style extractor detects corners on every level and maps them back
//! to level-0 coordinates with [`Pyramid::scale_of`].

pub mod filters;
pub mod options;
mod pyramidbuild;

pub use filters::{blur, SeparableFilter, StaticSeparableFilter, GAUSSIAN_5TAP};
pub use options::PyramidOptions;
pub use pyramidbuild::Pyramid;
