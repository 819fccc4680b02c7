#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod image;
pub mod region;
pub mod tracker;
pub mod types;

// Building blocks, usable on their own.
pub mod features;
pub mod geometry;
pub mod matching;
pub mod overlay;
pub mod pyramid;
pub mod rerank;
pub mod stabilizer;

// --- High-level re-exports -------------------------------------------------

pub use crate::error::{MatchError, Result, TrackerError};
pub use crate::overlay::{overlay, OverlayOptions};
pub use crate::region::{TemplateSize, TrackedRegion};
pub use crate::tracker::{
    CycleInput, CycleOutput, Pipeline, TrackerConfig, TrackingSession, TrackingState,
};
pub use crate::types::{Correspondence, Transform};

pub use crate::diagnostics::{CycleOutcome, CycleReport, SkipReason};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use planar_tracker::prelude::*;
///
/// # fn main() -> planar_tracker::Result<()> {
/// let (w, h) = (640usize, 480usize);
/// let live = vec![0u8; w * h];
/// let template = vec![0u8; 320 * 240];
///
/// let mut session = TrackingSession::new(TrackerConfig::default())?;
/// let out = session.process(&CycleInput {
///     primary: ImageFrame::new(w, h, PixelFormat::Gray8, &live),
///     secondary: ImageFrame::new(320, 240, PixelFormat::Gray8, &template),
///     time_msec: 0,
/// });
/// if let Some(region) = out.region {
///     println!("quad={:?}", region.to_floats());
/// }
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::{ImageFrame, ImageU8, PixelFormat};
    pub use crate::{
        CycleInput, CycleOutput, TrackedRegion, TrackerConfig, TrackingSession, Transform,
    };
}
