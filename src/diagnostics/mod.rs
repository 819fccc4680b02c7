//! Diagnostics emitted alongside every tracking cycle.
//!
//! [`CycleReport`] records stage counts, timings and the cycle outcome. A
//! cycle that produced no region names its [`SkipReason`].
pub mod cycle;
pub mod timing;

pub use cycle::{
    CycleOutcome, CycleReport, EpipolarStage, ExtractionStage, HomographyStage, InputDescriptor,
    MatchingStage, SkipReason, StabilizerStage,
};
pub use timing::{StageTiming, TimingBreakdown};
