//! Tracking pipeline and session.
//!
//! - [`Pipeline`] runs one stateless cycle and takes the feedback transform
//!   as an argument.
//! - [`TrackingSession`] owns the feedback slot and the
//!   [`TrackingState`] machine and calls the pipeline once per frame pair.
//! - [`TrackerConfig`] gathers the options of every stage.
pub mod options;
mod pipeline;
mod session;
mod state;

pub use options::{SessionOptions, TrackerConfig};
pub use pipeline::{CycleInput, CycleOutput, Pipeline};
pub use session::TrackingSession;
pub use state::TrackingState;
