//! JSON configuration files.
//!
//! - [`load_tracker_config`]: a bare [`TrackerConfig`](crate::tracker::TrackerConfig).
//! - [`load_config`]: the demo runner's file, naming the template, the frame
//!   sequence and the output path next to the tracker options.
pub mod demo;

pub use demo::{load_config, load_tracker_config, DemoConfig, OutputConfig};
