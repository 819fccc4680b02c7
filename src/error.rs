//! Error types.
//!
//! Only setup and I/O failures are errors. Per-cycle "no result" conditions are
//! reported through [`crate::diagnostics::SkipReason`] instead.
use thiserror::Error;

/// Fatal errors surfaced before any tracking cycle runs, plus I/O helpers.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Faults raised by a descriptor matcher. The tracking cycle logs these and
/// treats them as "no match".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("descriptor type mismatch: query is {query}, train is {train}")]
    DescriptorMismatch {
        query: &'static str,
        train: &'static str,
    },

    #[error("float descriptor dimensions differ: {query} vs {train}")]
    DimensionMismatch { query: usize, train: usize },

    #[error("{matcher} matcher does not support {kind} descriptors")]
    Unsupported {
        matcher: &'static str,
        kind: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, TrackerError>;
