//! Feature extraction: keypoints plus descriptors from one grayscale image.
//!
//! Two extractors are provided and chosen through [`ExtractorConfig`]:
//! - [`OrbExtractor`]: FAST-9 + Harris + rotated 256-bit BRIEF over a pyramid.
//! - [`PatchExtractor`]: FAST-9 + 64-dim zero-mean unit-norm float patches.
//!
//! Extractors never fail. Images that are empty or smaller than the detector
//! border produce an empty [`FeatureSet`].
pub mod brief;
pub mod fast;
pub mod gradient;
pub mod orb;
pub mod patch;
pub mod types;

pub use orb::{OrbExtractor, OrbOptions};
pub use patch::{PatchExtractor, PatchOptions, PATCH_DESCRIPTOR_DIM};
pub use types::{BinaryDescriptor, Descriptors, FeatureSet, KeyPoint};

use crate::image::ImageU8;
use serde::{Deserialize, Serialize};

/// Capability shared by all extractors. Implementations are called from the
/// worker pool, two at a time.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, image: ImageU8<'_>) -> FeatureSet;

    fn name(&self) -> &'static str;
}

/// Extractor selection, tagged by `kind` in JSON.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractorConfig {
    Orb(OrbOptions),
    Patch(PatchOptions),
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig::Orb(OrbOptions::default())
    }
}

impl ExtractorConfig {
    pub fn max_features(&self) -> usize {
        match self {
            ExtractorConfig::Orb(o) => o.max_features,
            ExtractorConfig::Patch(p) => p.max_features,
        }
    }

    pub fn build(&self) -> Box<dyn FeatureExtractor> {
        match self {
            ExtractorConfig::Orb(o) => Box::new(OrbExtractor::new(o.clone())),
            ExtractorConfig::Patch(p) => Box::new(PatchExtractor::new(p.clone())),
        }
    }
}
