//! Keypoints and descriptor blocks produced by the extractors.
use serde::Serialize;

/// Detected interest point in level-0 pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPoint {
    pub x: f32,
    pub y: f32,
    /// Diameter of the described neighbourhood at level 0.
    pub size: f32,
    /// Intensity-centroid orientation in radians.
    pub angle: f32,
    /// Harris response; larger is stronger.
    pub response: f32,
    /// Pyramid level the point was detected on.
    pub octave: u32,
}

/// 256-bit binary descriptor stored as four little-endian words.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BinaryDescriptor(pub [u64; 4]);

impl BinaryDescriptor {
    pub const BYTES: usize = 32;
    pub const BITS: usize = 256;

    #[inline]
    pub fn hamming(&self, other: &Self) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }

    #[inline]
    pub fn bit(&self, index: usize) -> bool {
        (self.0[index / 64] >> (index % 64)) & 1 == 1
    }

    #[inline]
    pub fn set_bit(&mut self, index: usize) {
        self.0[index / 64] |= 1u64 << (index % 64);
    }

    /// Bit `i` of the descriptor is bit `i % 8` of byte `i / 8`.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        let mut words = [0u64; 4];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            *word = u64::from_le_bytes(buf);
        }
        Self(words)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (chunk, word) in out.chunks_exact_mut(8).zip(self.0.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }
}

/// Descriptor block of one feature set. All rows share one kind.
#[derive(Clone, Debug, PartialEq)]
pub enum Descriptors {
    Binary(Vec<BinaryDescriptor>),
    /// Row-major `len × dim` float rows.
    Float { dim: usize, data: Vec<f32> },
}

impl Default for Descriptors {
    fn default() -> Self {
        Descriptors::Binary(Vec::new())
    }
}

impl Descriptors {
    pub fn kind(&self) -> &'static str {
        match self {
            Descriptors::Binary(_) => "binary",
            Descriptors::Float { .. } => "float",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Descriptors::Binary(rows) => rows.len(),
            Descriptors::Float { dim, data } => {
                if *dim == 0 {
                    0
                } else {
                    data.len() / dim
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row `i` of a float block.
    pub fn float_row(&self, i: usize) -> Option<&[f32]> {
        match self {
            Descriptors::Float { dim, data } => data.get(i * dim..(i + 1) * dim),
            Descriptors::Binary(_) => None,
        }
    }

    /// Decode a packed byte stream of consecutive 32-byte binary descriptors.
    ///
    /// A trailing partial chunk is ignored.
    pub fn from_packed_bytes(bytes: &[u8]) -> Self {
        let rows = bytes
            .chunks_exact(BinaryDescriptor::BYTES)
            .map(|chunk| {
                let mut buf = [0u8; 32];
                buf.copy_from_slice(chunk);
                BinaryDescriptor::from_bytes(&buf)
            })
            .collect();
        Descriptors::Binary(rows)
    }
}

/// Keypoints with one descriptor row per keypoint.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureSet {
    pub keypoints: Vec<KeyPoint>,
    pub descriptors: Descriptors,
}

impl FeatureSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}
