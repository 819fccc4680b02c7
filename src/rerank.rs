//! Pick which of several candidate templates best matches one frame.
//!
//! Each candidate's descriptors are matched (k = 2) against the frame's and
//! the ratio-test survivors are counted. The candidate with the most
//! survivors wins, provided it beats `min_match_count`.
//!
//! Candidates usually arrive as one string: base64 blocks of packed 32-byte
//! ORB rows joined by `'|'`, see [`parse_query_features`].
use crate::error::Result;
use crate::features::Descriptors;
use crate::matching::{ratio_test, BruteForceMatcher, DescriptorMatcher};
use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;

pub struct Reranker {
    matcher: Box<dyn DescriptorMatcher>,
    ratio_threshold: f32,
    /// Counts must exceed this to be selected.
    min_match_count: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RerankResult {
    pub best: Option<usize>,
    pub match_counts: Vec<usize>,
}

impl Default for Reranker {
    fn default() -> Self {
        Self::new(Box::new(BruteForceMatcher), 0.75, 20)
    }
}

impl Reranker {
    pub fn new(matcher: Box<dyn DescriptorMatcher>, ratio_threshold: f32, min_match_count: usize) -> Self {
        Self {
            matcher,
            ratio_threshold,
            min_match_count,
        }
    }

    pub fn rerank(&self, frame: &Descriptors, candidates: &[Descriptors]) -> RerankResult {
        if frame.is_empty() || candidates.is_empty() {
            return RerankResult {
                best: None,
                match_counts: vec![0; candidates.len()],
            };
        }
        let match_counts: Vec<usize> = candidates
            .iter()
            .enumerate()
            .map(|(i, candidate)| match self.matcher.knn_match(candidate, frame, 2) {
                Ok(knn) => ratio_test(&knn, self.ratio_threshold).len(),
                Err(err) => {
                    log::warn!("rerank: candidate {i} skipped: {err}");
                    0
                }
            })
            .collect();

        let mut best = None;
        let mut best_count = self.min_match_count;
        for (i, &count) in match_counts.iter().enumerate() {
            if count > best_count {
                best = Some(i);
                best_count = count;
            }
        }
        RerankResult { best, match_counts }
    }
}

/// Decode packed binary descriptor blocks (runs of 32-byte rows) into
/// candidates. Empty blocks are skipped.
pub fn split_candidates(blocks: &[&[u8]]) -> Vec<Descriptors> {
    blocks
        .iter()
        .filter(|b| !b.is_empty())
        .map(|b| Descriptors::from_packed_bytes(b))
        .collect()
}

/// Decode a `'|'`-separated list of base64 descriptor blocks. Empty
/// segments are skipped; a block that is not valid base64 fails the whole
/// list.
pub fn parse_query_features(input: &str) -> Result<Vec<Descriptors>> {
    let blocks = input
        .split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| general_purpose::STANDARD.decode(s))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let refs: Vec<&[u8]> = blocks.iter().map(Vec::as_slice).collect();
    Ok(split_candidates(&refs))
}
