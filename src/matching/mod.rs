//! Descriptor matching: k-nearest-neighbour search plus the ratio test.
pub mod brute_force;
pub mod lsh;

pub use brute_force::BruteForceMatcher;
pub use lsh::{LshMatcher, LshOptions};

use crate::error::MatchError;
use crate::features::Descriptors;
use serde::{Deserialize, Serialize};

/// Query row `query_idx` (primary image) paired with train row `train_idx`
/// (secondary image).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: f32,
}

/// Capability shared by matchers.
pub trait DescriptorMatcher: Send + Sync {
    /// For every query row, up to `k` train neighbours in ascending distance.
    /// Either side empty gives an empty result.
    fn knn_match(
        &self,
        query: &Descriptors,
        train: &Descriptors,
        k: usize,
    ) -> Result<Vec<Vec<Match>>, MatchError>;

    fn name(&self) -> &'static str;
}

/// Keep the best neighbour of each entry when it has a second neighbour and
/// `best < ratio · second`.
pub fn ratio_test(knn: &[Vec<Match>], ratio: f32) -> Vec<Match> {
    knn.iter()
        .filter_map(|neighbours| match neighbours.as_slice() {
            [best, second, ..] if best.distance < ratio * second.distance => Some(*best),
            _ => None,
        })
        .collect()
}

/// Matcher selection, tagged by `kind` in JSON.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatcherConfig {
    #[default]
    BruteForce,
    Lsh(LshOptions),
}

impl MatcherConfig {
    pub fn build(&self) -> Box<dyn DescriptorMatcher> {
        match self {
            MatcherConfig::BruteForce => Box::new(BruteForceMatcher),
            MatcherConfig::Lsh(opts) => Box::new(LshMatcher::new(opts.clone())),
        }
    }
}

/// Keep the `k` smallest-distance entries in ascending order.
pub(crate) fn keep_nearest(mut candidates: Vec<Match>, k: usize) -> Vec<Match> {
    candidates.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then(a.train_idx.cmp(&b.train_idx))
    });
    candidates.truncate(k);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(train_idx: usize, distance: f32) -> Match {
        Match {
            query_idx: 0,
            train_idx,
            distance,
        }
    }

    #[test]
    fn ratio_test_keeps_only_distinctive_matches() {
        let knn = vec![
            vec![m(1, 10.0), m(2, 20.0)],
            vec![m(3, 16.0), m(4, 20.0)],
            vec![m(5, 1.0)],
            vec![],
        ];
        let kept = ratio_test(&knn, 0.75);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].train_idx, 1);
    }

    #[test]
    fn ratio_test_is_strict() {
        let knn = vec![vec![m(1, 15.0), m(2, 20.0)]];
        assert!(ratio_test(&knn, 0.75).is_empty());
        // Two zero-distance neighbours are ambiguous.
        let knn = vec![vec![m(1, 0.0), m(2, 0.0)]];
        assert!(ratio_test(&knn, 0.75).is_empty());
    }

    #[test]
    fn matcher_config_parses_kind() {
        let cfg: MatcherConfig = serde_json::from_str(r#"{"kind":"lsh","table_number":4}"#)
            .expect("parse");
        match cfg {
            MatcherConfig::Lsh(opts) => {
                assert_eq!(opts.table_number, 4);
                assert_eq!(opts.key_size, 10);
            }
            MatcherConfig::BruteForce => panic!("expected lsh"),
        }
        assert_eq!(MatcherConfig::default().build().name(), "brute_force");
    }
}
