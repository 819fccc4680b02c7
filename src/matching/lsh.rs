//! Locality-sensitive hashing for binary descriptors.
//!
//! Each table hashes a descriptor to the `key_size` bits it samples. Lookups
//! also probe every bucket within `multi_probe_level` bit flips of the query
//! key, then rank the union of candidates by exact Hamming distance. The index
//! is rebuilt from the train set on every call.
use super::{keep_nearest, DescriptorMatcher, Match};
use crate::error::MatchError;
use crate::features::{BinaryDescriptor, Descriptors};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Largest key a table can hold.
pub const MAX_KEY_SIZE: usize = 32;
/// Bit flips probed around a key. Level 4 over a 32-bit key already means
/// 41 449 buckets per table and query.
pub const MAX_MULTI_PROBE_LEVEL: usize = 4;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct LshOptions {
    pub table_number: usize,
    /// Sampled bits per key, `1..=MAX_KEY_SIZE`.
    pub key_size: usize,
    /// `0..=MAX_MULTI_PROBE_LEVEL`.
    pub multi_probe_level: usize,
    pub seed: u64,
}

impl LshOptions {
    /// Describe the first out-of-range setting, if any.
    pub fn check(&self) -> Option<String> {
        if self.table_number == 0 {
            return Some("matcher.table_number must be at least 1".to_string());
        }
        if !(1..=MAX_KEY_SIZE).contains(&self.key_size) {
            return Some(format!(
                "matcher.key_size must be in 1..={MAX_KEY_SIZE}, got {}",
                self.key_size
            ));
        }
        if self.multi_probe_level > MAX_MULTI_PROBE_LEVEL {
            return Some(format!(
                "matcher.multi_probe_level must be at most {MAX_MULTI_PROBE_LEVEL}, got {}",
                self.multi_probe_level
            ));
        }
        None
    }
}

impl Default for LshOptions {
    fn default() -> Self {
        Self {
            table_number: 20,
            key_size: 10,
            multi_probe_level: 2,
            seed: 0x5eed,
        }
    }
}

#[derive(Clone, Debug)]
struct HashTable {
    bits: Vec<usize>,
    buckets: HashMap<u32, Vec<usize>>,
}

impl HashTable {
    fn key(&self, d: &BinaryDescriptor) -> u32 {
        self.bits
            .iter()
            .enumerate()
            .fold(0u32, |key, (i, &bit)| key | ((d.bit(bit) as u32) << i))
    }
}

#[derive(Clone, Debug)]
pub struct LshMatcher {
    options: LshOptions,
    /// Sampled bit positions per table, fixed at construction.
    table_bits: Vec<Vec<usize>>,
    /// XOR masks of every probe within `multi_probe_level` flips, nearest first.
    probes: Vec<u32>,
}

impl LshMatcher {
    /// Out-of-range options are clamped here; [`LshOptions::check`] reports
    /// them instead.
    pub fn new(options: LshOptions) -> Self {
        let key_size = options.key_size.clamp(1, MAX_KEY_SIZE);
        let mut rng = StdRng::seed_from_u64(options.seed);
        let table_bits = (0..options.table_number.max(1))
            .map(|_| sample(&mut rng, BinaryDescriptor::BITS, key_size).into_vec())
            .collect();
        let probes = probe_masks(key_size, options.multi_probe_level.min(MAX_MULTI_PROBE_LEVEL));
        Self {
            options,
            table_bits,
            probes,
        }
    }

    pub fn options(&self) -> &LshOptions {
        &self.options
    }

    fn build_tables(&self, train: &[BinaryDescriptor]) -> Vec<HashTable> {
        self.table_bits
            .iter()
            .map(|bits| {
                let mut table = HashTable {
                    bits: bits.clone(),
                    buckets: HashMap::new(),
                };
                for (idx, d) in train.iter().enumerate() {
                    let key = table.key(d);
                    table.buckets.entry(key).or_default().push(idx);
                }
                table
            })
            .collect()
    }
}

impl Default for LshMatcher {
    fn default() -> Self {
        Self::new(LshOptions::default())
    }
}

impl DescriptorMatcher for LshMatcher {
    fn knn_match(
        &self,
        query: &Descriptors,
        train: &Descriptors,
        k: usize,
    ) -> Result<Vec<Vec<Match>>, MatchError> {
        if query.is_empty() || train.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let (q, t) = match (query, train) {
            (Descriptors::Binary(q), Descriptors::Binary(t)) => (q, t),
            (Descriptors::Float { .. }, Descriptors::Float { .. }) => {
                return Err(MatchError::Unsupported {
                    matcher: self.name(),
                    kind: query.kind(),
                })
            }
            _ => {
                return Err(MatchError::DescriptorMismatch {
                    query: query.kind(),
                    train: train.kind(),
                })
            }
        };

        let tables = self.build_tables(t);
        let mut seen = vec![usize::MAX; t.len()];
        let mut out = Vec::with_capacity(q.len());
        for (qi, qd) in q.iter().enumerate() {
            let mut candidates = Vec::new();
            for table in &tables {
                let key = table.key(qd);
                for mask in &self.probes {
                    let Some(bucket) = table.buckets.get(&(key ^ mask)) else {
                        continue;
                    };
                    for &ti in bucket {
                        if seen[ti] == qi {
                            continue;
                        }
                        seen[ti] = qi;
                        candidates.push(Match {
                            query_idx: qi,
                            train_idx: ti,
                            distance: qd.hamming(&t[ti]) as f32,
                        });
                    }
                }
            }
            out.push(keep_nearest(candidates, k));
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "lsh"
    }
}

/// All masks over `key_size` bits with at most `level` bits set, by popcount.
fn probe_masks(key_size: usize, level: usize) -> Vec<u32> {
    let mut masks = vec![0u32];
    let mut frontier = vec![(0u32, 0usize)];
    for _ in 0..level.min(key_size) {
        let mut next = Vec::new();
        for &(mask, start) in &frontier {
            for bit in start..key_size {
                let m = mask | (1u32 << bit);
                masks.push(m);
                next.push((m, bit + 1));
            }
        }
        frontier = next;
    }
    masks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::BruteForceMatcher;
    use rand::Rng;

    #[test]
    fn probe_count_matches_binomial_sum() {
        // 1 + C(10,1) + C(10,2)
        assert_eq!(probe_masks(10, 2).len(), 56);
        assert_eq!(probe_masks(4, 0), vec![0]);
    }

    #[test]
    fn out_of_range_options_are_reported_and_clamped() {
        assert!(LshOptions::default().check().is_none());
        let wide = LshOptions {
            table_number: 0,
            key_size: 64,
            multi_probe_level: 7,
            ..LshOptions::default()
        };
        assert!(wide.check().is_some());
        let deep = LshOptions {
            key_size: 32,
            multi_probe_level: 16,
            ..LshOptions::default()
        };
        assert!(deep.check().expect("too deep").contains("multi_probe_level"));

        // 1 + 32 + 496 + 4960 + 35960
        let matcher = LshMatcher::new(deep);
        assert_eq!(matcher.probes.len(), 41_449);
        assert_eq!(LshMatcher::new(wide).table_bits.len(), 1);
    }

    #[test]
    fn float_descriptors_are_unsupported() {
        let float = Descriptors::Float {
            dim: 2,
            data: vec![0.0, 1.0],
        };
        let err = LshMatcher::default()
            .knn_match(&float, &float, 2)
            .expect_err("unsupported");
        assert!(matches!(err, MatchError::Unsupported { .. }));
    }

    #[test]
    fn agrees_with_brute_force_on_near_duplicates() {
        let mut rng = StdRng::seed_from_u64(11);
        let train: Vec<BinaryDescriptor> = (0..200)
            .map(|_| BinaryDescriptor([rng.gen(), rng.gen(), rng.gen(), rng.gen()]))
            .collect();
        // Two flipped bits can change at most two key bits per table, which
        // the second probe level still reaches.
        let query: Vec<BinaryDescriptor> = train
            .iter()
            .step_by(5)
            .map(|d| {
                let mut q = *d;
                for bit in sample(&mut rng, 256, 2).into_iter() {
                    q.0[bit / 64] ^= 1u64 << (bit % 64);
                }
                q
            })
            .collect();
        let query = Descriptors::Binary(query);
        let train = Descriptors::Binary(train);
        let lsh = LshMatcher::default().knn_match(&query, &train, 2).expect("lsh");
        let bf = BruteForceMatcher.knn_match(&query, &train, 2).expect("bf");
        assert_eq!(lsh.len(), bf.len());
        for (a, b) in lsh.iter().zip(&bf) {
            assert_eq!(a[0].train_idx, b[0].train_idx);
            assert_eq!(a[0].distance, 2.0);
        }
    }
}
