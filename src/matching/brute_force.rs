//! Exhaustive search: Hamming distance for binary rows, L2 for float rows.
use super::{keep_nearest, DescriptorMatcher, Match};
use crate::error::MatchError;
use crate::features::Descriptors;

#[derive(Clone, Copy, Debug, Default)]
pub struct BruteForceMatcher;

impl DescriptorMatcher for BruteForceMatcher {
    fn knn_match(
        &self,
        query: &Descriptors,
        train: &Descriptors,
        k: usize,
    ) -> Result<Vec<Vec<Match>>, MatchError> {
        if query.is_empty() || train.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        match (query, train) {
            (Descriptors::Binary(q), Descriptors::Binary(t)) => Ok(q
                .iter()
                .enumerate()
                .map(|(qi, qd)| {
                    let all = t
                        .iter()
                        .enumerate()
                        .map(|(ti, td)| Match {
                            query_idx: qi,
                            train_idx: ti,
                            distance: qd.hamming(td) as f32,
                        })
                        .collect();
                    keep_nearest(all, k)
                })
                .collect()),
            (
                Descriptors::Float { dim: qdim, data: q },
                Descriptors::Float { dim: tdim, data: t },
            ) => {
                if qdim != tdim {
                    return Err(MatchError::DimensionMismatch {
                        query: *qdim,
                        train: *tdim,
                    });
                }
                Ok(q
                    .chunks_exact(*qdim)
                    .enumerate()
                    .map(|(qi, qrow)| {
                        let all = t
                            .chunks_exact(*tdim)
                            .enumerate()
                            .map(|(ti, trow)| Match {
                                query_idx: qi,
                                train_idx: ti,
                                distance: l2(qrow, trow),
                            })
                            .collect();
                        keep_nearest(all, k)
                    })
                    .collect())
            }
            _ => Err(MatchError::DescriptorMismatch {
                query: query.kind(),
                train: train.kind(),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "brute_force"
    }
}

#[inline]
fn l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::BinaryDescriptor;

    #[test]
    fn binary_neighbours_sorted_by_hamming() {
        let train = Descriptors::Binary(vec![
            BinaryDescriptor([0xff, 0, 0, 0]),
            BinaryDescriptor([0x1, 0, 0, 0]),
            BinaryDescriptor([0x0f, 0, 0, 0]),
        ]);
        let query = Descriptors::Binary(vec![BinaryDescriptor([0, 0, 0, 0])]);
        let knn = BruteForceMatcher.knn_match(&query, &train, 2).expect("match");
        assert_eq!(knn.len(), 1);
        let idx: Vec<usize> = knn[0].iter().map(|m| m.train_idx).collect();
        assert_eq!(idx, vec![1, 2]);
        assert_eq!(knn[0][0].distance, 1.0);
        assert_eq!(knn[0][1].distance, 4.0);
    }

    #[test]
    fn float_neighbours_use_euclidean_distance() {
        let train = Descriptors::Float {
            dim: 2,
            data: vec![3.0, 4.0, 1.0, 0.0],
        };
        let query = Descriptors::Float {
            dim: 2,
            data: vec![0.0, 0.0],
        };
        let knn = BruteForceMatcher.knn_match(&query, &train, 2).expect("match");
        assert_eq!(knn[0][0].train_idx, 1);
        assert!((knn[0][1].distance - 5.0).abs() < 1e-6);
    }

    #[test]
    fn mixed_kinds_are_rejected() {
        let binary = Descriptors::Binary(vec![BinaryDescriptor::default()]);
        let float = Descriptors::Float {
            dim: 1,
            data: vec![0.5],
        };
        let err = BruteForceMatcher
            .knn_match(&binary, &float, 2)
            .expect_err("mismatch");
        assert!(matches!(err, MatchError::DescriptorMismatch { .. }));
    }

    #[test]
    fn empty_side_gives_empty_result() {
        let binary = Descriptors::Binary(vec![BinaryDescriptor::default()]);
        let empty = Descriptors::Binary(Vec::new());
        assert!(BruteForceMatcher.knn_match(&binary, &empty, 2).expect("ok").is_empty());
        assert!(BruteForceMatcher.knn_match(&empty, &binary, 2).expect("ok").is_empty());
    }
}
