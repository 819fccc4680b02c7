use rand::rngs::StdRng;
use rand::seq::index::sample;

/// `k` distinct indices out of `n`; the caller guarantees `k <= n`.
pub(crate) fn draw<const K: usize>(rng: &mut StdRng, n: usize) -> [usize; K] {
    let picked = sample(rng, n, K);
    let mut out = [0usize; K];
    for (slot, idx) in out.iter_mut().zip(picked.into_iter()) {
        *slot = idx;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn indices_are_distinct_and_in_range() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let s: [usize; 4] = draw(&mut rng, 6);
            for i in 0..4 {
                assert!(s[i] < 6);
                for j in i + 1..4 {
                    assert_ne!(s[i], s[j]);
                }
            }
        }
    }
}
