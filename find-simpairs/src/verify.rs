//! Verification of candidate pairs against a similarity measure.
use hashbrown::HashSet;
use lsh::{SignatureMatrix, SignatureValue};
use rayon::prelude::*;

use crate::pair::SimilarPair;

/// Similarity between two documents given by internal indices.
pub trait PairSimilarity: Sync {
    /// Computes the similarity of documents `i` and `j`.
    fn similarity(&self, i: usize, j: usize) -> f64;
}

impl<V> PairSimilarity for SignatureMatrix<V>
where
    V: SignatureValue,
{
    fn similarity(&self, i: usize, j: usize) -> f64 {
        SignatureMatrix::similarity(self, i, j)
    }
}

/// Exact Jaccard similarity over retained shingle sets.
pub struct ShingleSets<'a>(pub &'a [HashSet<u32>]);

impl PairSimilarity for ShingleSets<'_> {
    fn similarity(&self, i: usize, j: usize) -> f64 {
        lsh::jaccard_similarity_of_sets(&self.0[i], &self.0[j])
    }
}

/// Verifier keeping the candidate pairs whose similarity exceeds a threshold,
/// reported with external ids.
pub struct CandidateVerifier<'a, M: ?Sized> {
    measure: &'a M,
    external_ids: &'a [u64],
}

impl<'a, M> CandidateVerifier<'a, M>
where
    M: PairSimilarity + ?Sized,
{
    /// Creates an instance.
    pub fn new(measure: &'a M, external_ids: &'a [u64]) -> Self {
        Self {
            measure,
            external_ids,
        }
    }

    /// Verifies candidate pairs of internal indices.
    /// Each unordered pair is kept at most once however often it is given.
    pub fn verify<I>(&self, candidates: I, threshold: f64) -> HashSet<SimilarPair>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        candidates
            .into_iter()
            .filter_map(|(i, j)| self.check(i, j, threshold))
            .collect()
    }

    /// Verifies candidate pairs of internal indices in parallel.
    pub fn verify_in_parallel(
        &self,
        candidates: &[(usize, usize)],
        threshold: f64,
    ) -> HashSet<SimilarPair> {
        let matched: Vec<_> = candidates
            .par_iter()
            .filter_map(|&(i, j)| self.check(i, j, threshold))
            .collect();
        matched.into_iter().collect()
    }

    fn check(&self, i: usize, j: usize, threshold: f64) -> Option<SimilarPair> {
        let sim = self.measure.similarity(i, j);
        (sim > threshold)
            .then(|| SimilarPair::new(self.external_ids[i], self.external_ids[j], sim))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_sets() -> Vec<HashSet<u32>> {
        vec![
            (0..10).collect(),
            (0..9).collect(),
            (5..15).collect(),
            HashSet::new(),
            HashSet::new(),
        ]
    }

    #[test]
    fn test_verify_shingle_sets() {
        let sets = example_sets();
        let ids = [100, 200, 300, 400, 500];
        let measure = ShingleSets(&sets);
        let verifier = CandidateVerifier::new(&measure, &ids);
        let pairs = verifier.verify([(0, 1), (1, 0), (0, 2), (3, 4)], 0.5);
        assert_eq!(pairs.len(), 1);
        let pair = pairs.iter().next().unwrap();
        assert_eq!(pair.key(), (100, 200));
        assert_eq!(pair.similarity(), 0.9);
    }

    #[test]
    fn test_verify_in_parallel() {
        let sets = example_sets();
        let ids = [1, 2, 3, 4, 5];
        let measure = ShingleSets(&sets);
        let verifier = CandidateVerifier::new(&measure, &ids);
        let candidates = vec![(0, 1), (0, 2), (1, 2), (2, 3), (3, 4), (1, 0)];
        assert_eq!(
            verifier.verify(candidates.iter().copied(), 0.3),
            verifier.verify_in_parallel(&candidates, 0.3)
        );
    }
}
