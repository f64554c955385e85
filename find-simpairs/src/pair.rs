//! Pairs of similar documents.
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Unordered pair of external document ids with their similarity.
///
/// Equality and hashing ignore the order of the ids, so `(x, y, s)` and `(y, x, s)`
/// are the same pair and a set keeps only one of them.
#[derive(Clone, Copy, Debug)]
pub struct SimilarPair {
    id1: u64,
    id2: u64,
    similarity: f64,
}

impl SimilarPair {
    /// Creates an instance.
    pub fn new(id1: u64, id2: u64, similarity: f64) -> Self {
        Self {
            id1,
            id2,
            similarity,
        }
    }

    /// Gets the first id.
    pub const fn id1(&self) -> u64 {
        self.id1
    }

    /// Gets the second id.
    pub const fn id2(&self) -> u64 {
        self.id2
    }

    /// Gets the similarity.
    pub fn similarity(&self) -> f64 {
        self.similarity
    }

    /// Gets the ids with the smaller one first.
    pub fn key(&self) -> (u64, u64) {
        if self.id1 <= self.id2 {
            (self.id1, self.id2)
        } else {
            (self.id2, self.id1)
        }
    }

    /// Compares by similarity, breaking ties by [`Self::key()`].
    pub fn cmp_by_similarity(&self, other: &Self) -> Ordering {
        self.similarity
            .total_cmp(&other.similarity)
            .then_with(|| self.key().cmp(&other.key()))
    }
}

impl PartialEq for SimilarPair {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for SimilarPair {}

impl Hash for SimilarPair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for SimilarPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.id1, self.id2, self.similarity)
    }
}

/// Order of reported pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    /// Least similar first.
    Ascending,
    /// Most similar first.
    Descending,
}

/// Sorts pairs by similarity; pairs of equal similarity are ordered by their ids.
pub fn sort_pairs<I>(pairs: I, order: SortOrder) -> Vec<SimilarPair>
where
    I: IntoIterator<Item = SimilarPair>,
{
    let mut pairs: Vec<_> = pairs.into_iter().collect();
    match order {
        SortOrder::Ascending => pairs.sort_unstable_by(|a, b| a.cmp_by_similarity(b)),
        SortOrder::Descending => pairs.sort_unstable_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.key().cmp(&b.key()))
        }),
    }
    pairs
}
