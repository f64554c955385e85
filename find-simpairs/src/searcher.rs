//! Common contract of similarity searchers.
use hashbrown::HashSet;

use crate::errors::{FindSimpairsError, Result};
use crate::pair::SimilarPair;

/// Searcher of all document pairs whose similarity exceeds a threshold.
pub trait SimilaritySearcher {
    /// Gets the pairs whose similarity is strictly greater than `threshold`,
    /// which must be in `(0, 1)`.
    fn similar_pairs_above(&self, threshold: f64) -> Result<HashSet<SimilarPair>>;

    /// Gets the number of indexed documents.
    fn len(&self) -> usize;

    /// Checks if no documents are indexed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Checks that a similarity threshold is in `(0, 1)`.
pub fn check_threshold(threshold: f64) -> Result<()> {
    if threshold > 0. && threshold < 1. {
        Ok(())
    } else {
        Err(FindSimpairsError::config(format!(
            "The threshold must be in (0, 1), but got {threshold}."
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_threshold() {
        assert!(check_threshold(0.5).is_ok());
        assert!(check_threshold(0.0).is_err());
        assert!(check_threshold(1.0).is_err());
        assert!(check_threshold(f64::NAN).is_err());
    }
}
