//! Exhaustive search comparing the shingle sets of all document pairs.
use hashbrown::HashSet;

use crate::errors::Result;
use crate::pair::SimilarPair;
use crate::searcher::{check_threshold, SimilaritySearcher};
use crate::source::{Document, ShingleSource};

/// Exhaustive searcher computing the exact Jaccard similarity of every pair.
///
/// It takes quadratic time and serves as the reference for [`crate::LshSearcher`].
#[derive(Default)]
pub struct BruteForceSearcher {
    documents: Vec<Document>,
}

impl BruteForceSearcher {
    /// Creates an empty instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads all documents from `source`.
    pub fn build<S>(mut self, source: &mut S) -> Result<Self>
    where
        S: ShingleSource + ?Sized,
    {
        tracing::info!("reading and shingling documents");
        self.documents = source.read_all()?;
        Ok(self)
    }

    /// Gets the indexed documents.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }
}

impl SimilaritySearcher for BruteForceSearcher {
    fn similar_pairs_above(&self, threshold: f64) -> Result<HashSet<SimilarPair>> {
        check_threshold(threshold)?;
        tracing::info!(documents = self.documents.len(), "computing similarities");
        let mut pairs = HashSet::new();
        for (i, x) in self.documents.iter().enumerate() {
            for y in &self.documents[i + 1..] {
                let sim = lsh::jaccard_similarity_of_sets(&x.shingles, &y.shingles);
                if sim > threshold {
                    pairs.insert(SimilarPair::new(x.external_id, y.external_id, sim));
                }
            }
        }
        Ok(pairs)
    }

    fn len(&self) -> usize {
        self.documents.len()
    }
}
