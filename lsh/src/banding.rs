//! Banded locality-sensitive hashing over a [`SignatureMatrix`].
use std::ops::Range;

use hashbrown::{HashMap, HashSet};
use rayon::prelude::*;

use crate::errors::{LshError, Result};
use crate::signature::{SignatureMatrix, SignatureValue};

/// Documents of one band grouped by bucket id.
#[derive(Clone, Debug, Default)]
pub struct BucketTable {
    buckets: HashMap<usize, Vec<usize>>,
}

impl BucketTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts document `doc` into bucket `bucket`.
    pub fn insert(&mut self, bucket: usize, doc: usize) {
        self.buckets.entry(bucket).or_default().push(doc);
    }

    /// Gets the documents in bucket `bucket`.
    pub fn bucket(&self, bucket: usize) -> &[usize] {
        self.buckets
            .get(&bucket)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Gets the number of non-empty buckets.
    pub fn num_buckets_used(&self) -> usize {
        self.buckets.len()
    }

    /// Creates an iterator over all pairs of documents sharing a bucket.
    ///
    /// Documents are inserted in increasing order, so every pair `(i, j)` has `i < j`.
    pub fn candidate_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.buckets
            .values()
            .filter(|docs| docs.len() >= 2)
            .flat_map(|docs| {
                docs.iter().enumerate().flat_map(move |(k, &i)| {
                    docs[k + 1..].iter().map(move |&j| (i.min(j), i.max(j)))
                })
            })
    }
}

/// Engine hashing each band of every signature into buckets and collecting
/// colliding documents as candidate pairs.
///
/// Bands are processed one at a time, so at most one [`BucketTable`] per worker is alive.
pub struct BandingEngine<'a, V> {
    signatures: &'a SignatureMatrix<V>,
    num_bands: usize,
    band_length: usize,
    num_buckets: usize,
    seed: u32,
}

impl<'a, V> BandingEngine<'a, V>
where
    V: SignatureValue,
{
    /// Creates an instance.
    ///
    /// # Arguments
    ///
    /// * `signatures` - Signature matrix whose rows are split into bands.
    /// * `num_bands` - Number of bands (must divide the signature length).
    /// * `num_buckets` - Number of buckets per band (must be more than 0).
    /// * `seed` - Seed value for the band hash.
    pub fn new(
        signatures: &'a SignatureMatrix<V>,
        num_bands: usize,
        num_buckets: usize,
        seed: u32,
    ) -> Result<Self> {
        if num_bands == 0 {
            return Err(LshError::input("The number of bands must not be 0."));
        }
        if num_buckets == 0 {
            return Err(LshError::input("The number of buckets must not be 0."));
        }
        let num_hashes = signatures.num_hashes();
        if num_hashes % num_bands != 0 {
            return Err(LshError::input(format!(
                "The number of bands {num_bands} must divide the number of hashes {num_hashes}."
            )));
        }
        Ok(Self {
            signatures,
            num_bands,
            band_length: num_hashes / num_bands,
            num_buckets,
            seed,
        })
    }

    /// Buckets every document by its slice of band `band`.
    pub fn bucket_table(&self, band: usize) -> BucketTable {
        let range = self.band_range(band);
        let mut table = BucketTable::new();
        let mut bytes = Vec::with_capacity(self.band_length * std::mem::size_of::<V>());
        for doc in 0..self.signatures.num_docs() {
            bytes.clear();
            for &v in &self.signatures.row(doc)[range.clone()] {
                v.extend_bytes(&mut bytes);
            }
            let bucket = crate::hash_bytes(&bytes, self.seed) as usize % self.num_buckets;
            table.insert(bucket, doc);
        }
        table
    }

    /// Collects the deduplicated candidate pairs over all bands.
    pub fn candidate_pairs(&self) -> HashSet<(usize, usize)> {
        self.candidate_pairs_for_bands(0..self.num_bands)
    }

    /// Collects the deduplicated candidate pairs over the given bands, in the given order.
    pub fn candidate_pairs_for_bands<I>(&self, bands: I) -> HashSet<(usize, usize)>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut candidates = HashSet::new();
        for band in bands {
            let table = self.bucket_table(band);
            candidates.extend(table.candidate_pairs());
            tracing::debug!(
                band,
                buckets = table.num_buckets_used(),
                candidates = candidates.len(),
                "processed band"
            );
        }
        candidates
    }

    /// Collects the deduplicated candidate pairs over all bands, processing bands in parallel.
    pub fn candidate_pairs_in_parallel(&self) -> HashSet<(usize, usize)> {
        (0..self.num_bands)
            .into_par_iter()
            .map(|band| {
                let table = self.bucket_table(band);
                let local: HashSet<_> = table.candidate_pairs().collect();
                tracing::debug!(band, candidates = local.len(), "processed band");
                local
            })
            .reduce(HashSet::new, |mut a, mut b| {
                if a.len() < b.len() {
                    std::mem::swap(&mut a, &mut b);
                }
                a.extend(b);
                a
            })
    }

    /// Gets the number of bands.
    pub const fn num_bands(&self) -> usize {
        self.num_bands
    }

    /// Gets the number of signature cells per band.
    pub const fn band_length(&self) -> usize {
        self.band_length
    }

    /// Gets the number of buckets per band.
    pub const fn num_buckets(&self) -> usize {
        self.num_buckets
    }

    fn band_range(&self, band: usize) -> Range<usize> {
        assert!(band < self.num_bands);
        band * self.band_length..(band + 1) * self.band_length
    }
}
