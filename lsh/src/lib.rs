//! MinHash signatures and banded locality-sensitive hashing for Jaccard similarity.
//!
//! The pipeline is split into three stages:
//!
//! 1. [`universal::UniversalHashFamily`] draws `num_hashes` functions of the form
//!    `((a*x + b) mod p) mod n` and precomputes them into a [`universal::HashTable`].
//! 2. [`signature::SignatureMatrix`] folds each document's shingle ids into a row of
//!    per-function minima.
//! 3. [`banding::BandingEngine`] splits every row into bands, buckets the bands and
//!    emits the pairs of documents colliding in at least one band.
pub mod banding;
pub mod errors;
pub mod primes;
pub mod signature;
pub mod universal;

use std::hash::{BuildHasher, Hash};

use hashbrown::HashSet;

pub use banding::{BandingEngine, BucketTable};
pub use errors::{LshError, Result};
pub use signature::{SignatureMatrix, SignatureValue};
pub use universal::{HashTable, UniversalHashFamily};

/// Hashes a byte string into 32 bits with MurmurHash3 (x86, 32-bit variant).
#[inline(always)]
pub fn hash_bytes(bytes: &[u8], seed: u32) -> u32 {
    mur3::murmurhash3_x86_32(bytes, seed)
}

/// Computes the Jaccard similarity of two collections treated as sets.
///
/// Two empty collections have similarity 0.
///
/// # Examples
///
/// ```
/// use lsh::jaccard_similarity;
///
/// let x = vec![1, 2, 4];
/// let y = vec![1, 2, 5, 7];
/// assert_eq!(jaccard_similarity(x, y), 0.4);
/// ```
pub fn jaccard_similarity<I, T>(lhs: I, rhs: I) -> f64
where
    I: IntoIterator<Item = T>,
    T: Hash + Eq,
{
    let a = HashSet::<T>::from_iter(lhs);
    let b = HashSet::<T>::from_iter(rhs);
    jaccard_similarity_of_sets(&a, &b)
}

/// Computes the Jaccard similarity of two prebuilt sets.
pub fn jaccard_similarity_of_sets<T, S>(a: &HashSet<T, S>, b: &HashSet<T, S>) -> f64
where
    T: Hash + Eq,
    S: BuildHasher,
{
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection = small.iter().filter(|x| large.contains(*x)).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 0.;
    }
    intersection as f64 / union as f64
}
