//! MinHash signature matrix.
use std::fmt::Debug;

use hashbrown::HashSet;
use num_traits::int::PrimInt;
use rayon::prelude::*;

use crate::errors::{LshError, Result};
use crate::universal::HashTable;

/// Trait of an unsigned integer type storing signature cells.
///
/// The maximum value of the type is reserved as the "no shingle seen yet" sentinel,
/// so hash values must stay strictly below it.
pub trait SignatureValue: PrimInt + Debug + Default + Send + Sync {
    /// Gets the largest hash domain storable without touching the sentinel.
    fn max_domain() -> usize;
    /// Converts an in-domain hash value.
    fn from_hash(h: u64) -> Self;
    /// Appends the little-endian bytes of the value.
    fn extend_bytes(self, buf: &mut Vec<u8>);
}

impl SignatureValue for u16 {
    #[inline(always)]
    fn max_domain() -> usize {
        Self::MAX as usize
    }
    #[inline(always)]
    fn from_hash(h: u64) -> Self {
        debug_assert!(h < Self::MAX as u64);
        h as Self
    }
    #[inline(always)]
    fn extend_bytes(self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.to_le_bytes());
    }
}

impl SignatureValue for u32 {
    #[inline(always)]
    fn max_domain() -> usize {
        Self::MAX as usize
    }
    #[inline(always)]
    fn from_hash(h: u64) -> Self {
        debug_assert!(h < Self::MAX as u64);
        h as Self
    }
    #[inline(always)]
    fn extend_bytes(self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.to_le_bytes());
    }
}

/// Dense `num_docs x num_hashes` matrix of minimum hash values, stored row by row.
#[derive(Clone, Debug)]
pub struct SignatureMatrix<V> {
    values: Vec<V>,
    num_hashes: usize,
}

impl<V> SignatureMatrix<V>
where
    V: SignatureValue,
{
    /// Creates an empty matrix whose rows hold `num_hashes` values.
    pub fn new(num_hashes: usize) -> Self {
        assert!(num_hashes >= 1);
        Self {
            values: vec![],
            num_hashes,
        }
    }

    /// Folds the shingle ids of the next document into a new row,
    /// returning the internal index of the document.
    ///
    /// If a shingle id is out of the table's domain, the matrix is left unchanged.
    pub fn add<I>(&mut self, shingles: I, table: &HashTable<V>) -> Result<usize>
    where
        I: IntoIterator<Item = u32>,
    {
        self.check_table(table)?;
        let doc = self.num_docs();
        let start = self.values.len();
        self.values.resize(start + self.num_hashes, V::max_value());
        if let Err(e) = fold_row(&mut self.values[start..], shingles, table) {
            self.values.truncate(start);
            return Err(e);
        }
        Ok(doc)
    }

    /// Builds the matrix from all shingle sets at once, folding rows in parallel.
    pub fn from_sets_in_parallel(sets: &[HashSet<u32>], table: &HashTable<V>) -> Result<Self> {
        let num_hashes = table.num_hashes();
        let mut values = vec![V::max_value(); sets.len() * num_hashes];
        values
            .par_chunks_mut(num_hashes)
            .zip(sets.par_iter())
            .try_for_each(|(row, set)| fold_row(row, set.iter().copied(), table))?;
        Ok(Self { values, num_hashes })
    }

    /// Gets the signature of document `doc`.
    #[inline(always)]
    pub fn row(&self, doc: usize) -> &[V] {
        &self.values[doc * self.num_hashes..(doc + 1) * self.num_hashes]
    }

    /// Checks if document `doc` had no shingles.
    ///
    /// Any shingle lowers every cell below the sentinel, so looking at one cell suffices.
    #[inline(always)]
    pub fn is_empty_row(&self, doc: usize) -> bool {
        self.values[doc * self.num_hashes] == V::max_value()
    }

    /// Estimates the Jaccard similarity of two documents as the fraction of
    /// agreeing signature cells. Two documents without shingles have similarity 0.
    pub fn similarity(&self, i: usize, j: usize) -> f64 {
        if self.is_empty_row(i) && self.is_empty_row(j) {
            return 0.;
        }
        let agree = self
            .row(i)
            .iter()
            .zip(self.row(j))
            .filter(|(x, y)| x == y)
            .count();
        agree as f64 / self.num_hashes as f64
    }

    /// Gets the number of hash functions, i.e., the row length.
    pub const fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    /// Gets the number of documents.
    pub fn num_docs(&self) -> usize {
        self.values.len() / self.num_hashes
    }

    /// Gets the memory usage in bytes.
    pub fn memory_in_bytes(&self) -> usize {
        self.values.len() * std::mem::size_of::<V>()
    }

    fn check_table(&self, table: &HashTable<V>) -> Result<()> {
        if table.num_hashes() != self.num_hashes {
            return Err(LshError::input(format!(
                "The hash table has {} functions, but the signature needs {}.",
                table.num_hashes(),
                self.num_hashes
            )));
        }
        Ok(())
    }
}

fn fold_row<V, I>(row: &mut [V], shingles: I, table: &HashTable<V>) -> Result<()>
where
    V: SignatureValue,
    I: IntoIterator<Item = u32>,
{
    for id in shingles {
        let hashes = table.row(id).ok_or(LshError::OutOfDomain {
            id,
            num_values: table.num_values(),
        })?;
        for (cell, &h) in row.iter_mut().zip(hashes) {
            if h < *cell {
                *cell = h;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::universal::UniversalHashFamily;

    fn example_sets() -> Vec<HashSet<u32>> {
        vec![
            (0..100).collect(),
            (50..150).collect(),
            (0..100).chain(400..420).collect(),
            (300..500).collect(),
            HashSet::new(),
            (0..100).collect(),
        ]
    }

    #[test]
    fn test_row_is_columnwise_minimum() {
        let family = UniversalHashFamily::new(16, 200, 42).unwrap();
        let table = family.table::<u32>().unwrap();
        let mut matrix = SignatureMatrix::new(16);
        let set = [3u32, 17, 150, 199];
        let doc = matrix.add(set.iter().copied(), &table).unwrap();
        assert_eq!(doc, 0);
        for j in 0..16 {
            let expected = set.iter().map(|&x| family.hash(j, x as u64)).min().unwrap();
            assert_eq!(matrix.row(0)[j] as u64, expected);
        }
    }

    #[test]
    fn test_empty_document() {
        let table = UniversalHashFamily::new(8, 100, 1)
            .unwrap()
            .table::<u16>()
            .unwrap();
        let mut matrix = SignatureMatrix::new(8);
        matrix.add(std::iter::empty(), &table).unwrap();
        matrix.add(std::iter::empty(), &table).unwrap();
        matrix.add([5], &table).unwrap();
        assert!(matrix.is_empty_row(0));
        assert!(!matrix.is_empty_row(2));
        assert!(matrix.row(0).iter().all(|&v| v == u16::MAX));
        assert_eq!(matrix.similarity(0, 1), 0.);
        assert_eq!(matrix.similarity(0, 2), 0.);
    }

    #[test]
    fn test_out_of_domain() {
        let table = UniversalHashFamily::new(4, 10, 1)
            .unwrap()
            .table::<u32>()
            .unwrap();
        let mut matrix = SignatureMatrix::new(4);
        matrix.add([1, 2], &table).unwrap();
        let result = matrix.add([3, 10], &table);
        assert!(matches!(
            result,
            Err(LshError::OutOfDomain {
                id: 10,
                num_values: 10
            })
        ));
        assert_eq!(matrix.num_docs(), 1);
    }

    #[test]
    fn test_mismatched_table() {
        let table = UniversalHashFamily::new(4, 10, 1)
            .unwrap()
            .table::<u32>()
            .unwrap();
        let mut matrix = SignatureMatrix::<u32>::new(8);
        assert!(matrix.add([1], &table).is_err());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sets = example_sets();
        let table = UniversalHashFamily::new(32, 1000, 7)
            .unwrap()
            .table::<u16>()
            .unwrap();
        let mut sequential = SignatureMatrix::new(32);
        for set in &sets {
            sequential.add(set.iter().copied(), &table).unwrap();
        }
        let parallel = SignatureMatrix::from_sets_in_parallel(&sets, &table).unwrap();
        assert_eq!(parallel.num_docs(), sets.len());
        for doc in 0..sets.len() {
            assert_eq!(parallel.row(doc), sequential.row(doc));
        }
    }

    #[test]
    fn test_similarity_identical() {
        let sets = example_sets();
        let table = UniversalHashFamily::new(64, 1000, 3)
            .unwrap()
            .table::<u32>()
            .unwrap();
        let matrix = SignatureMatrix::from_sets_in_parallel(&sets, &table).unwrap();
        assert_eq!(matrix.similarity(0, 5), 1.);
        assert_eq!(matrix.similarity(0, 1), matrix.similarity(1, 0));
    }

    #[test]
    fn test_estimate_converges() {
        let sets = example_sets();
        let table = UniversalHashFamily::new(400, 1000, 12345)
            .unwrap()
            .table::<u32>()
            .unwrap();
        let matrix = SignatureMatrix::from_sets_in_parallel(&sets, &table).unwrap();
        for i in 0..sets.len() {
            for j in i + 1..sets.len() {
                let exact = crate::jaccard_similarity_of_sets(&sets[i], &sets[j]);
                let estimate = matrix.similarity(i, j);
                assert!(
                    (exact - estimate).abs() <= 0.1,
                    "i={i}, j={j}, exact={exact}, estimate={estimate}"
                );
            }
        }
    }

    #[test]
    fn test_memory() {
        let table = UniversalHashFamily::new(10, 100, 0)
            .unwrap()
            .table::<u16>()
            .unwrap();
        let mut matrix = SignatureMatrix::new(10);
        matrix.add([1, 2, 3], &table).unwrap();
        matrix.add([4], &table).unwrap();
        assert_eq!(matrix.memory_in_bytes(), 2 * 10 * 2);
    }
}
