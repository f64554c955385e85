//! Universal hash family `h(x) = ((a*x + b) mod p) mod n` over shingle ids.
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::errors::{LshError, Result};
use crate::primes::least_prime_at_least;
use crate::signature::SignatureValue;

/// Family of `num_hashes` universal hash functions over the domain `[0, num_values)`.
///
/// All coefficients are drawn from one generator seeded with the given seed,
/// so the same seed always produces the same family.
#[derive(Clone, Debug)]
pub struct UniversalHashFamily {
    coefficients: Vec<(u64, u64)>,
    prime: u64,
    num_values: u64,
}

impl UniversalHashFamily {
    /// Creates an instance.
    ///
    /// # Arguments
    ///
    /// * `num_hashes` - Number of hash functions (must be more than 0).
    /// * `num_values` - Size of the shingle domain; `p` is the least prime not below it.
    /// * `seed` - Seed value for drawing the coefficients.
    pub fn new(num_hashes: usize, num_values: usize, seed: u64) -> Result<Self> {
        if num_hashes == 0 {
            return Err(LshError::input("The number of hash functions must not be 0."));
        }
        let num_values = num_values as u64;
        let prime = least_prime_at_least(num_values);
        let mut rng = rand_xoshiro::SplitMix64::seed_from_u64(seed);
        let coefficients = (0..num_hashes)
            .map(|_| (rng.gen_range(1..prime), rng.gen_range(0..prime)))
            .collect();
        Ok(Self {
            coefficients,
            prime,
            num_values,
        })
    }

    /// Applies the `j`-th function to `x`, which must be less than [`Self::num_values()`].
    #[inline(always)]
    pub fn hash(&self, j: usize, x: u64) -> u64 {
        debug_assert!(x < self.num_values);
        let (a, b) = self.coefficients[j];
        // a*x overflows u64 once the domain exceeds 2^32.
        let h = (a as u128 * x as u128 + b as u128) % self.prime as u128;
        (h % self.num_values as u128) as u64
    }

    /// Precomputes all functions over the whole domain.
    pub fn table<V>(&self) -> Result<HashTable<V>>
    where
        V: SignatureValue,
    {
        let mut table = HashTable::allocate(self)?;
        for (x, row) in table.values.chunks_mut(self.num_hashes()).enumerate() {
            self.fill_row(x as u64, row);
        }
        Ok(table)
    }

    /// Precomputes all functions over the whole domain in parallel.
    pub fn table_in_parallel<V>(&self) -> Result<HashTable<V>>
    where
        V: SignatureValue,
    {
        let mut table = HashTable::allocate(self)?;
        table
            .values
            .par_chunks_mut(self.num_hashes())
            .enumerate()
            .for_each(|(x, row)| self.fill_row(x as u64, row));
        Ok(table)
    }

    /// Gets the number of hash functions.
    pub fn num_hashes(&self) -> usize {
        self.coefficients.len()
    }

    /// Gets the size of the domain.
    pub const fn num_values(&self) -> usize {
        self.num_values as usize
    }

    /// Gets the prime modulus.
    pub const fn prime(&self) -> u64 {
        self.prime
    }

    fn fill_row<V>(&self, x: u64, row: &mut [V])
    where
        V: SignatureValue,
    {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = V::from_hash(self.hash(j, x));
        }
    }
}

/// Precomputed `num_values x num_hashes` table of hash values, stored row by row
/// so that folding a shingle reads one contiguous row.
#[derive(Clone, Debug)]
pub struct HashTable<V> {
    values: Vec<V>,
    num_hashes: usize,
    num_values: usize,
}

impl<V> HashTable<V>
where
    V: SignatureValue,
{
    fn allocate(family: &UniversalHashFamily) -> Result<Self> {
        let num_values = family.num_values();
        if num_values > V::max_domain() {
            return Err(LshError::input(format!(
                "The shingle domain {num_values} exceeds the capacity {} of the signature width.",
                V::max_domain()
            )));
        }
        let num_hashes = family.num_hashes();
        Ok(Self {
            values: vec![V::default(); num_values * num_hashes],
            num_hashes,
            num_values,
        })
    }

    /// Gets the hash values of shingle `id` under every function,
    /// or `None` if the id is out of the domain.
    #[inline(always)]
    pub fn row(&self, id: u32) -> Option<&[V]> {
        let id = id as usize;
        if id < self.num_values {
            Some(&self.values[id * self.num_hashes..(id + 1) * self.num_hashes])
        } else {
            None
        }
    }

    /// Gets the number of hash functions.
    pub const fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    /// Gets the size of the domain.
    pub const fn num_values(&self) -> usize {
        self.num_values
    }

    /// Gets the memory usage in bytes.
    pub fn memory_in_bytes(&self) -> usize {
        self.values.len() * std::mem::size_of::<V>()
    }
}
