//! Approximate search with MinHash signatures and LSH banding.
use std::str::FromStr;
use std::time::Instant;

use hashbrown::HashSet;
use lsh::{BandingEngine, SignatureMatrix, SignatureValue, UniversalHashFamily};
use rand::{RngCore, SeedableRng};

use crate::errors::{FindSimpairsError, Result};
use crate::pair::SimilarPair;
use crate::searcher::{check_threshold, SimilaritySearcher};
use crate::source::ShingleSource;
use crate::verify::{CandidateVerifier, PairSimilarity, ShingleSets};

/// Integer width of signature cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureWidth {
    /// 16-bit cells, admitting shingle domains below `2^16 - 1`.
    Narrow,
    /// 32-bit cells.
    Wide,
}

impl FromStr for SignatureWidth {
    type Err = &'static str;
    fn from_str(w: &str) -> Result<Self, Self::Err> {
        match w {
            "narrow" | "16" => Ok(Self::Narrow),
            "wide" | "32" => Ok(Self::Wide),
            _ => Err("Could not parse a signature-width value"),
        }
    }
}

/// Measure used to confirm candidate pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verification {
    /// Fraction of agreeing signature cells, an estimate of the Jaccard similarity.
    Signatures,
    /// Exact Jaccard similarity of the shingle sets, which are kept in memory.
    Shingles,
}

impl FromStr for Verification {
    type Err = &'static str;
    fn from_str(v: &str) -> Result<Self, Self::Err> {
        match v {
            "signatures" => Ok(Self::Signatures),
            "shingles" => Ok(Self::Shingles),
            _ => Err("Could not parse a verification value"),
        }
    }
}

/// Parameters of [`LshSearcher`].
#[derive(Clone, Copy, Debug)]
pub struct LshConfig {
    /// Number of hash functions, i.e., the signature length.
    pub num_hashes: usize,
    /// Number of bands; must divide `num_hashes`.
    pub num_bands: usize,
    /// Number of buckets per band.
    pub num_buckets: usize,
    /// Seed value for random values.
    pub seed: u64,
    /// Integer width of signature cells.
    pub width: SignatureWidth,
    /// Measure used to confirm candidate pairs.
    pub verification: Verification,
}

impl LshConfig {
    /// Default number of buckets per band.
    pub const DEFAULT_NUM_BUCKETS: usize = 2000;
    /// Default seed value.
    pub const DEFAULT_SEED: u64 = 1234;

    /// Creates an instance with default buckets, seed, wide cells and signature verification.
    pub const fn new(num_hashes: usize, num_bands: usize) -> Self {
        Self {
            num_hashes,
            num_bands,
            num_buckets: Self::DEFAULT_NUM_BUCKETS,
            seed: Self::DEFAULT_SEED,
            width: SignatureWidth::Wide,
            verification: Verification::Signatures,
        }
    }

    /// Sets the number of buckets per band.
    pub const fn num_buckets(mut self, num_buckets: usize) -> Self {
        self.num_buckets = num_buckets;
        self
    }

    /// Sets the seed value.
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the integer width of signature cells.
    pub const fn width(mut self, width: SignatureWidth) -> Self {
        self.width = width;
        self
    }

    /// Sets the measure used to confirm candidate pairs.
    pub const fn verification(mut self, verification: Verification) -> Self {
        self.verification = verification;
        self
    }

    /// Checks the parameters.
    pub fn validate(&self) -> Result<()> {
        if self.num_hashes == 0 {
            return Err(FindSimpairsError::config("numHashes must not be 0."));
        }
        if self.num_bands == 0 {
            return Err(FindSimpairsError::config("numBands must not be 0."));
        }
        if self.num_hashes % self.num_bands != 0 {
            return Err(FindSimpairsError::config(format!(
                "numBands ({}) must divide numHashes ({}).",
                self.num_bands, self.num_hashes
            )));
        }
        if self.num_buckets == 0 {
            return Err(FindSimpairsError::config("numBuckets must not be 0."));
        }
        Ok(())
    }

    /// Gets the number of signature cells per band.
    pub const fn band_length(&self) -> usize {
        self.num_hashes / self.num_bands
    }
}

enum Signatures {
    Narrow(SignatureMatrix<u16>),
    Wide(SignatureMatrix<u32>),
}

/// Searcher in Jaccard space using MinHash signatures and LSH banding.
///
/// # Examples
///
/// ```
/// use find_simpairs::{LshConfig, LshSearcher, MemorySource, Shingler, SimilaritySearcher};
///
/// let shingler = Shingler::new(3, 1 << 16, 42).unwrap();
/// let mut source = MemorySource::from_texts(
///     &shingler,
///     [
///         (1, "Welcome to Jimbocho, the town of books and curry!"),
///         (2, "Welcome to Jimbocho, the town of books and curry."),
///         (3, "A completely unrelated sentence about the weather."),
///     ],
/// );
/// let searcher = LshSearcher::new(LshConfig::new(100, 50).seed(42))
///     .unwrap()
///     .build_signatures(&mut source)
///     .unwrap();
/// let pairs = searcher.similar_pairs_above(0.5).unwrap();
/// assert_eq!(pairs.len(), 1);
/// assert_eq!(pairs.iter().next().unwrap().key(), (1, 2));
/// ```
pub struct LshSearcher {
    config: LshConfig,
    table_seed: u64,
    band_seed: u32,
    in_parallel: bool,
    external_ids: Vec<u64>,
    signatures: Option<Signatures>,
    shingles: Vec<HashSet<u32>>,
}

impl LshSearcher {
    /// Creates an instance, checking the parameters.
    pub fn new(config: LshConfig) -> Result<Self> {
        config.validate()?;
        let mut seeder = rand_xoshiro::SplitMix64::seed_from_u64(config.seed);
        let table_seed = seeder.next_u64();
        let band_seed = seeder.next_u32();
        Ok(Self {
            config,
            table_seed,
            band_seed,
            in_parallel: false,
            external_ids: vec![],
            signatures: None,
            shingles: vec![],
        })
    }

    /// Uses multiple threads for hash tables, signatures, bands and verification?
    pub const fn in_parallel(mut self, yes: bool) -> Self {
        self.in_parallel = yes;
        self
    }

    /// Builds the signature matrix from all documents of `source`.
    pub fn build_signatures<S>(mut self, source: &mut S) -> Result<Self>
    where
        S: ShingleSource + ?Sized,
    {
        let start = Instant::now();
        let family =
            UniversalHashFamily::new(self.config.num_hashes, source.num_shingles(), self.table_seed)?;
        let signatures = match self.config.width {
            SignatureWidth::Narrow => Signatures::Narrow(self.build_matrix(source, &family)?),
            SignatureWidth::Wide => Signatures::Wide(self.build_matrix(source, &family)?),
        };
        self.signatures = Some(signatures);
        tracing::info!(
            documents = self.len(),
            memory_in_bytes = self.memory_in_bytes(),
            elapsed_sec = start.elapsed().as_secs_f64(),
            "built signatures"
        );
        Ok(self)
    }

    fn build_matrix<V, S>(
        &mut self,
        source: &mut S,
        family: &UniversalHashFamily,
    ) -> Result<SignatureMatrix<V>>
    where
        V: SignatureValue,
        S: ShingleSource + ?Sized,
    {
        let keeps_shingles = self.config.verification == Verification::Shingles;
        self.external_ids.clear();
        self.shingles.clear();

        if self.in_parallel {
            let table = family.table_in_parallel::<V>()?;
            let documents = source.read_all()?;
            let mut sets = Vec::with_capacity(documents.len());
            for document in documents {
                self.external_ids.push(document.external_id);
                sets.push(document.shingles);
            }
            let matrix = SignatureMatrix::from_sets_in_parallel(&sets, &table)?;
            if keeps_shingles {
                self.shingles = sets;
            }
            return Ok(matrix);
        }

        let table = family.table::<V>()?;
        let mut matrix = SignatureMatrix::new(self.config.num_hashes);
        source.reset()?;
        while let Some(document) = source.next_document()? {
            let doc = matrix.add(document.shingles.iter().copied(), &table)?;
            if (doc + 1) % 1000 == 0 {
                tracing::debug!(documents = doc + 1, "folded signatures");
            }
            self.external_ids.push(document.external_id);
            if keeps_shingles {
                self.shingles.push(document.shingles);
            }
        }
        Ok(matrix)
    }

    /// Collects the pairs of internal indices colliding in at least one band.
    pub fn candidate_pairs(&self) -> Result<HashSet<(usize, usize)>> {
        match self.signatures()? {
            Signatures::Narrow(m) => self.candidates_of(m),
            Signatures::Wide(m) => self.candidates_of(m),
        }
    }

    fn candidates_of<V>(&self, matrix: &SignatureMatrix<V>) -> Result<HashSet<(usize, usize)>>
    where
        V: SignatureValue,
    {
        let engine = BandingEngine::new(
            matrix,
            self.config.num_bands,
            self.config.num_buckets,
            self.band_seed,
        )?;
        Ok(if self.in_parallel {
            engine.candidate_pairs_in_parallel()
        } else {
            engine.candidate_pairs()
        })
    }

    fn verify<M>(
        &self,
        measure: &M,
        candidates: HashSet<(usize, usize)>,
        threshold: f64,
    ) -> HashSet<SimilarPair>
    where
        M: PairSimilarity + ?Sized,
    {
        let verifier = CandidateVerifier::new(measure, &self.external_ids);
        if self.in_parallel {
            let candidates: Vec<_> = candidates.into_iter().collect();
            verifier.verify_in_parallel(&candidates, threshold)
        } else {
            verifier.verify(candidates, threshold)
        }
    }

    fn signatures(&self) -> Result<&Signatures> {
        self.signatures.as_ref().ok_or_else(|| {
            FindSimpairsError::config("Signatures must be built before searching.")
        })
    }

    /// Gets the parameters.
    pub const fn config(&self) -> &LshConfig {
        &self.config
    }

    /// Gets the memory usage of the signatures in bytes.
    pub fn memory_in_bytes(&self) -> usize {
        match &self.signatures {
            Some(Signatures::Narrow(m)) => m.memory_in_bytes(),
            Some(Signatures::Wide(m)) => m.memory_in_bytes(),
            None => 0,
        }
    }
}

impl SimilaritySearcher for LshSearcher {
    fn similar_pairs_above(&self, threshold: f64) -> Result<HashSet<SimilarPair>> {
        check_threshold(threshold)?;
        let signatures = self.signatures()?;

        let start = Instant::now();
        let candidates = self.candidate_pairs()?;
        tracing::info!(
            candidates = candidates.len(),
            elapsed_sec = start.elapsed().as_secs_f64(),
            "generated candidate pairs"
        );

        let start = Instant::now();
        let matched = match (self.config.verification, signatures) {
            (Verification::Shingles, _) => {
                self.verify(&ShingleSets(&self.shingles), candidates, threshold)
            }
            (Verification::Signatures, Signatures::Narrow(m)) => {
                self.verify(m, candidates, threshold)
            }
            (Verification::Signatures, Signatures::Wide(m)) => {
                self.verify(m, candidates, threshold)
            }
        };
        tracing::info!(
            matched = matched.len(),
            elapsed_sec = start.elapsed().as_secs_f64(),
            "verified candidate pairs"
        );
        Ok(matched)
    }

    fn len(&self) -> usize {
        self.external_ids.len()
    }
}
