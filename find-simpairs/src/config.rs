//! Run configuration tying shingling, search method and parameters together.
use std::path::Path;
use std::str::FromStr;

use rand::{RngCore, SeedableRng};

use crate::brute_force::BruteForceSearcher;
use crate::errors::{FindSimpairsError, Result};
use crate::lsh_search::{LshConfig, LshSearcher, SignatureWidth, Verification};
use crate::pair::{sort_pairs, SimilarPair, SortOrder};
use crate::searcher::{check_threshold, SimilaritySearcher};
use crate::shingling::Shingler;
use crate::source::{ShingleSource, TsvReader};

/// Search method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// Exact Jaccard similarity of all pairs.
    BruteForce,
    /// MinHash signatures with LSH banding.
    Lsh,
}

impl FromStr for Method {
    type Err = &'static str;
    fn from_str(m: &str) -> Result<Self, Self::Err> {
        match m {
            "bf" | "brute-force" => Ok(Self::BruteForce),
            "lsh" => Ok(Self::Lsh),
            _ => Err("Could not parse a method value"),
        }
    }
}

/// Configuration of a whole run.
///
/// A single seed drives both shingling and hashing, so that a run is reproducible
/// from its configuration alone.
#[derive(Clone, Copy, Debug)]
pub struct SearchConfig {
    /// Search method.
    pub method: Method,
    /// Pairs with similarity strictly greater than this are reported.
    pub threshold: f64,
    /// Number of tokens per shingle.
    pub shingle_length: usize,
    /// Size of the shingle id domain.
    pub num_shingles: usize,
    /// Number of hash functions, required for [`Method::Lsh`].
    pub num_hashes: Option<usize>,
    /// Number of bands, required for [`Method::Lsh`].
    pub num_bands: Option<usize>,
    /// Number of buckets per band.
    pub num_buckets: usize,
    /// Seed value for random values.
    pub seed: u64,
    /// Maximum number of documents to read. If `None`, all documents are read.
    pub max_documents: Option<usize>,
    /// Delimiter for recognizing words as tokens. If `None`, characters are used for tokens.
    pub delimiter: Option<char>,
    /// Integer width of signature cells.
    pub width: SignatureWidth,
    /// Measure used to confirm candidate pairs.
    pub verification: Verification,
    /// Uses multiple threads?
    pub in_parallel: bool,
}

impl SearchConfig {
    /// Default size of the shingle id domain.
    pub const DEFAULT_NUM_SHINGLES: usize = 1000;

    /// Creates an instance with default values for the optional parameters.
    pub const fn new(method: Method, threshold: f64, shingle_length: usize) -> Self {
        Self {
            method,
            threshold,
            shingle_length,
            num_shingles: Self::DEFAULT_NUM_SHINGLES,
            num_hashes: None,
            num_bands: None,
            num_buckets: LshConfig::DEFAULT_NUM_BUCKETS,
            seed: LshConfig::DEFAULT_SEED,
            max_documents: None,
            delimiter: None,
            width: SignatureWidth::Wide,
            verification: Verification::Signatures,
            in_parallel: false,
        }
    }

    /// Sets the number of hash functions and bands.
    pub const fn bands(mut self, num_hashes: usize, num_bands: usize) -> Self {
        self.num_hashes = Some(num_hashes);
        self.num_bands = Some(num_bands);
        self
    }

    /// Checks all parameters without touching any input.
    pub fn validate(&self) -> Result<()> {
        check_threshold(self.threshold)?;
        if self.shingle_length == 0 {
            return Err(FindSimpairsError::config("shingleLength must not be 0."));
        }
        if self.num_shingles == 0 {
            return Err(FindSimpairsError::config("numShingles must not be 0."));
        }
        if self.method == Method::Lsh {
            self.lsh_config()?.validate()?;
        }
        Ok(())
    }

    /// Derives the seeds of the shingler and the hash family, in this order.
    fn seeds(&self) -> (u32, u64) {
        let mut seeder = rand_xoshiro::SplitMix64::seed_from_u64(self.seed);
        let shingle_seed = seeder.next_u32();
        (shingle_seed, seeder.next_u64())
    }

    /// Creates the shingler.
    pub fn shingler(&self) -> Result<Shingler> {
        let (shingle_seed, _) = self.seeds();
        Ok(Shingler::new(self.shingle_length, self.num_shingles, shingle_seed)?
            .delimiter(self.delimiter))
    }

    /// Creates the parameters of [`LshSearcher`].
    pub fn lsh_config(&self) -> Result<LshConfig> {
        let (Some(num_hashes), Some(num_bands)) = (self.num_hashes, self.num_bands) else {
            return Err(FindSimpairsError::config(
                "numHashes and numBands must be given for the lsh method.",
            ));
        };
        let (_, lsh_seed) = self.seeds();
        Ok(LshConfig::new(num_hashes, num_bands)
            .num_buckets(self.num_buckets)
            .seed(lsh_seed)
            .width(self.width)
            .verification(self.verification))
    }

    /// Opens a TSV file with the configured shingler and document limit.
    pub fn open_tsv<P>(&self, path: P) -> Result<TsvReader>
    where
        P: AsRef<Path>,
    {
        self.validate()?;
        TsvReader::open(path, self.shingler()?, self.max_documents)
    }

    /// Builds the configured searcher from all documents of `source`.
    pub fn searcher<S>(&self, source: &mut S) -> Result<Box<dyn SimilaritySearcher>>
    where
        S: ShingleSource + ?Sized,
    {
        self.validate()?;
        let searcher: Box<dyn SimilaritySearcher> = match self.method {
            Method::BruteForce => Box::new(BruteForceSearcher::new().build(source)?),
            Method::Lsh => Box::new(
                LshSearcher::new(self.lsh_config()?)?
                    .in_parallel(self.in_parallel)
                    .build_signatures(source)?,
            ),
        };
        Ok(searcher)
    }

    /// Finds all pairs above the threshold, sorted by descending similarity.
    pub fn find_similar_pairs<S>(&self, source: &mut S) -> Result<Vec<SimilarPair>>
    where
        S: ShingleSource + ?Sized,
    {
        let searcher = self.searcher(source)?;
        tracing::info!(
            method = ?self.method,
            threshold = self.threshold,
            documents = searcher.len(),
            "searching similar pairs"
        );
        let pairs = searcher.similar_pairs_above(self.threshold)?;
        Ok(sort_pairs(pairs, SortOrder::Descending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::source::{Document, MemorySource};

    /// A source that fails on any access.
    struct Unreadable;

    impl ShingleSource for Unreadable {
        fn next_document(&mut self) -> Result<Option<Document>> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into())
        }
        fn reset(&mut self) -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into())
        }
        fn num_shingles(&self) -> usize {
            1000
        }
    }

    fn texts() -> Vec<(u64, &'static str)> {
        vec![
            (0, "hello world"),
            (1, "hello word"),
            (2, "goodbye world"),
            (3, "hello there"),
        ]
    }

    #[test]
    fn test_parse_method() {
        assert_eq!("bf".parse(), Ok(Method::BruteForce));
        assert_eq!("brute-force".parse(), Ok(Method::BruteForce));
        assert_eq!("lsh".parse(), Ok(Method::Lsh));
        assert!("minhash".parse::<Method>().is_err());
    }

    #[test]
    fn test_missing_lsh_parameters() {
        let config = SearchConfig::new(Method::Lsh, 0.5, 3);
        assert!(matches!(
            config.validate(),
            Err(FindSimpairsError::Config(_))
        ));
        // Reported before the source is touched.
        assert!(matches!(
            config.find_similar_pairs(&mut Unreadable),
            Err(FindSimpairsError::Config(_))
        ));
        assert!(SearchConfig::new(Method::BruteForce, 0.5, 3)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_invalid_parameters() {
        let config = SearchConfig::new(Method::Lsh, 0.5, 3).bands(100, 30);
        assert!(config.validate().is_err());
        assert!(SearchConfig::new(Method::BruteForce, 1.0, 3)
            .validate()
            .is_err());
        assert!(SearchConfig::new(Method::BruteForce, 0.5, 0)
            .validate()
            .is_err());
        let mut config = SearchConfig::new(Method::BruteForce, 0.5, 3);
        config.num_shingles = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unreadable_source() {
        let config = SearchConfig::new(Method::Lsh, 0.5, 3).bands(10, 5);
        assert!(matches!(
            config.find_similar_pairs(&mut Unreadable),
            Err(FindSimpairsError::Io(_))
        ));
    }

    #[test]
    fn test_brute_force_descending() {
        let mut config = SearchConfig::new(Method::BruteForce, 0.1, 3);
        config.num_shingles = 1 << 20;
        let shingler = config.shingler().unwrap();
        let mut source = MemorySource::from_texts(&shingler, texts());
        let pairs = config.find_similar_pairs(&mut source).unwrap();
        assert_eq!(pairs[0].key(), (0, 1));
        assert!(pairs
            .windows(2)
            .all(|w| w[0].similarity() >= w[1].similarity()));
    }

    #[test]
    fn test_lsh_reproducible() {
        let mut config = SearchConfig::new(Method::Lsh, 0.3, 3).bands(100, 50);
        config.num_shingles = 60_000;
        config.seed = 99;
        let run = || {
            let shingler = config.shingler().unwrap();
            let mut source = MemorySource::from_texts(&shingler, texts());
            config
                .find_similar_pairs(&mut source)
                .unwrap()
                .iter()
                .map(|p| (p.key(), p.similarity()))
                .collect::<Vec<_>>()
        };
        let first = run();
        assert_eq!(first, run());
        assert_eq!(first[0].0, (0, 1));
    }

    #[test]
    fn test_seeds_differ() {
        let config = SearchConfig::new(Method::Lsh, 0.5, 3).bands(10, 5);
        let mut other = config;
        other.seed += 1;
        assert_ne!(config.seeds(), other.seeds());
        assert_eq!(config.seeds(), config.seeds());
    }
}
