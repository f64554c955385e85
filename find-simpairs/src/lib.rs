//! Fast all-pair similarity searches in documents with MinHash and LSH banding.
//!
//! Documents are read from a [`ShingleSource`] as sets of shingle ids, and
//! either compared exhaustively with [`BruteForceSearcher`] or summarized into
//! MinHash signatures whose bands are bucketed by [`LshSearcher`].
#![deny(missing_docs)]

pub mod brute_force;
pub mod config;
pub mod errors;
pub mod lsh_search;
pub mod pair;
pub mod searcher;
pub mod shingling;
pub mod source;
pub mod verify;

pub use brute_force::BruteForceSearcher;
pub use config::{Method, SearchConfig};
pub use errors::{FindSimpairsError, Result};
pub use lsh_search::{LshConfig, LshSearcher, SignatureWidth, Verification};
pub use pair::{sort_pairs, SimilarPair, SortOrder};
pub use searcher::SimilaritySearcher;
pub use shingling::Shingler;
pub use source::{Document, MemorySource, ShingleSource, TsvReader};
