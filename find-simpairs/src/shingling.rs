//! w-shingling of documents into sets of integer shingle ids.
use std::ops::Range;

use hashbrown::HashSet;

use crate::errors::{FindSimpairsError, Result};

/// Iterator over the windows of `window_size` consecutive tokens.
pub struct ShingleIter<'a, T> {
    tokens: &'a [T],
    window_size: usize,
    position: usize,
}

impl<'a, T> ShingleIter<'a, T> {
    /// Creates an instance.
    pub fn new(tokens: &'a [T], window_size: usize) -> Self {
        Self {
            tokens,
            window_size,
            position: 0,
        }
    }
}

impl<'a, T> Iterator for ShingleIter<'a, T> {
    type Item = &'a [T];

    fn next(&mut self) -> Option<Self::Item> {
        if self.tokens.len() < self.position + self.window_size {
            return None;
        }
        let window = &self.tokens[self.position..self.position + self.window_size];
        self.position += 1;
        Some(window)
    }
}

/// Maps documents to sets of shingle ids in `[0, num_shingles)`.
///
/// Each window of `window_size` consecutive tokens (characters by default) is hashed
/// with MurmurHash3 and reduced modulo `num_shingles`.
#[derive(Clone, Copy, Debug)]
pub struct Shingler {
    window_size: usize,
    num_shingles: usize,
    delimiter: Option<char>,
    seed: u32,
}

impl Shingler {
    /// Creates an instance.
    ///
    /// # Arguments
    ///
    /// * `window_size` - Number of tokens in one shingle (must be more than 0).
    /// * `num_shingles` - Size of the shingle id domain (must be in `[1, 2^32]`).
    /// * `seed` - Seed value for the shingle hash.
    pub fn new(window_size: usize, num_shingles: usize, seed: u32) -> Result<Self> {
        if window_size == 0 {
            return Err(FindSimpairsError::config("Shingle length must not be 0."));
        }
        if num_shingles == 0 || num_shingles as u64 > 1 << 32 {
            return Err(FindSimpairsError::config(format!(
                "The number of shingles must be in [1, 2^32], but got {num_shingles}."
            )));
        }
        Ok(Self {
            window_size,
            num_shingles,
            delimiter: None,
            seed,
        })
    }

    /// Sets the delimiter for recognizing words as tokens.
    /// If `None`, characters are used for tokens.
    pub const fn delimiter(mut self, delimiter: Option<char>) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Gets the size of the shingle id domain.
    pub const fn num_shingles(&self) -> usize {
        self.num_shingles
    }

    /// Gets the number of tokens in one shingle.
    pub const fn window_size(&self) -> usize {
        self.window_size
    }

    /// Computes the shingle set of `text`.
    /// A text with fewer tokens than the window size has no shingles.
    pub fn shingle<S>(&self, text: S) -> HashSet<u32>
    where
        S: AsRef<str>,
    {
        let text = text.as_ref();
        let token_ranges = self.tokenize(text);
        ShingleIter::new(&token_ranges, self.window_size)
            .map(|ranges| {
                let span = ranges[0].start..ranges[ranges.len() - 1].end;
                self.hash_shingle(&text[span])
            })
            .collect()
    }

    fn hash_shingle(&self, shingle: &str) -> u32 {
        let h = lsh::hash_bytes(shingle.as_bytes(), self.seed) as u64;
        (h % self.num_shingles as u64) as u32
    }

    fn tokenize(&self, text: &str) -> Vec<Range<usize>> {
        let mut token_ranges = vec![];
        let mut offset = 0;
        if let Some(delim) = self.delimiter {
            while offset < text.len() {
                let len = text[offset..].find(delim);
                if let Some(len) = len {
                    token_ranges.push(offset..offset + len);
                    offset += len + delim.len_utf8();
                } else {
                    token_ranges.push(offset..text.len());
                    break;
                }
            }
        } else {
            for c in text.chars() {
                let len = c.len_utf8();
                token_ranges.push(offset..offset + len);
                offset += len;
            }
        }
        token_ranges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_q1() {
        let tokens = vec!["a", "b", "c"];
        let mut iter = ShingleIter::new(&tokens, 1);
        assert_eq!(iter.next(), Some(&tokens[0..1]));
        assert_eq!(iter.next(), Some(&tokens[1..2]));
        assert_eq!(iter.next(), Some(&tokens[2..3]));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_q2() {
        let tokens = vec!["a", "b", "c"];
        let mut iter = ShingleIter::new(&tokens, 2);
        assert_eq!(iter.next(), Some(&tokens[0..2]));
        assert_eq!(iter.next(), Some(&tokens[1..3]));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_q4() {
        let tokens = vec!["a", "b", "c"];
        let mut iter = ShingleIter::new(&tokens, 4);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_char_trigram() {
        let shingler = Shingler::new(3, 1 << 20, 42).unwrap();
        let shingles = shingler.shingle("abcd");
        let expected: HashSet<u32> = [shingler.hash_shingle("abc"), shingler.hash_shingle("bcd")]
            .into_iter()
            .collect();
        assert_eq!(shingles, expected);
    }

    #[test]
    fn test_word_bigram() {
        let shingler = Shingler::new(2, 1 << 20, 42)
            .unwrap()
            .delimiter(Some(' '));
        let shingles = shingler.shingle("abc de fgh");
        let expected: HashSet<u32> = [
            shingler.hash_shingle("abc de"),
            shingler.hash_shingle("de fgh"),
        ]
        .into_iter()
        .collect();
        assert_eq!(shingles, expected);
    }

    #[test]
    fn test_multibyte_chars() {
        let shingler = Shingler::new(2, 1 << 20, 7).unwrap();
        let shingles = shingler.shingle("神保町");
        let expected: HashSet<u32> = [shingler.hash_shingle("神保"), shingler.hash_shingle("保町")]
            .into_iter()
            .collect();
        assert_eq!(shingles, expected);
    }

    #[test]
    fn test_repeated_shingles_collapse() {
        let shingler = Shingler::new(2, 1000, 0).unwrap();
        assert_eq!(shingler.shingle("aaaaaa").len(), 1);
    }

    #[test]
    fn test_short_text() {
        let shingler = Shingler::new(5, 1000, 0).unwrap();
        assert!(shingler.shingle("abcd").is_empty());
        assert!(shingler.shingle("").is_empty());
    }

    #[test]
    fn test_ids_in_domain() {
        let shingler = Shingler::new(3, 17, 99).unwrap();
        let shingles = shingler.shingle("the quick brown fox jumps over the lazy dog");
        assert!(!shingles.is_empty());
        assert!(shingles.iter().all(|&id| id < 17));
    }

    #[test]
    fn test_invalid_args() {
        assert!(Shingler::new(0, 100, 0).is_err());
        assert!(Shingler::new(3, 0, 0).is_err());
    }
}
