//! Sources of shingled documents.
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use hashbrown::HashSet;

use crate::errors::{FindSimpairsError, Result};
use crate::shingling::Shingler;

/// A document represented by its external id and shingle set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    /// Stable identifier given by the input.
    pub external_id: u64,
    /// Shingle ids in `[0, num_shingles)`.
    pub shingles: HashSet<u32>,
}

impl Document {
    /// Creates an instance.
    pub fn new<I>(external_id: u64, shingles: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        Self {
            external_id,
            shingles: shingles.into_iter().collect(),
        }
    }
}

/// Restartable sequence of shingled documents.
///
/// Documents are numbered by internal indices `0, 1, ...` in read order.
pub trait ShingleSource {
    /// Reads the next document, or `None` if the source is exhausted.
    fn next_document(&mut self) -> Result<Option<Document>>;

    /// Rewinds the source to the first document.
    fn reset(&mut self) -> Result<()>;

    /// Gets the size of the shingle id domain.
    fn num_shingles(&self) -> usize;

    /// Reads all documents from the beginning.
    fn read_all(&mut self) -> Result<Vec<Document>> {
        self.reset()?;
        let mut documents = vec![];
        while let Some(document) = self.next_document()? {
            documents.push(document);
        }
        Ok(documents)
    }
}

/// Source of documents held in memory.
#[derive(Clone, Debug)]
pub struct MemorySource {
    documents: Vec<Document>,
    num_shingles: usize,
    position: usize,
}

impl MemorySource {
    /// Creates an instance from shingled documents.
    pub fn new(num_shingles: usize, documents: Vec<Document>) -> Self {
        Self {
            documents,
            num_shingles,
            position: 0,
        }
    }

    /// Creates an instance by shingling pairs of an external id and a text.
    pub fn from_texts<I, D>(shingler: &Shingler, texts: I) -> Self
    where
        I: IntoIterator<Item = (u64, D)>,
        D: AsRef<str>,
    {
        let documents = texts
            .into_iter()
            .map(|(external_id, text)| Document {
                external_id,
                shingles: shingler.shingle(text),
            })
            .collect();
        Self::new(shingler.num_shingles(), documents)
    }

    /// Gets the number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Checks if the source has no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl ShingleSource for MemorySource {
    fn next_document(&mut self) -> Result<Option<Document>> {
        let document = self.documents.get(self.position).cloned();
        if document.is_some() {
            self.position += 1;
        }
        Ok(document)
    }

    fn reset(&mut self) -> Result<()> {
        self.position = 0;
        Ok(())
    }

    fn num_shingles(&self) -> usize {
        self.num_shingles
    }
}

/// Reader of tab-separated documents, one per line, in the form
/// `<ignored>\t<external id>\t<text>`.
///
/// Blank lines are skipped. Columns after the third are ignored.
pub struct TsvReader {
    path: PathBuf,
    shingler: Shingler,
    max_documents: Option<usize>,
    lines: Lines<BufReader<File>>,
    line_no: usize,
    num_read: usize,
}

impl TsvReader {
    /// Opens a file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the file.
    /// * `shingler` - Shingler applied to the text column.
    /// * `max_documents` - Maximum number of documents read per pass. If `None`, all lines are read.
    pub fn open<P>(path: P, shingler: Shingler, max_documents: Option<usize>) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref().to_path_buf();
        let lines = BufReader::new(File::open(&path)?).lines();
        Ok(Self {
            path,
            shingler,
            max_documents,
            lines,
            line_no: 0,
            num_read: 0,
        })
    }

    fn parse_line(&self, line: &str) -> Result<Document> {
        let mut cols = line.split('\t');
        let (Some(_), Some(id), Some(text)) = (cols.next(), cols.next(), cols.next()) else {
            return Err(FindSimpairsError::input(format!(
                "{}:{}: expected at least 3 tab-separated columns.",
                self.path.display(),
                self.line_no
            )));
        };
        let external_id = id.trim().parse::<u64>().map_err(|e| {
            FindSimpairsError::input(format!(
                "{}:{}: invalid document id {id:?}: {e}",
                self.path.display(),
                self.line_no
            ))
        })?;
        Ok(Document {
            external_id,
            shingles: self.shingler.shingle(text),
        })
    }
}

impl ShingleSource for TsvReader {
    fn next_document(&mut self) -> Result<Option<Document>> {
        if self.max_documents.map_or(false, |max| self.num_read >= max) {
            return Ok(None);
        }
        loop {
            let Some(line) = self.lines.next() else {
                return Ok(None);
            };
            let line = line?;
            self.line_no += 1;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let document = self.parse_line(line)?;
            self.num_read += 1;
            if self.num_read % 100000 == 0 {
                tracing::info!(documents = self.num_read, "reading documents");
            }
            return Ok(Some(document));
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.lines = BufReader::new(File::open(&self.path)?).lines();
        self.line_no = 0;
        self.num_read = 0;
        Ok(())
    }

    fn num_shingles(&self) -> usize {
        self.shingler.num_shingles()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    fn write_tmp(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "find-simpairs-{}-{name}.tsv",
            std::process::id()
        ));
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_memory_source_reset() {
        let mut source = MemorySource::new(
            10,
            vec![Document::new(7, [1, 2]), Document::new(9, [3])],
        );
        assert_eq!(source.next_document().unwrap().unwrap().external_id, 7);
        assert_eq!(source.next_document().unwrap().unwrap().external_id, 9);
        assert!(source.next_document().unwrap().is_none());
        let all = source.read_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].shingles, [3].into_iter().collect::<HashSet<u32>>());
    }

    #[test]
    fn test_memory_source_from_texts() {
        let shingler = Shingler::new(3, 1000, 0).unwrap();
        let source = MemorySource::from_texts(&shingler, [(1, "abcd"), (2, "ab")]);
        assert_eq!(source.len(), 2);
        assert_eq!(source.num_shingles(), 1000);
        assert!(source.documents[1].shingles.is_empty());
    }

    #[test]
    fn test_tsv_reader() {
        let path = write_tmp(
            "read",
            "0\t100\thello world\r\n\n1\t200\thello word\n2\t300\tgoodbye world\textra\n",
        );
        let shingler = Shingler::new(3, 1 << 20, 1).unwrap();
        let mut reader = TsvReader::open(&path, shingler, None).unwrap();
        let documents = reader.read_all().unwrap();
        let ids: Vec<_> = documents.iter().map(|d| d.external_id).collect();
        assert_eq!(ids, vec![100, 200, 300]);
        assert_eq!(documents[0].shingles, shingler.shingle("hello world"));
        assert_eq!(documents[2].shingles, shingler.shingle("goodbye world"));

        // A second pass yields the same documents.
        assert_eq!(reader.read_all().unwrap(), documents);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_tsv_reader_max_documents() {
        let path = write_tmp("max", "a\t1\tx y z\nb\t2\tx y\nc\t3\tz\n");
        let shingler = Shingler::new(1, 100, 1).unwrap();
        let mut reader = TsvReader::open(&path, shingler, Some(2)).unwrap();
        assert_eq!(reader.read_all().unwrap().len(), 2);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_tsv_reader_malformed() {
        let path = write_tmp("bad", "a\t1\tok\nb\tnot-a-number\ttext\n");
        let shingler = Shingler::new(1, 100, 1).unwrap();
        let mut reader = TsvReader::open(&path, shingler, None).unwrap();
        assert!(reader.next_document().unwrap().is_some());
        assert!(matches!(
            reader.next_document(),
            Err(FindSimpairsError::Input(_))
        ));
        std::fs::remove_file(path).unwrap();

        let path = write_tmp("short", "only\tidcolumn\n");
        let mut reader = TsvReader::open(&path, shingler, None).unwrap();
        assert!(matches!(
            reader.next_document(),
            Err(FindSimpairsError::Input(_))
        ));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_tsv_reader_missing_file() {
        let shingler = Shingler::new(1, 100, 1).unwrap();
        let result = TsvReader::open("/nonexistent/find-simpairs/input.tsv", shingler, None);
        assert!(matches!(result, Err(FindSimpairsError::Io(_))));
    }
}
