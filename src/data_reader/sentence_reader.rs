use std::path::Path;

use anyhow::{Context, Result};

use crate::data_reader::BufReader;

/// Split a line into lower-cased whitespace tokens.
pub fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_lowercase).collect()
}

/// One sentence per line. Blank lines are skipped.
pub struct SentenceReader {
    lines: BufReader,
}

impl SentenceReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            lines: BufReader::open(path)?,
        })
    }

    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<Vec<String>>> {
        let path = path.as_ref();
        Self::open(path)?
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("cannot read sentences from {}", path.display()))
    }
}

impl Iterator for SentenceReader {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            match line {
                Ok(line) => {
                    let sentence = tokenize(&line);
                    if !sentence.is_empty() {
                        return Some(Ok(sentence));
                    }
                }
                Err(err) => return Some(Err(err.into())),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_all() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("train.txt");
        std::fs::write(&path, "The cat  SAT\n\n   \nit ran .\n").unwrap();
        let sentences = SentenceReader::read_all(&path).unwrap();
        assert_eq!(
            sentences,
            vec![vec!["the", "cat", "sat"], vec!["it", "ran", "."]]
        );
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        assert!(SentenceReader::read_all(dir.path().join("missing.txt")).is_err());
    }
}
