// Line-by-line reads over plain or gzip-compressed files.

use std::{
    fs::File,
    io::{self, prelude::*},
    path::Path,
    rc::Rc,
};

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;

/// Iterates the lines of a file, trailing newline stripped. Files ending in
/// `.gz` are decompressed on the fly.
///
/// The line buffer is reused whenever the caller has dropped the previous
/// line.
pub struct BufReader {
    reader: Box<dyn BufRead>,
    buf: Rc<String>,
}

fn new_buf() -> Rc<String> {
    Rc::new(String::with_capacity(2048))
}

impl BufReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
        let reader: Box<dyn BufRead> = if path.extension().map_or(false, |ext| ext == "gz") {
            Box::new(io::BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(io::BufReader::new(file))
        };
        Ok(Self::from_reader(reader))
    }

    pub fn from_reader(reader: Box<dyn BufRead>) -> Self {
        Self {
            reader,
            buf: new_buf(),
        }
    }
}

impl Iterator for BufReader {
    type Item = io::Result<Rc<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        let buf = match Rc::get_mut(&mut self.buf) {
            Some(buf) => {
                buf.clear();
                buf
            }
            None => {
                self.buf = new_buf();
                Rc::make_mut(&mut self.buf)
            }
        };

        match self.reader.read_line(buf) {
            Ok(0) => None,
            Ok(_) => {
                let trimmed = buf.trim_end_matches(&['\n', '\r'][..]).len();
                buf.truncate(trimmed);
                Some(Ok(Rc::clone(&self.buf)))
            }
            Err(err) => Some(Err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::tempdir;

    fn collect(reader: BufReader) -> Vec<String> {
        reader.map(|line| line.unwrap().to_string()).collect()
    }

    #[test]
    fn test_plain_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corpus.txt");
        std::fs::write(&path, "the cat\r\n\nsat\n").unwrap();
        let lines = collect(BufReader::open(&path).unwrap());
        assert_eq!(lines, vec!["the cat", "", "sat"]);
    }

    #[test]
    fn test_gzip_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corpus.txt.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"a b\nc").unwrap();
        encoder.finish().unwrap();
        let lines = collect(BufReader::open(&path).unwrap());
        assert_eq!(lines, vec!["a b", "c"]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        assert!(BufReader::open(dir.path().join("missing.txt")).is_err());
    }
}
