use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use bincode::deserialize_from;

use crate::ngram_counts::NGramCounts;

pub trait Load {
    fn load(load_path: impl AsRef<Path>) -> Result<Self>
    where
        Self: Sized;
}

// load_path should be a file written by `Save::save`.
impl Load for NGramCounts {
    fn load(load_path: impl AsRef<Path>) -> Result<Self> {
        let load_path = load_path.as_ref();
        let file = fs::OpenOptions::new()
            .read(true)
            .open(load_path)
            .with_context(|| format!("cannot open {}", load_path.display()))?;
        Ok(deserialize_from(&file)?)
    }
}
