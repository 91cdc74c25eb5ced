use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use bincode::serialize_into;

use crate::ngram_counts::NGramCounts;

pub trait Save {
    fn save(&self, save_path: impl AsRef<Path>) -> Result<()>;
}

impl Save for NGramCounts {
    fn save(&self, save_path: impl AsRef<Path>) -> Result<()> {
        let save_path = save_path.as_ref();
        let save_file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(save_path)
            .with_context(|| format!("cannot create {}", save_path.display()))?;
        serialize_into(&save_file, &self)?;
        Ok(())
    }
}
