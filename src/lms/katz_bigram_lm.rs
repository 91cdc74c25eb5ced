use log::info;
use rand::RngCore;

use crate::counter::WeightedMap;
use crate::errors::ModelError;
use crate::lms::{check_training, generate_with, previous, sample_unigram, unigram_probability, LM};
use crate::ngram_counts::NGramCounts;
use crate::smoothing::{BackoffView, KatzLevel};

/// Katz back-off bigram model over the empirical unigram distribution.
pub struct KatzBigramLM {
    pub name: String,
    cutoff: usize,
    unigrams: WeightedMap<String>,
    bigrams: KatzLevel<String>,
}

impl LM for KatzBigramLM {
    fn get_name(&self) -> &str {
        self.name.as_str()
    }

    fn order(&self) -> usize {
        2
    }

    fn get_probability(&self, history: &[String], word: &str) -> f64 {
        self.get_bigram_probability(previous(history), word)
    }

    fn generate_sentence(&self, rng: &mut dyn RngCore) -> Vec<String> {
        generate_with(self.order(), rng, |history, rng| {
            self.sample_next(previous(history), rng)
        })
    }
}

impl KatzBigramLM {
    pub fn new(counts: &NGramCounts, cutoff: usize) -> Result<Self, ModelError> {
        check_training(counts)?;
        let unigrams = counts.unigram_distribution();
        let bigrams = KatzLevel::estimate(counts.bigrams.clone(), cutoff, |_| &unigrams)?;
        let name = format!("katz-bigram(K={})", cutoff);
        info!("{}: {} contexts", name, bigrams.probabilities().len());
        Ok(Self {
            name,
            cutoff,
            unigrams,
            bigrams,
        })
    }

    /// Stored bigram probability, or the unigram probability scaled by the
    /// back-off weight of `previous`.
    pub fn get_bigram_probability(&self, previous: &str, word: &str) -> f64 {
        match self.bigrams.probability(previous, word) {
            Some(probability) => probability,
            None => self.bigrams.backoff_weight(previous) * unigram_probability(&self.unigrams, word),
        }
    }

    pub fn backoff_weight(&self, previous: &str) -> f64 {
        self.bigrams.backoff_weight(previous)
    }

    /// P(. | previous) over the vocabulary, as a lower order for trigrams.
    pub fn conditional(&self, previous: &str) -> BackoffView<'_> {
        self.bigrams.view(previous, &self.unigrams)
    }

    /// Draw from the stored distribution after `previous`; a draw that lands
    /// in the reserved mass is taken from the unigrams.
    pub(crate) fn sample_next(&self, previous: &str, rng: &mut dyn RngCore) -> String {
        let sampled = match self.bigrams.distribution(previous) {
            Some(distribution) => distribution.sample(rng).cloned(),
            None => None,
        };
        match sampled {
            Some(word) => word,
            None => sample_unigram(&self.unigrams, rng),
        }
    }

    pub fn cutoff(&self) -> usize {
        self.cutoff
    }

    pub fn unigrams(&self) -> &WeightedMap<String> {
        &self.unigrams
    }

    pub fn levels(&self) -> &KatzLevel<String> {
        &self.bigrams
    }
}
