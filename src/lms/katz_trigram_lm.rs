use log::info;
use rand::RngCore;

use crate::errors::ModelError;
use crate::lms::{generate_with, previous_two, KatzBigramLM, LM};
use crate::ngram_counts::{Bigram, NGramCounts};
use crate::smoothing::KatzLevel;

/// Katz back-off trigram model: trigram, then the back-off bigram
/// conditional, then unigrams, then the UNKNOWN mass.
pub struct KatzTrigramLM {
    pub name: String,
    bigram: KatzBigramLM,
    trigrams: KatzLevel<Bigram>,
}

impl LM for KatzTrigramLM {
    fn get_name(&self) -> &str {
        self.name.as_str()
    }

    fn order(&self) -> usize {
        3
    }

    fn get_probability(&self, history: &[String], word: &str) -> f64 {
        let context = previous_two(history);
        match self.trigrams.probability(&context, word) {
            Some(probability) => probability,
            None => {
                self.trigrams.backoff_weight(&context)
                    * self.bigram.get_bigram_probability(&context.1, word)
            }
        }
    }

    fn generate_sentence(&self, rng: &mut dyn RngCore) -> Vec<String> {
        generate_with(self.order(), rng, |history, rng| {
            let context = previous_two(history);
            let sampled = match self.trigrams.distribution(&context) {
                Some(distribution) => distribution.sample(rng).cloned(),
                None => None,
            };
            match sampled {
                Some(word) => word,
                None => self.bigram.sample_next(&context.1, rng),
            }
        })
    }
}

impl KatzTrigramLM {
    pub fn new(counts: &NGramCounts, cutoff: usize) -> Result<Self, ModelError> {
        let bigram = KatzBigramLM::new(counts, cutoff)?;
        let trigrams = KatzLevel::estimate(counts.trigrams.clone(), cutoff, |context: &Bigram| {
            bigram.conditional(&context.1)
        })?;
        let name = format!("katz-trigram(K={})", cutoff);
        info!("{}: {} contexts", name, trigrams.probabilities().len());
        Ok(Self {
            name,
            bigram,
            trigrams,
        })
    }

    pub fn backoff_weight(&self, context: &Bigram) -> f64 {
        self.trigrams.backoff_weight(context)
    }

    pub fn bigram(&self) -> &KatzBigramLM {
        &self.bigram
    }

    pub fn levels(&self) -> &KatzLevel<Bigram> {
        &self.trigrams
    }
}
