use log::info;
use rand::RngCore;

use crate::counter::WeightedMap;
use crate::errors::ModelError;
use crate::lms::{check_training, sample_unigram, unigram_probability, LM};
use crate::ngram_counts::{NGramCounts, STOP};

/// Empirical unigram model with one pseudo-count reserved for UNKNOWN.
pub struct UnigramLM {
    pub name: String,
    probabilities: WeightedMap<String>,
}

impl LM for UnigramLM {
    fn get_name(&self) -> &str {
        self.name.as_str()
    }

    fn order(&self) -> usize {
        1
    }

    fn get_probability(&self, _history: &[String], word: &str) -> f64 {
        unigram_probability(&self.probabilities, word)
    }

    /// Samples independent words until STOP comes up. There is no length
    /// cap, and a model that gives STOP no mass generates nothing.
    fn generate_sentence(&self, rng: &mut dyn RngCore) -> Vec<String> {
        let mut sentence = Vec::new();
        if self.probabilities.get(STOP) == 0. {
            return sentence;
        }
        loop {
            let word = sample_unigram(&self.probabilities, rng);
            if word == STOP {
                return sentence;
            }
            sentence.push(word);
        }
    }
}

impl UnigramLM {
    pub fn new(counts: &NGramCounts) -> Result<Self, ModelError> {
        check_training(counts)?;
        let probabilities = counts.unigram_distribution();
        info!(
            "unigram model over {} types, {} tokens",
            counts.unigrams.len(),
            counts.n_tokens()
        );
        Ok(Self {
            name: "unigram".to_string(),
            probabilities,
        })
    }

    pub fn probabilities(&self) -> &WeightedMap<String> {
        &self.probabilities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ngram_counts::UNKNOWN;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn words(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    fn counts() -> NGramCounts {
        NGramCounts::from_sentences(vec![words("a a b")])
    }

    fn lm() -> UnigramLM {
        UnigramLM::new(&counts()).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let mut raw = counts().unigrams;
        assert_eq!(raw.get("a"), 2.);
        assert_eq!(raw.get("b"), 1.);
        assert_eq!(raw.get(STOP), 1.);
        raw.normalize();
        assert_eq!(raw.get("a"), 0.5);
        assert_eq!(raw.get("b"), 0.25);
        assert_eq!(raw.get(STOP), 0.25);
    }

    #[test]
    fn test_probabilities() {
        let lm = lm();
        assert!((lm.get_probability(&[], "a") - 0.4).abs() < 1e-12);
        assert!((lm.get_probability(&[], UNKNOWN) - 0.2).abs() < 1e-12);
        assert_eq!(lm.get_probability(&[], "zebra"), lm.get_probability(&[], UNKNOWN));
    }

    #[test]
    fn test_unknown_sentence_degrades_gracefully() {
        let lm = lm();
        let sentence = words("zebra yak gnu");
        let expected = 0.2f64.powi(3) * 0.2;
        let probability = lm.get_sentence_probability(&sentence);
        assert!(probability > 0.);
        assert!((probability - expected).abs() < 1e-12);
    }

    #[test]
    fn test_generate_sentence() {
        let lm = lm();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let sentence = lm.generate_sentence(&mut rng);
            assert!(sentence.iter().all(|word| word != STOP));
        }
    }

    #[test]
    fn test_empty_training() {
        let empty: Vec<Vec<String>> = Vec::new();
        assert_eq!(
            UnigramLM::new(&NGramCounts::from_sentences(empty)).err(),
            Some(ModelError::EmptyTraining)
        );
    }
}
