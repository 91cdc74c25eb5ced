pub mod interpolated_lm;
pub mod katz_bigram_lm;
pub mod katz_trigram_lm;
pub mod sri_lm;
pub mod unigram_lm;

pub use self::interpolated_lm::{Estimator, InterpolatedTrigramLM, Lambdas};
pub use self::katz_bigram_lm::KatzBigramLM;
pub use self::katz_trigram_lm::KatzTrigramLM;
pub use self::sri_lm::SriLM;
pub use self::unigram_lm::UnigramLM;

use log::warn;
use rand::RngCore;

use crate::counter::WeightedMap;
use crate::errors::ModelError;
use crate::ngram_counts::{pad_sentence, NGramCounts, START, STOP, UNKNOWN};

/// Longest sentence generated by a model conditioned on history.
pub const MAX_GENERATED_LENGTH: usize = 100;

pub trait LM {
    fn get_name(&self) -> &str;

    /// n of the n-gram model: each prediction sees `order - 1` tokens.
    fn order(&self) -> usize;

    /// P(word | history). `history` is the padded sentence up to, not
    /// including, `word`; models read as much of its tail as they need.
    fn get_probability(&self, history: &[String], word: &str) -> f64;

    fn generate_sentence(&self, rng: &mut dyn RngCore) -> Vec<String>;

    /// Natural log of the probability of the padded sentence, STOP included.
    fn get_sentence_log_probability(&self, sentence: &[String]) -> f64 {
        let padded = pad_sentence(sentence, self.order());
        let first = self.order().saturating_sub(1);
        (first..padded.len())
            .map(|idx| self.get_probability(&padded[..idx], &padded[idx]).ln())
            .sum()
    }

    fn get_sentence_probability(&self, sentence: &[String]) -> f64 {
        let log_probability = self.get_sentence_log_probability(sentence);
        let probability = log_probability.exp();
        if probability == 0. && log_probability.is_finite() {
            warn!(
                "{}: sentence probability underflows (ln p = {:.2})",
                self.get_name(),
                log_probability
            );
        }
        probability
    }
}

pub(crate) fn check_training(counts: &NGramCounts) -> Result<(), ModelError> {
    if counts.is_empty() || counts.n_tokens() == 0. {
        return Err(ModelError::EmptyTraining);
    }
    Ok(())
}

/// Unigram probability, falling back to the mass reserved for UNKNOWN.
pub(crate) fn unigram_probability(unigrams: &WeightedMap<String>, word: &str) -> f64 {
    let probability = unigrams.get(word);
    if probability > 0. {
        probability
    } else {
        unigrams.get(UNKNOWN)
    }
}

pub(crate) fn sample_unigram(unigrams: &WeightedMap<String>, rng: &mut dyn RngCore) -> String {
    match unigrams.sample(rng) {
        Some(word) => word.clone(),
        None => UNKNOWN.to_string(),
    }
}

/// Draw tokens with `next` until it yields STOP or the sentence reaches
/// `MAX_GENERATED_LENGTH`. `next` sees the START-padded history.
pub(crate) fn generate_with<F>(order: usize, rng: &mut dyn RngCore, mut next: F) -> Vec<String>
where
    F: FnMut(&[String], &mut dyn RngCore) -> String,
{
    let n_start = order.saturating_sub(1);
    let mut history: Vec<String> = (0..n_start).map(|_| START.to_string()).collect();
    while history.len() - n_start < MAX_GENERATED_LENGTH {
        let word = next(&history, &mut *rng);
        if word == STOP {
            break;
        }
        history.push(word);
    }
    history.split_off(n_start)
}

/// The last token of `history`, or START before the first word.
pub(crate) fn previous(history: &[String]) -> &str {
    history.last().map(String::as_str).unwrap_or(START)
}

/// The last two tokens of `history`, padded with START.
pub(crate) fn previous_two(history: &[String]) -> (String, String) {
    let n = history.len();
    let u = if n >= 2 { history[n - 2].as_str() } else { START };
    (u.to_string(), previous(history).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Uniform over two words and STOP, ignoring history.
    struct Uniform;

    impl LM for Uniform {
        fn get_name(&self) -> &str {
            "uniform"
        }

        fn order(&self) -> usize {
            2
        }

        fn get_probability(&self, _history: &[String], _word: &str) -> f64 {
            1. / 3.
        }

        fn generate_sentence(&self, rng: &mut dyn RngCore) -> Vec<String> {
            generate_with(self.order(), rng, |_, _| "a".to_string())
        }
    }

    fn words(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_sentence_probability() {
        let lm = Uniform;
        let sentence = words("a b");
        assert!((lm.get_sentence_probability(&sentence) - (1f64 / 3.).powi(3)).abs() < 1e-12);
        assert!((lm.get_sentence_log_probability(&[]) - (1f64 / 3.).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_underflow_is_zero_not_nan() {
        let lm = Uniform;
        let long = vec!["a".to_string(); 2000];
        assert_eq!(lm.get_sentence_probability(&long), 0.);
        assert!(lm.get_sentence_log_probability(&long).is_finite());
    }

    #[test]
    fn test_generation_is_capped() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(Uniform.generate_sentence(&mut rng).len(), MAX_GENERATED_LENGTH);
    }

    #[test]
    fn test_history_helpers() {
        assert_eq!(previous(&[]), START);
        assert_eq!(previous(&words("x y")), "y");
        assert_eq!(previous_two(&words("y")), (START.to_string(), "y".to_string()));
        assert_eq!(previous_two(&words("x y z")), ("y".to_string(), "z".to_string()));
    }
}
