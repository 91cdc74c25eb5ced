// Raw unigram, bigram and trigram counts of a training corpus.

use serde::{Deserialize, Serialize};

use crate::counter::{NestedWeightedMap, WeightedMap};

pub const START: &str = "<S>";
pub const STOP: &str = "</S>";
pub const UNKNOWN: &str = "*UNKNOWN*";

/// Context of a trigram: the two preceding tokens.
pub type Bigram = (String, String);

/// `order - 1` START tokens, the sentence, then STOP.
pub fn pad_sentence<S: AsRef<str>>(sentence: &[S], order: usize) -> Vec<String> {
    let n_start = order.saturating_sub(1);
    let mut padded = Vec::with_capacity(sentence.len() + n_start + 1);
    padded.extend((0..n_start).map(|_| START.to_string()));
    padded.extend(sentence.iter().map(|word| word.as_ref().to_string()));
    padded.push(STOP.to_string());
    padded
}

/// Counts gathered in one pass over trigram-padded sentences.
///
/// Every predicted token (each word and the final STOP) is counted once per
/// order, so START never appears as a unigram. Bigram contexts include START,
/// trigram contexts include `(START, START)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NGramCounts {
    pub unigrams: WeightedMap<String>,
    pub bigrams: NestedWeightedMap<String, String>,
    pub trigrams: NestedWeightedMap<Bigram, String>,
    pub n_sentences: usize,
}

impl NGramCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sentences<I>(sentences: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<[String]>,
    {
        let mut counts = Self::new();
        for sentence in sentences {
            counts.add_sentence(sentence.as_ref());
        }
        counts
    }

    pub fn add_sentence<S: AsRef<str>>(&mut self, sentence: &[S]) {
        let padded = pad_sentence(sentence, 3);
        for window in padded.windows(3) {
            let (u, v, w) = (&window[0], &window[1], &window[2]);
            self.unigrams.increment(w.clone(), 1.);
            self.bigrams.increment(v.clone(), w.clone(), 1.);
            self.trigrams
                .increment((u.clone(), v.clone()), w.clone(), 1.);
        }
        self.n_sentences += 1;
    }

    /// Number of predicted tokens, STOP included.
    pub fn n_tokens(&self) -> f64 {
        self.unigrams.total()
    }

    pub fn is_empty(&self) -> bool {
        self.n_sentences == 0
    }

    /// Empirical unigram distribution with one extra count reserved for
    /// UNKNOWN, so that words never seen in training keep positive mass.
    pub fn unigram_distribution(&self) -> WeightedMap<String> {
        let mut unigrams = self.unigrams.clone();
        unigrams.increment(UNKNOWN.to_string(), 1.);
        unigrams.normalize();
        unigrams
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Vec<String>> {
        vec!["the cat sat", "the dog sat"]
            .into_iter()
            .map(|line| line.split_whitespace().map(String::from).collect())
            .collect()
    }

    #[test]
    fn test_pad_sentence() {
        assert_eq!(pad_sentence(&["a", "b"], 1), vec!["a", "b", STOP]);
        assert_eq!(pad_sentence(&["a"], 2), vec![START, "a", STOP]);
        assert_eq!(pad_sentence(&["a"], 3), vec![START, START, "a", STOP]);
        let empty: [&str; 0] = [];
        assert_eq!(pad_sentence(&empty, 2), vec![START, STOP]);
    }

    #[test]
    fn test_counts() {
        let counts = NGramCounts::from_sentences(&corpus());
        assert_eq!(counts.n_sentences, 2);
        assert_eq!(counts.n_tokens(), 8.);
        assert_eq!(counts.unigrams.get("the"), 2.);
        assert_eq!(counts.unigrams.get(STOP), 2.);
        assert!(!counts.unigrams.contains_key(START));

        assert_eq!(counts.bigrams.get(START, "the"), 2.);
        assert_eq!(counts.bigrams.get("cat", "sat"), 1.);
        assert_eq!(counts.bigrams.get("sat", STOP), 2.);

        let context = (START.to_string(), START.to_string());
        assert_eq!(counts.trigrams.get(&context, "the"), 2.);
        let context = ("the".to_string(), "cat".to_string());
        assert_eq!(counts.trigrams.get(&context, "sat"), 1.);
        assert_eq!(counts.trigrams.total(), counts.n_tokens());
    }

    #[test]
    fn test_unigram_distribution() {
        let counts = NGramCounts::from_sentences(&corpus());
        let unigrams = counts.unigram_distribution();
        assert!((unigrams.get(UNKNOWN) - 1. / 9.).abs() < 1e-12);
        assert!((unigrams.get("sat") - 2. / 9.).abs() < 1e-12);
        assert!((unigrams.total() - 1.).abs() < 1e-12);
        // The raw counts are left as they were.
        assert!(!counts.unigrams.contains_key(UNKNOWN));
    }
}
