// Back-off trigram model read from an ARPA file produced by SRILM.

use std::f64::consts::LOG10_E;
use std::path::Path;

use anyhow::Result;
use log::{debug, info, warn};
use rand::RngCore;

use crate::counter::WeightedMap;
use crate::data_reader::BufReader;
use crate::lms::{generate_with, previous_two, sample_unigram, LM};
use crate::ngram_counts::{START, STOP, UNKNOWN};

const ARPA_START: &str = "<s>";
const ARPA_STOP: &str = "</s>";
const ARPA_UNKNOWN: &str = "<unk>";

/// ln of the ARPA "impossible" log10 probability -99, used when a file has
/// no `<unk>` entry.
const MIN_LOG_PROBABILITY: f64 = -99. / LOG10_E;

/// Natural-log probabilities and back-off weights keyed by space-joined
/// n-gram text.
pub struct SriLM {
    pub name: String,
    probabilities: WeightedMap<String>,
    backoffs: WeightedMap<String>,
    unigrams: WeightedMap<String>,
}

fn arpa_token(token: &str) -> &str {
    match token {
        START => ARPA_START,
        STOP => ARPA_STOP,
        _ => token,
    }
}

impl LM for SriLM {
    fn get_name(&self) -> &str {
        self.name.as_str()
    }

    fn order(&self) -> usize {
        3
    }

    fn get_probability(&self, history: &[String], word: &str) -> f64 {
        let (u, v) = previous_two(history);
        self.get_trigram_probability(arpa_token(&u), arpa_token(&v), arpa_token(word))
    }

    /// Samples unigrams, ignoring history.
    fn generate_sentence(&self, rng: &mut dyn RngCore) -> Vec<String> {
        generate_with(self.order(), rng, |_, rng| sample_unigram(&self.unigrams, rng))
    }
}

impl SriLM {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let lines = BufReader::open(path)?.map(|line| line.map(|line| line.to_string()));
        let mut lm = Self::from_lines(lines)?;
        lm.name = format!("sri({})", path.display());
        Ok(lm)
    }

    /// Read the n-gram entries of an ARPA file: lines starting with `-`,
    /// holding `log10 p <TAB> n-gram [<TAB> log10 back-off]`. Section
    /// headers and other lines are skipped; malformed entries are logged and
    /// skipped.
    pub fn from_lines<I, L>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = std::io::Result<L>>,
        L: AsRef<str>,
    {
        let mut probabilities = WeightedMap::new();
        let mut backoffs = WeightedMap::new();
        for (idx, line) in lines.into_iter().enumerate() {
            let line = line?;
            let line = line.as_ref();
            if !line.starts_with('-') {
                continue;
            }
            let parts: Vec<&str> = line.split('\t').collect();
            if parts.len() != 2 && parts.len() != 3 {
                warn!("line {}: expected 2 or 3 columns, got {:?}", idx + 1, parts);
                continue;
            }
            let probability = match parts[0].trim().parse::<f64>() {
                Ok(probability) => probability / LOG10_E,
                Err(err) => {
                    warn!("line {}: bad probability {:?}: {}", idx + 1, parts[0], err);
                    continue;
                }
            };
            let ngram = parts[1].trim().to_string();
            if parts.len() == 3 {
                match parts[2].trim().parse::<f64>() {
                    Ok(backoff) => backoffs.set(ngram.clone(), backoff / LOG10_E),
                    Err(err) => warn!("line {}: bad back-off {:?}: {}", idx + 1, parts[2], err),
                }
            }
            probabilities.set(ngram, probability);
        }

        let unigrams = Self::unigram_distribution(&probabilities);
        info!(
            "read {} n-grams, {} back-off weights, {} unigrams",
            probabilities.len(),
            backoffs.len(),
            unigrams.len()
        );
        Ok(Self {
            name: "sri".to_string(),
            probabilities,
            backoffs,
            unigrams,
        })
    }

    // Unigram entries as probabilities in our own token names.
    fn unigram_distribution(probabilities: &WeightedMap<String>) -> WeightedMap<String> {
        probabilities
            .iter()
            .filter(|(ngram, _)| !ngram.contains(' ') && ngram.as_str() != ARPA_START)
            .map(|(ngram, log_probability)| {
                let token = match ngram.as_str() {
                    ARPA_STOP => STOP.to_string(),
                    ARPA_UNKNOWN => UNKNOWN.to_string(),
                    _ => ngram.clone(),
                };
                (token, log_probability.exp())
            })
            .collect()
    }

    /// Exact trigram, else bigram plus the back-off of `(u, v)`, else
    /// unigram (or `<unk>`) plus the back-off of `v`.
    pub fn get_trigram_probability(&self, u: &str, v: &str, word: &str) -> f64 {
        let trigram = format!("{} {} {}", u, v, word);
        if self.probabilities.contains_key(trigram.as_str()) {
            return self.probabilities.get(trigram.as_str()).exp();
        }

        let bigram = format!("{} {}", v, word);
        if self.probabilities.contains_key(bigram.as_str()) {
            let context = format!("{} {}", u, v);
            return (self.probabilities.get(bigram.as_str()) + self.backoffs.get(context.as_str()))
                .exp();
        }

        let unigram = if self.probabilities.contains_key(word) {
            self.probabilities.get(word)
        } else {
            debug!("unknown word: {}", word);
            if self.probabilities.contains_key(ARPA_UNKNOWN) {
                self.probabilities.get(ARPA_UNKNOWN)
            } else {
                MIN_LOG_PROBABILITY
            }
        };
        (unigram + self.backoffs.get(v)).exp()
    }
}
