use log::info;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::counter::{NestedWeightedMap, WeightedMap};
use crate::errors::ModelError;
use crate::lms::{check_training, generate_with, previous_two, sample_unigram, unigram_probability, LM};
use crate::ngram_counts::{Bigram, NGramCounts};
use crate::smoothing::KatzLevel;

/// Interpolation weights of the trigram and bigram components; the unigram
/// gets what is left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lambdas {
    trigram: f64,
    bigram: f64,
}

impl Lambdas {
    /// The unigram weight must stay positive so that unknown words keep
    /// mass, hence the strict inequality.
    pub fn new(trigram: f64, bigram: f64) -> Result<Self, ModelError> {
        if trigram >= 0. && bigram >= 0. && trigram + bigram < 1. {
            Ok(Self { trigram, bigram })
        } else {
            Err(ModelError::InvalidLambdas(trigram, bigram))
        }
    }

    pub fn trigram(&self) -> f64 {
        self.trigram
    }

    pub fn bigram(&self) -> f64 {
        self.bigram
    }

    pub fn unigram(&self) -> f64 {
        1. - self.trigram - self.bigram
    }
}

/// How the conditional tables of an interpolated model are estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Estimator {
    /// Relative frequencies.
    Empirical,
    /// Katz-discounted conditionals, each context backing off to the order
    /// below it.
    Katz { cutoff: usize },
}

/// `l1 * P(w | u v) + l2 * P(w | v) + (1 - l1 - l2) * P(w)`.
pub struct InterpolatedTrigramLM {
    pub name: String,
    lambdas: Lambdas,
    estimator: Estimator,
    unigrams: WeightedMap<String>,
    bigrams: NestedWeightedMap<String, String>,
    trigrams: NestedWeightedMap<Bigram, String>,
}

impl LM for InterpolatedTrigramLM {
    fn get_name(&self) -> &str {
        self.name.as_str()
    }

    fn order(&self) -> usize {
        3
    }

    fn get_probability(&self, history: &[String], word: &str) -> f64 {
        let context = previous_two(history);
        self.lambdas.trigram * self.trigrams.get(&context, word)
            + self.lambdas.bigram * self.bigrams.get(context.1.as_str(), word)
            + self.lambdas.unigram() * unigram_probability(&self.unigrams, word)
    }

    /// Picks a component with probability equal to its weight, then samples
    /// from it. Mass a component does not hold is drawn from the unigrams.
    fn generate_sentence(&self, rng: &mut dyn RngCore) -> Vec<String> {
        generate_with(self.order(), rng, |history, rng| {
            let context = previous_two(history);
            let draw: f64 = rng.random();
            let component = if draw < self.lambdas.trigram {
                self.trigrams.peek(&context)
            } else if draw < self.lambdas.trigram + self.lambdas.bigram {
                self.bigrams.peek(context.1.as_str())
            } else {
                None
            };
            let sampled = match component {
                Some(distribution) => distribution.sample(rng).cloned(),
                None => None,
            };
            match sampled {
                Some(word) => word,
                None => sample_unigram(&self.unigrams, rng),
            }
        })
    }
}

impl InterpolatedTrigramLM {
    pub fn new(
        counts: &NGramCounts,
        lambdas: Lambdas,
        estimator: Estimator,
    ) -> Result<Self, ModelError> {
        check_training(counts)?;
        let unigrams = counts.unigram_distribution();

        let (bigrams, trigrams) = match estimator {
            Estimator::Empirical => {
                let mut bigrams = counts.bigrams.clone();
                let mut trigrams = counts.trigrams.clone();
                for (_, distribution) in bigrams.iter_mut() {
                    distribution.normalize();
                }
                for (_, distribution) in trigrams.iter_mut() {
                    distribution.normalize();
                }
                (bigrams, trigrams)
            }
            Estimator::Katz { cutoff } => {
                let bigram_level = KatzLevel::estimate(counts.bigrams.clone(), cutoff, |_| &unigrams)?;
                let trigram_level =
                    KatzLevel::estimate(counts.trigrams.clone(), cutoff, |context: &Bigram| {
                        bigram_level.view(&context.1, &unigrams)
                    })?;
                (bigram_level.into_probabilities(), trigram_level.into_probabilities())
            }
        };

        let name = match estimator {
            Estimator::Empirical => format!(
                "interpolated({:.2}, {:.2})",
                lambdas.trigram, lambdas.bigram
            ),
            Estimator::Katz { cutoff } => format!(
                "katz-interpolated({:.2}, {:.2}, K={})",
                lambdas.trigram, lambdas.bigram, cutoff
            ),
        };
        info!(
            "{}: {} bigram contexts, {} trigram contexts",
            name,
            bigrams.len(),
            trigrams.len()
        );

        Ok(Self {
            name,
            lambdas,
            estimator,
            unigrams,
            bigrams,
            trigrams,
        })
    }

    /// Interpolated bigram model: the trigram component switched off.
    pub fn bigram(counts: &NGramCounts, bigram_weight: f64) -> Result<Self, ModelError> {
        let mut lm = Self::new(counts, Lambdas::new(0., bigram_weight)?, Estimator::Empirical)?;
        lm.name = format!("bigram({:.2})", bigram_weight);
        Ok(lm)
    }

    pub fn lambdas(&self) -> Lambdas {
        self.lambdas
    }

    pub fn estimator(&self) -> Estimator {
        self.estimator
    }
}
