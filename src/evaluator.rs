use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::EvaluationError;
use crate::lms::LM;
use crate::nbest::{references, Hypothesis, SpeechNBestList};
use crate::stat_utils::{edit_distance, ln_to_log2, mean, perplexity_from_log2};

/// Acoustic scores are divided by this before being added to the language
/// model log probability.
pub const ACOUSTIC_WEIGHT_DIVISOR: f64 = 16.0;

/// `0.5 ^ (sum log2 P(s) / sum |s|)`; sentinel tokens do not count towards
/// `|s|`. A sentence of probability 0 makes the result infinite.
pub fn perplexity(lm: &dyn LM, sentences: &[Vec<String>]) -> Result<f64, EvaluationError> {
    let n_symbols: usize = sentences.iter().map(Vec::len).sum();
    if n_symbols == 0 {
        return Err(EvaluationError::EmptyCollection);
    }
    let log2_sum: f64 = sentences
        .iter()
        .map(|sentence| ln_to_log2(lm.get_sentence_log_probability(sentence)))
        .sum();
    Ok(perplexity_from_log2(log2_sum, n_symbols as f64))
}

/// Combined language model and acoustic score of one hypothesis.
pub fn hypothesis_score(lm: &dyn LM, hypothesis: &Hypothesis) -> f64 {
    lm.get_sentence_log_probability(&hypothesis.words) + hypothesis.acoustic_score / ACOUSTIC_WEIGHT_DIVISOR
}

/// Edit distance of the best scoring hypotheses over the total number of
/// reference words. When several hypotheses share the best score their
/// distances are averaged.
pub fn word_error_rate(lm: &dyn LM, lists: &[SpeechNBestList]) -> Result<f64, EvaluationError> {
    word_error_rate_by(lists, |list| {
        let mut best_score = f64::NEG_INFINITY;
        let mut best: Option<&Hypothesis> = None;
        let mut distance_sum = 0.;
        let mut n_best = 0.;
        for hypothesis in list.hypotheses.iter() {
            let score = hypothesis_score(lm, hypothesis);
            let distance = edit_distance(&list.reference, &hypothesis.words) as f64;
            if best.is_none() || score > best_score {
                best_score = score;
                best = Some(hypothesis);
                distance_sum = distance;
                n_best = 1.;
            } else if score == best_score {
                distance_sum += distance;
                n_best += 1.;
            }
        }
        if let Some(best) = best {
            debug!(
                "GUESS: AM {:.2e} LM {:.2e} total {:.2e} {:?}",
                best.acoustic_score / ACOUSTIC_WEIGHT_DIVISOR,
                lm.get_sentence_log_probability(&best.words),
                best_score,
                best.words
            );
            debug!("GOLD:  {:?}", list.reference);
        }
        distance_sum / n_best
    })
}

/// WER if the closest hypothesis were always picked.
pub fn word_error_rate_lower_bound(lists: &[SpeechNBestList]) -> Result<f64, EvaluationError> {
    word_error_rate_by(lists, |list| {
        distances(list).into_iter().fold(f64::INFINITY, f64::min)
    })
}

/// WER if the farthest hypothesis were always picked.
pub fn word_error_rate_upper_bound(lists: &[SpeechNBestList]) -> Result<f64, EvaluationError> {
    word_error_rate_by(lists, |list| {
        distances(list).into_iter().fold(f64::NEG_INFINITY, f64::max)
    })
}

/// Expected WER of picking a hypothesis uniformly at random.
pub fn word_error_rate_random_choice(lists: &[SpeechNBestList]) -> Result<f64, EvaluationError> {
    word_error_rate_by(lists, |list| mean(&distances(list)).unwrap_or(0.))
}

fn distances(list: &SpeechNBestList) -> Vec<f64> {
    list.hypotheses
        .iter()
        .map(|hypothesis| edit_distance(&list.reference, &hypothesis.words) as f64)
        .collect()
}

// `distance_of` is only called on lists with at least one hypothesis.
fn word_error_rate_by<F>(lists: &[SpeechNBestList], mut distance_of: F) -> Result<f64, EvaluationError>
where
    F: FnMut(&SpeechNBestList) -> f64,
{
    let mut total_distance = 0.;
    let mut total_words = 0;
    for list in lists.iter() {
        if list.hypotheses.is_empty() {
            return Err(EvaluationError::EmptyNBestList(list.reference.join(" ")));
        }
        total_distance += distance_of(list);
        total_words += list.reference.len();
    }
    if total_words == 0 {
        return Err(EvaluationError::EmptyCollection);
    }
    Ok(total_distance / total_words as f64)
}

/// Word error rates that do not depend on a language model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WerBaselines {
    pub best_path: f64,
    pub worst_path: f64,
    pub average_path: f64,
}

impl WerBaselines {
    pub fn new(lists: &[SpeechNBestList]) -> Result<Self, EvaluationError> {
        Ok(Self {
            best_path: word_error_rate_lower_bound(lists)?,
            worst_path: word_error_rate_upper_bound(lists)?,
            average_path: word_error_rate_random_choice(lists)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub name: String,
    pub training_perplexity: Option<f64>,
    pub validation_perplexity: Option<f64>,
    pub nbest_perplexity: Option<f64>,
    pub word_error_rate: Option<f64>,
    pub baselines: Option<WerBaselines>,
}

impl EvaluationReport {
    pub fn to_json(&self, file_path: impl AsRef<Path>) -> Result<()> {
        let file_path = file_path.as_ref();
        let json_data = serde_json::to_string_pretty(self)?;
        let mut file = fs::File::create(file_path)
            .with_context(|| format!("cannot create {}", file_path.display()))?;
        file.write_all(json_data.as_bytes())?;
        Ok(())
    }
}

/// Scores models against fixed held-out data.
pub struct Evaluator<'a> {
    training: Option<&'a [Vec<String>]>,
    validation: Option<&'a [Vec<String>]>,
    lists: Option<&'a [SpeechNBestList]>,
    nbest_references: Vec<Vec<String>>,
}

impl<'a> Evaluator<'a> {
    pub fn new(validation: Option<&'a [Vec<String>]>, lists: Option<&'a [SpeechNBestList]>) -> Self {
        let nbest_references = lists.map(references).unwrap_or_default();
        Evaluator {
            training: None,
            validation,
            lists,
            nbest_references,
        }
    }

    /// Also report perplexity on the training sentences.
    pub fn with_training(mut self, training: &'a [Vec<String>]) -> Self {
        self.training = Some(training);
        self
    }

    pub fn validation_perplexity(&self, lm: &dyn LM) -> Result<Option<f64>, EvaluationError> {
        self.validation.map(|sentences| perplexity(lm, sentences)).transpose()
    }

    pub fn word_error_rate(&self, lm: &dyn LM) -> Result<Option<f64>, EvaluationError> {
        self.lists.map(|lists| word_error_rate(lm, lists)).transpose()
    }

    pub fn evaluate(&self, lm: &dyn LM) -> Result<EvaluationReport, EvaluationError> {
        let nbest_perplexity = match self.lists {
            Some(_) => Some(perplexity(lm, &self.nbest_references)?),
            None => None,
        };
        Ok(EvaluationReport {
            name: lm.get_name().to_string(),
            training_perplexity: self.training.map(|sentences| perplexity(lm, sentences)).transpose()?,
            validation_perplexity: self.validation_perplexity(lm)?,
            nbest_perplexity,
            word_error_rate: self.word_error_rate(lm)?,
            baselines: self.lists.map(WerBaselines::new).transpose()?,
        })
    }
}
