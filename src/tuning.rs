// Cross-validation of interpolation weights and discount cutoffs.

use std::fs::OpenOptions;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use kdam::{tqdm, BarExt};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::evaluator::Evaluator;
use crate::lms::{Lambdas, LM};

/// Scores of one grid point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub lambda1: f64,
    pub lambda2: f64,
    pub cutoff: usize,
    pub perplexity: f64,
    pub word_error_rate: Option<f64>,
}

impl Trial {
    pub fn append_to_jsonl<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let blob = serde_json::to_string(self)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("cannot open {}", path.display()))?;
        Ok(writeln!(file, "{}", blob)?)
    }
}

/// Every `(l1, l2)` on a grid of spacing `step` with `l1 >= step`, `l2 >= 0`
/// and `l1 + l2 < 1`. A step outside `(0, 1)` yields no points.
pub fn lambda_grid(step: f64) -> Vec<Lambdas> {
    if !(step > 0. && step < 1.) {
        return Vec::new();
    }
    // Sums within rounding error of 1 lie on the boundary, not inside it.
    let limit = 1. - step * 1e-6;
    let mut grid = Vec::new();
    let mut i = 1;
    while i as f64 * step < limit {
        let mut j = 0;
        while (i + j) as f64 * step < limit {
            if let Ok(lambdas) = Lambdas::new(i as f64 * step, j as f64 * step) {
                grid.push(lambdas);
            }
            j += 1;
        }
        i += 1;
    }
    grid
}

#[derive(Debug, Clone, Default)]
pub struct GridResult {
    pub trials: Vec<Trial>,
    /// Lowest validation perplexity; the earliest trial wins ties.
    pub best: Option<Trial>,
}

pub struct GridSearch<'a> {
    evaluator: &'a Evaluator<'a>,
    trials_path: Option<PathBuf>,
}

impl<'a> GridSearch<'a> {
    pub fn new(evaluator: &'a Evaluator<'a>) -> Self {
        Self {
            evaluator,
            trials_path: None,
        }
    }

    /// Append every trial to a JSONL file as it completes.
    pub fn with_trials_path(mut self, path: impl AsRef<Path>) -> Self {
        self.trials_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Build a model per grid point with `build` and score it on the
    /// evaluator's validation sentences (and n-best lists, if any). Points
    /// whose model cannot be built are logged and skipped.
    pub fn run<F>(&self, lambdas: &[Lambdas], cutoffs: &[usize], mut build: F) -> Result<GridResult>
    where
        F: FnMut(Lambdas, usize) -> Result<Box<dyn LM>, ModelError>,
    {
        let mut result = GridResult::default();
        let mut pbar = tqdm!(total = lambdas.len() * cutoffs.len());
        for &point in lambdas.iter() {
            for &cutoff in cutoffs.iter() {
                let _ = pbar.update(1);
                let lm = match build(point, cutoff) {
                    Ok(lm) => lm,
                    Err(err) => {
                        warn!(
                            "skipping l1={:.2} l2={:.2} K={}: {}",
                            point.trigram(),
                            point.bigram(),
                            cutoff,
                            err
                        );
                        continue;
                    }
                };

                let perplexity = self
                    .evaluator
                    .validation_perplexity(lm.as_ref())?
                    .ok_or_else(|| anyhow!("grid search needs validation sentences"))?;
                let trial = Trial {
                    lambda1: point.trigram(),
                    lambda2: point.bigram(),
                    cutoff,
                    perplexity,
                    word_error_rate: self.evaluator.word_error_rate(lm.as_ref())?,
                };
                pbar.set_description(format!("ppl: {:.2}", perplexity));
                if let Some(path) = &self.trials_path {
                    trial.append_to_jsonl(path)?;
                }

                let improved = match result.best {
                    Some(best) => trial.perplexity < best.perplexity,
                    None => true,
                };
                if improved {
                    result.best = Some(trial);
                }
                result.trials.push(trial);
            }
        }

        if let Some(best) = result.best {
            info!(
                "best: l1={:.2} l2={:.2} K={} perplexity={:.3}",
                best.lambda1, best.lambda2, best.cutoff, best.perplexity
            );
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SmoothingError;
    use crate::lms::{Estimator, InterpolatedTrigramLM};
    use crate::ngram_counts::NGramCounts;
    use tempfile::tempdir;

    fn words(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_lambda_grid() {
        let grid = lambda_grid(0.1);
        assert_eq!(grid.len(), 45);
        assert!(grid.iter().all(|l| l.trigram() >= 0.1 - 1e-12 && l.trigram() + l.bigram() < 1.));
        assert_eq!(lambda_grid(0.5), vec![Lambdas::new(0.5, 0.).unwrap()]);
        assert!(lambda_grid(0.).is_empty());

        // 0.3 does not divide 1: (0.3, 0.6), (0.6, 0.3) and (0.9, 0) are inside.
        let grid = lambda_grid(0.3);
        assert_eq!(grid.len(), 6);
        for (l1, l2) in [(0.3, 0.), (0.3, 0.3), (0.3, 0.6), (0.6, 0.), (0.6, 0.3), (0.9, 0.)] {
            assert!(grid
                .iter()
                .any(|l| (l.trigram() - l1).abs() < 1e-9 && (l.bigram() - l2).abs() < 1e-9));
        }
        assert!(lambda_grid(1.).is_empty());
    }

    #[test]
    fn test_grid_search() {
        let training = vec![words("the cat sat"), words("the dog sat"), words("a cat ran")];
        let validation = vec![words("the cat sat"), words("a dog sat")];
        let counts = NGramCounts::from_sentences(&training);
        let evaluator = Evaluator::new(Some(validation.as_slice()), None);

        let dir = tempdir().unwrap();
        let trials_path = dir.path().join("trials.jsonl");
        let search = GridSearch::new(&evaluator).with_trials_path(&trials_path);
        let grid = lambda_grid(0.25);
        let result = search
            .run(&grid, &[0, 1], |lambdas, cutoff| {
                if cutoff == 1 {
                    return Err(SmoothingError::InsufficientSupport(1).into());
                }
                let lm = InterpolatedTrigramLM::new(&counts, lambdas, Estimator::Empirical)?;
                Ok(Box::new(lm) as Box<dyn LM>)
            })
            .unwrap();

        assert_eq!(result.trials.len(), grid.len());
        let best = result.best.unwrap();
        assert!(result.trials.iter().all(|trial| best.perplexity <= trial.perplexity));
        assert!(result.trials.iter().all(|trial| trial.word_error_rate.is_none()));

        let lines = std::fs::read_to_string(&trials_path).unwrap();
        assert_eq!(lines.lines().count(), grid.len());
        let first: Trial = serde_json::from_str(lines.lines().next().unwrap()).unwrap();
        assert_eq!(first, result.trials[0]);
    }
}
