use std::borrow::Borrow;
use std::hash::Hash;

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::counter::{MassFunction, NestedWeightedMap, WeightedMap};
use crate::errors::SmoothingError;
use crate::smoothing::{fit_smoother, normalize_katz_nested, KatzOutcome, LogLinearSmoother};

/// Katz-normalized conditional distributions of one n-gram order, keyed by
/// context, together with what each normalization reserved for back-off.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "C: Serialize + Hash + Eq",
    deserialize = "C: Deserialize<'de> + Hash + Eq"
))]
pub struct KatzLevel<C: Hash + Eq> {
    probabilities: NestedWeightedMap<C, String>,
    outcomes: IndexMap<C, KatzOutcome>,
    smoother: LogLinearSmoother,
}

impl<C: Hash + Eq + Clone> KatzLevel<C> {
    /// Fit a smoother to `counts` and Katz-normalize every context against
    /// the lower-order distribution `lower_for` returns for it.
    pub fn estimate<D, F>(
        counts: NestedWeightedMap<C, String>,
        cutoff: usize,
        lower_for: F,
    ) -> Result<Self, SmoothingError>
    where
        D: MassFunction<String>,
        F: FnMut(&C) -> D,
    {
        let smoother = fit_smoother(counts.values(), cutoff)?;
        debug!(
            "fitted ln n_c = {:.4} c + {:.4} over counts {:?}",
            smoother.slope(),
            smoother.intercept(),
            smoother.support()
        );

        let mut probabilities = counts;
        let outcomes = normalize_katz_nested(&mut probabilities, cutoff, &smoother, lower_for)?;
        Ok(Self {
            probabilities,
            outcomes,
            smoother,
        })
    }
}

impl<C: Hash + Eq> KatzLevel<C> {
    /// Stored probability of `word` after `context`, if it is positive.
    ///
    /// Events whose discounted count came out as 0 are reported as `None` so
    /// that callers back off for them.
    pub fn probability<Q>(&self, context: &Q, word: &str) -> Option<f64>
    where
        C: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let probability = self.probabilities.get(context, word);
        if probability > 0. {
            Some(probability)
        } else {
            None
        }
    }

    /// Multiplier applied to the lower order for events unseen after
    /// `context`. A context that was never seen passes the lower order
    /// through unchanged.
    pub fn backoff_weight<Q>(&self, context: &Q) -> f64
    where
        C: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.outcomes
            .get(context)
            .map_or(1., |outcome| outcome.backoff_weight())
    }

    pub fn distribution<Q>(&self, context: &Q) -> Option<&WeightedMap<String>>
    where
        C: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.probabilities.peek(context)
    }

    pub fn outcome<Q>(&self, context: &Q) -> Option<&KatzOutcome>
    where
        C: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.outcomes.get(context)
    }

    pub fn smoother(&self) -> &LogLinearSmoother {
        &self.smoother
    }

    pub fn probabilities(&self) -> &NestedWeightedMap<C, String> {
        &self.probabilities
    }

    pub fn into_probabilities(self) -> NestedWeightedMap<C, String> {
        self.probabilities
    }

    /// The full back-off distribution after `context` over the vocabulary of
    /// `lower`.
    pub fn view<'a, Q>(&'a self, context: &Q, lower: &'a WeightedMap<String>) -> BackoffView<'a>
    where
        C: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        BackoffView::new(self.distribution(context), self.backoff_weight(context), lower)
    }
}

/// One back-off step seen as a distribution: the stored probability where it
/// is positive, otherwise `weight * lower(word)`.
#[derive(Debug, Clone, Copy)]
pub struct BackoffView<'a> {
    seen: Option<&'a WeightedMap<String>>,
    weight: f64,
    lower: &'a WeightedMap<String>,
    mass: f64,
}

impl<'a> BackoffView<'a> {
    pub fn new(
        seen: Option<&'a WeightedMap<String>>,
        weight: f64,
        lower: &'a WeightedMap<String>,
    ) -> Self {
        let mut mass = weight * lower.total();
        if let Some(seen) = seen {
            for (word, probability) in seen.iter() {
                if probability > 0. {
                    mass += probability - weight * lower.get(word);
                }
            }
        }
        Self {
            seen,
            weight,
            lower,
            mass: mass.max(0.),
        }
    }
}

impl MassFunction<String> for BackoffView<'_> {
    fn probability(&self, word: &String) -> f64 {
        let seen = self.seen.map(|seen| seen.get(word)).unwrap_or(0.);
        if seen > 0. {
            seen
        } else {
            self.weight * self.lower.get(word)
        }
    }

    fn total_mass(&self) -> f64 {
        self.mass
    }
}
