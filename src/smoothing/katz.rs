// Katz discounting of one conditional distribution at a time.

use std::hash::Hash;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::counter::{MassFunction, NestedWeightedMap, WeightedMap};
use crate::errors::{check_value, SmoothingError};
use crate::smoothing::LogLinearSmoother;

/// Share of the probability a distribution hands to unseen events when
/// discounting removed nothing from it, e.g. when every count is above the
/// cutoff.
pub const MIN_RESERVED_MASS: f64 = 0.01;

/// Book-keeping of a single Katz normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KatzOutcome {
    /// Raw total of the distribution before discounting.
    pub subtotal: f64,
    /// Count mass removed from events with `0 < c <= cutoff`.
    pub discounted_mass: f64,
    /// Lower-order mass of every back-off candidate.
    pub zero_mass: f64,
    /// `discounted_mass / subtotal / zero_mass`, or 0 when there are no
    /// candidates. `MIN_RESERVED_MASS * subtotal / zero_mass` when the
    /// distribution fell back to the reserved floor.
    pub alpha: f64,
}

impl KatzOutcome {
    /// Multiplier turning the lower-order probability of an unseen event
    /// into its final probability in this distribution.
    pub fn backoff_weight(&self) -> f64 {
        if self.subtotal > 0. {
            self.alpha / self.subtotal
        } else {
            0.
        }
    }

    /// Probability mass handed to back-off candidates.
    pub fn reserved_mass(&self) -> f64 {
        self.backoff_weight() * self.zero_mass
    }
}

enum Slot {
    Kept(f64),
    Candidate,
}

/// Katz-normalize one distribution of raw counts in place.
///
/// Counts above `cutoff` are kept. Counts in `1..=cutoff` become
/// `(c + 1) * s[c] / s[c - 1]` when that is smaller than `c`, and the
/// difference joins the discounted mass. Events with count 0, and events
/// discounted all the way to 0, are back-off candidates and receive
/// `alpha * lower(event)`. Lower-order events absent from `counts` are
/// candidates as well: their share is not stored but is reported by
/// [`KatzOutcome::reserved_mass`]. Finally every value is divided by the raw
/// subtotal.
///
/// If nothing was discounted while candidates exist, the kept counts give
/// up [`MIN_RESERVED_MASS`] of the final probability to the candidates, so
/// the distribution still sums to at most 1 and unseen events stay
/// positive.
///
/// Entries are never read after being written, so the result does not
/// depend on iteration order.
pub fn normalize_katz<K, D>(
    counts: &mut WeightedMap<K>,
    cutoff: usize,
    smoother: &LogLinearSmoother,
    lower: &D,
) -> Result<KatzOutcome, SmoothingError>
where
    K: Hash + Eq + Clone,
    D: MassFunction<K> + ?Sized,
{
    let subtotal = check_value("count subtotal", counts.total())?;
    if subtotal == 0. {
        return Ok(KatzOutcome::default());
    }

    let mut slots = Vec::with_capacity(counts.len());
    let mut discounted_mass = 0.;
    let mut kept_lower_mass = 0.;
    for (key, count) in counts.iter() {
        let count = check_value("raw count", count)?;
        let kept = if count == 0. || count > cutoff as f64 {
            count
        } else {
            match smoother.discounted_count(count as usize) {
                Some(discounted) if discounted < count => {
                    discounted_mass += count - discounted;
                    discounted
                }
                _ => count,
            }
        };
        let slot = if kept > 0. {
            kept_lower_mass += lower.probability(key);
            Slot::Kept(kept)
        } else {
            Slot::Candidate
        };
        slots.push((key.clone(), slot));
    }

    let zero_mass = (lower.total_mass() - kept_lower_mass).max(0.);
    let mut kept_share = 1.;
    let alpha = if zero_mass > 0. && discounted_mass > 0. {
        check_value("back-off weight", discounted_mass / subtotal / zero_mass)?
    } else if zero_mass > 0. {
        kept_share -= MIN_RESERVED_MASS;
        discounted_mass = MIN_RESERVED_MASS * subtotal;
        check_value("back-off weight", MIN_RESERVED_MASS * subtotal / zero_mass)?
    } else {
        0.
    };

    for (key, slot) in slots {
        let value = match slot {
            Slot::Kept(count) => kept_share * count,
            Slot::Candidate => alpha * lower.probability(&key),
        };
        let probability = check_value("katz probability", value / subtotal)?;
        counts.set(key, probability);
    }

    Ok(KatzOutcome {
        subtotal,
        discounted_mass,
        zero_mass,
        alpha,
    })
}

/// Apply [`normalize_katz`] to every sub-map independently. `lower_for`
/// supplies the lower-order distribution of each context.
pub fn normalize_katz_nested<C, K, D, F>(
    counts: &mut NestedWeightedMap<C, K>,
    cutoff: usize,
    smoother: &LogLinearSmoother,
    mut lower_for: F,
) -> Result<IndexMap<C, KatzOutcome>, SmoothingError>
where
    C: Hash + Eq + Clone,
    K: Hash + Eq + Clone,
    D: MassFunction<K>,
    F: FnMut(&C) -> D,
{
    let mut outcomes = IndexMap::with_capacity(counts.len());
    for (context, distribution) in counts.iter_mut() {
        let lower = lower_for(context);
        let outcome = normalize_katz(distribution, cutoff, smoother, &lower)?;
        outcomes.insert(context.clone(), outcome);
    }
    Ok(outcomes)
}
