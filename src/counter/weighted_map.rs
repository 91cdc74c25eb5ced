use std::borrow::Borrow;
use std::hash::Hash;
use std::iter::FromIterator;

use indexmap::IndexMap;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::counter::MassFunction;

/// A map from keys to accumulated weights.
///
/// Absent keys weigh 0. A key stored with weight 0 is still present, so
/// `contains_key` tells the two apart. Iteration follows insertion order,
/// which also decides `arg_max` ties (first seen wins) and keeps seeded
/// sampling reproducible.
///
/// The aggregate sum is kept up to date by `set`, the only point through
/// which single entries change. Bulk operations recompute it exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Serialize + Hash + Eq",
    deserialize = "K: Deserialize<'de> + Hash + Eq"
))]
pub struct WeightedMap<K: Hash + Eq> {
    entries: IndexMap<K, f64>,
    total: f64,
}

impl<K: Hash + Eq> Default for WeightedMap<K> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
            total: 0.,
        }
    }
}

impl<K: Hash + Eq> WeightedMap<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys, not their total weight.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    pub fn get<Q>(&self, key: &Q) -> f64
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).copied().unwrap_or(0.)
    }

    pub fn set(&mut self, key: K, weight: f64) {
        let old = self.entries.insert(key, weight).unwrap_or(0.);
        self.total += weight - old;
    }

    pub fn increment(&mut self, key: K, delta: f64) {
        let weight = self.get(&key) + delta;
        self.set(key, weight);
    }

    /// Remove a key, returning the weight it had (0 if it was absent).
    pub fn remove<Q>(&mut self, key: &Q) -> f64
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let old = self.entries.shift_remove(key).unwrap_or(0.);
        self.total -= old;
        old
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    /// Divide every weight by the total, in place.
    ///
    /// A map whose total is 0 (in particular an empty map) is left untouched.
    pub fn normalize(&mut self) {
        let total = self.total;
        if total == 0. {
            return;
        }
        self.scale(1. / total);
    }

    pub fn scale(&mut self, factor: f64) {
        for weight in self.entries.values_mut() {
            *weight *= factor;
        }
        self.recompute_total();
    }

    /// The key with the largest weight. Ties go to the key inserted first.
    pub fn arg_max(&self) -> Option<&K> {
        let mut best: Option<(&K, f64)> = None;
        for (key, &weight) in self.entries.iter() {
            match best {
                Some((_, best_weight)) if weight <= best_weight => {}
                _ => best = Some((key, weight)),
            }
        }
        best.map(|(key, _)| key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.values().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> {
        self.entries.iter().map(|(key, weight)| (key, *weight))
    }

    /// Walk the entries accumulating weight until the running sum exceeds a
    /// uniform draw from [0, 1). Weights are read as probabilities, so `None`
    /// means the draw landed in mass this map does not hold.
    pub fn sample(&self, rng: &mut dyn RngCore) -> Option<&K> {
        let draw: f64 = rng.random();
        let mut sum = 0.;
        for (key, weight) in self.entries.iter() {
            sum += weight;
            if sum > draw {
                return Some(key);
            }
        }
        None
    }

    fn recompute_total(&mut self) {
        self.total = self.entries.values().sum();
    }
}

impl<K: Hash + Eq> FromIterator<(K, f64)> for WeightedMap<K> {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, weight) in iter {
            map.increment(key, weight);
        }
        map
    }
}

impl<K, Q> MassFunction<Q> for WeightedMap<K>
where
    K: Hash + Eq + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
{
    fn probability(&self, key: &Q) -> f64 {
        self.get(key)
    }

    fn total_mass(&self) -> f64 {
        self.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn planets() -> WeightedMap<String> {
        let mut map = WeightedMap::new();
        map.increment("planets".to_string(), 7.);
        map.increment("planets".to_string(), 1.);
        map.set("suns".to_string(), 1.);
        map.set("aliens".to_string(), 0.);
        map
    }

    #[test]
    fn test_get_and_total() {
        let map = planets();
        assert_eq!(map.get("planets"), 8.);
        assert_eq!(map.get("suns"), 1.);
        assert_eq!(map.get("comets"), 0.);
        assert_eq!(map.total(), 9.);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_zero_weight_is_not_absence() {
        let mut map = planets();
        assert!(map.contains_key("aliens"));
        assert!(!map.contains_key("comets"));
        assert_eq!(map.remove("aliens"), 0.);
        assert!(!map.contains_key("aliens"));
        assert_eq!(map.remove("planets"), 8.);
        assert_eq!(map.total(), 1.);
    }

    #[test]
    fn test_total_follows_set() {
        let mut map = planets();
        map.set("planets".to_string(), 2.);
        assert_eq!(map.total(), 3.);
        map.increment("comets".to_string(), 0.5);
        assert_eq!(map.total(), 3.5);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut map = planets();
        map.normalize();
        assert!((map.get("planets") - 8. / 9.).abs() < 1e-12);
        assert!((map.total() - 1.).abs() < 1e-12);

        let once: Vec<f64> = map.values().collect();
        map.normalize();
        let twice: Vec<f64> = map.values().collect();
        for (a, b) in once.iter().zip(twice.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_normalize_empty_is_noop() {
        let mut map: WeightedMap<String> = WeightedMap::new();
        map.normalize();
        assert!(map.is_empty());
        assert_eq!(map.total(), 0.);

        let mut zeros = WeightedMap::new();
        zeros.set("a", 0.);
        zeros.normalize();
        assert_eq!(zeros.get("a"), 0.);
        assert!(!zeros.get("a").is_nan());
    }

    #[test]
    fn test_scale() {
        let mut map = planets();
        map.scale(0.5);
        assert_eq!(map.get("planets"), 4.);
        assert_eq!(map.total(), 4.5);
    }

    #[test]
    fn test_arg_max_first_seen_wins() {
        let map: WeightedMap<&str> = vec![("a", 1.), ("b", 3.), ("c", 3.)].into_iter().collect();
        assert_eq!(map.arg_max(), Some(&"b"));
        let empty: WeightedMap<&str> = WeightedMap::new();
        assert_eq!(empty.arg_max(), None);
    }

    #[test]
    fn test_sample() {
        let map: WeightedMap<&str> = vec![("a", 0.25), ("b", 0.75)].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(7);
        let mut n_a = 0;
        for _ in 0..2000 {
            match map.sample(&mut rng) {
                Some(&"a") => n_a += 1,
                Some(_) => {}
                None => panic!("a full distribution always yields a key"),
            }
        }
        assert!(n_a > 350 && n_a < 650);

        let partial: WeightedMap<&str> = vec![("a", 0.)].into_iter().collect();
        assert_eq!(partial.sample(&mut rng), None);
    }
}
