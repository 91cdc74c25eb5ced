use std::borrow::Borrow;
use std::hash::Hash;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::counter::WeightedMap;

/// Outer key -> `WeightedMap` over inner keys, e.g. previous word -> counts
/// of the next word.
///
/// Reads never allocate: `get` and `peek` leave the map untouched for unseen
/// outer keys. `ensure` is the one way a sub-map gets created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Serialize + Hash + Eq, V: Serialize + Hash + Eq",
    deserialize = "K: Deserialize<'de> + Hash + Eq, V: Deserialize<'de> + Hash + Eq"
))]
pub struct NestedWeightedMap<K: Hash + Eq, V: Hash + Eq> {
    maps: IndexMap<K, WeightedMap<V>>,
}

impl<K: Hash + Eq, V: Hash + Eq> Default for NestedWeightedMap<K, V> {
    fn default() -> Self {
        Self {
            maps: IndexMap::new(),
        }
    }
}

impl<K: Hash + Eq, V: Hash + Eq> NestedWeightedMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of outer keys.
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn contains_key<Q>(&self, outer: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.maps.contains_key(outer)
    }

    pub fn get<Q, R>(&self, outer: &Q, inner: &R) -> f64
    where
        K: Borrow<Q>,
        V: Borrow<R>,
        Q: Hash + Eq + ?Sized,
        R: Hash + Eq + ?Sized,
    {
        match self.maps.get(outer) {
            Some(map) => map.get(inner),
            None => 0.,
        }
    }

    pub fn peek<Q>(&self, outer: &Q) -> Option<&WeightedMap<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.maps.get(outer)
    }

    /// The sub-map for `outer`, installed empty if it did not exist yet.
    pub fn ensure(&mut self, outer: K) -> &mut WeightedMap<V> {
        self.maps.entry(outer).or_default()
    }

    pub fn set(&mut self, outer: K, inner: V, weight: f64) {
        self.ensure(outer).set(inner, weight);
    }

    pub fn increment(&mut self, outer: K, inner: V, delta: f64) {
        self.ensure(outer).increment(inner, delta);
    }

    /// Sum of all weights across sub-maps.
    pub fn total(&self) -> f64 {
        self.maps.values().map(WeightedMap::total).sum()
    }

    /// Number of (outer, inner) pairs, not their weights.
    pub fn total_entry_count(&self) -> usize {
        self.maps.values().map(WeightedMap::len).sum()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.maps.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &WeightedMap<V>)> {
        self.maps.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut WeightedMap<V>)> {
        self.maps.iter_mut()
    }

    /// Every stored weight, sub-map by sub-map.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.maps.values().flat_map(WeightedMap::values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animals() -> NestedWeightedMap<String, String> {
        let mut map = NestedWeightedMap::new();
        map.increment("people".to_string(), "run".to_string(), 1.);
        map.increment("cats".to_string(), "growl".to_string(), 2.);
        map.increment("cats".to_string(), "scamper".to_string(), 3.);
        map
    }

    #[test]
    fn test_get() {
        let map = animals();
        assert_eq!(map.get("cats", "scamper"), 3.);
        assert_eq!(map.get("cats", "run"), 0.);
        assert_eq!(map.get("snakes", "slither"), 0.);
        // Reading an unseen outer key does not install it.
        assert!(!map.contains_key("snakes"));
        assert!(map.peek("snakes").is_none());
    }

    #[test]
    fn test_ensure_installs() {
        let mut map = animals();
        assert!(map.ensure("dogs".to_string()).is_empty());
        assert!(map.contains_key("dogs"));
        map.ensure("dogs".to_string()).increment("bark".to_string(), 4.);
        assert_eq!(map.get("dogs", "bark"), 4.);
    }

    #[test]
    fn test_totals() {
        let mut map = animals();
        assert_eq!(map.total(), 6.);
        assert_eq!(map.total_entry_count(), 3);
        assert_eq!(map.len(), 2);
        map.set("people".to_string(), "run".to_string(), 5.);
        assert_eq!(map.total(), 10.);
        assert_eq!(map.total_entry_count(), 3);
        let mut values: Vec<f64> = map.values().collect();
        values.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(values, vec![2., 3., 5.]);
    }
}
