pub mod nested_map;
pub mod weighted_map;

pub use self::nested_map::NestedWeightedMap;
pub use self::weighted_map::WeightedMap;

/// Read access to a (possibly partial) probability distribution.
///
/// Used as the lower-order distribution when redistributing discounted mass.
pub trait MassFunction<K: ?Sized> {
    fn probability(&self, key: &K) -> f64;

    fn total_mass(&self) -> f64;
}

impl<K, T> MassFunction<K> for &T
where
    K: ?Sized,
    T: MassFunction<K> + ?Sized,
{
    fn probability(&self, key: &K) -> f64 {
        (**self).probability(key)
    }

    fn total_mass(&self) -> f64 {
        (**self).total_mass()
    }
}
