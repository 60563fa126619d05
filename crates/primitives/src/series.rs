//! Ordered, key-indexed numeric series.
//!
//! Exposures, returns and prices are all indexed by stock id or date. Alignment
//! between two series is always an inner join on the key.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A series of values indexed by an ordered key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Ord + Serialize, V: Serialize",
    deserialize = "K: Ord + Deserialize<'de>, V: Deserialize<'de>"
))]
pub struct LabeledSeries<K, V = f64> {
    data: BTreeMap<K, V>,
}

impl<K: Ord, V> Default for LabeledSeries<K, V> {
    fn default() -> Self {
        Self { data: BTreeMap::new() }
    }
}

impl<K: Ord + Clone, V: Clone> LabeledSeries<K, V> {
    /// Create an empty series.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the value at `key`.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.data.insert(key, value)
    }

    /// Value at `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.data.get(key)
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.data.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the series is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.data.keys()
    }

    /// Values in key order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.data.values()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.data.iter()
    }

    /// Entry with the greatest key.
    #[must_use]
    pub fn last(&self) -> Option<(&K, &V)> {
        self.data.last_key_value()
    }

    /// Inner join on key: entries present in both series, in key order.
    #[must_use]
    pub fn inner_join<W: Clone>(&self, other: &LabeledSeries<K, W>) -> Vec<(K, V, W)> {
        self.data
            .iter()
            .filter_map(|(k, v)| other.data.get(k).map(|w| (k.clone(), v.clone(), w.clone())))
            .collect()
    }

    /// Values looked up for each of `keys`, `None` where absent.
    #[must_use]
    pub fn reindex(&self, keys: &[K]) -> Vec<Option<V>> {
        keys.iter().map(|k| self.data.get(k).cloned()).collect()
    }

    /// Apply `f` to each value.
    #[must_use]
    pub fn map<W: Clone>(&self, mut f: impl FnMut(&V) -> W) -> LabeledSeries<K, W> {
        self.data.iter().map(|(k, v)| (k.clone(), f(v))).collect()
    }

    /// Keys present in every series, ascending. Empty when `series` is empty.
    #[must_use]
    pub fn intersect_keys(series: &[&Self]) -> Vec<K> {
        let Some((first, rest)) = series.split_first() else {
            return Vec::new();
        };
        let mut common: BTreeSet<K> = first.data.keys().cloned().collect();
        for s in rest {
            common.retain(|k| s.data.contains_key(k));
        }
        common.into_iter().collect()
    }
}

impl<K: Ord + Clone> LabeledSeries<K, f64> {
    /// Drop NaN and infinite values.
    #[must_use]
    pub fn finite(&self) -> Self {
        self.data.iter().filter(|(_, v)| v.is_finite()).map(|(k, v)| (k.clone(), *v)).collect()
    }

    /// Simple returns between consecutive entries, keyed by the later key.
    #[must_use]
    pub fn pct_change(&self) -> Self {
        self.data
            .iter()
            .zip(self.data.iter().skip(1))
            .map(|((_, prev), (k, cur))| (k.clone(), cur / prev - 1.0))
            .filter(|(_, r)| r.is_finite())
            .collect()
    }

    /// Values in key order as a vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.data.values().copied().collect()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for LabeledSeries<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { data: iter.into_iter().collect() }
    }
}

impl<K: Ord, V> From<BTreeMap<K, V>> for LabeledSeries<K, V> {
    fn from(data: BTreeMap<K, V>) -> Self {
        Self { data }
    }
}

impl<K, V> IntoIterator for LabeledSeries<K, V> {
    type Item = (K, V);
    type IntoIter = std::collections::btree_map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn inner_join_keeps_common_keys_in_order() {
        let a: LabeledSeries<u32> = [(3, 0.3), (1, 0.1), (2, 0.2)].into_iter().collect();
        let b: LabeledSeries<u32> = [(2, 2.0), (4, 4.0), (1, 1.0)].into_iter().collect();

        let joined = a.inner_join(&b);
        assert_eq!(joined, vec![(1, 0.1, 1.0), (2, 0.2, 2.0)]);
    }

    #[test]
    fn reindex_fills_missing_with_none() {
        let s: LabeledSeries<u32> = [(1, 1.0), (3, 3.0)].into_iter().collect();
        assert_eq!(s.reindex(&[3, 2, 1]), vec![Some(3.0), None, Some(1.0)]);
    }

    #[test]
    fn intersect_keys_across_series() {
        let a: LabeledSeries<u32> = [(1, 0.0), (2, 0.0), (3, 0.0)].into_iter().collect();
        let b: LabeledSeries<u32> = [(2, 0.0), (3, 0.0), (4, 0.0)].into_iter().collect();
        let c: LabeledSeries<u32> = [(3, 0.0), (2, 0.0)].into_iter().collect();

        assert_eq!(LabeledSeries::intersect_keys(&[&a, &b, &c]), vec![2, 3]);
        assert!(LabeledSeries::<u32, f64>::intersect_keys(&[]).is_empty());
    }

    #[test]
    fn pct_change_keyed_by_later_date() {
        let prices: LabeledSeries<u32> = [(1, 100.0), (2, 110.0), (3, 99.0)].into_iter().collect();
        let returns = prices.pct_change();

        assert_eq!(returns.len(), 2);
        assert_relative_eq!(*returns.get(&2).unwrap(), 0.10, epsilon = 1e-12);
        assert_relative_eq!(*returns.get(&3).unwrap(), -0.10, epsilon = 1e-12);
    }

    #[test]
    fn finite_drops_nan() {
        let s: LabeledSeries<u32> = [(1, f64::NAN), (2, 1.0), (3, f64::INFINITY)].into_iter().collect();
        assert_eq!(s.finite().to_vec(), vec![1.0]);
    }
}
