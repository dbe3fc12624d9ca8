//! Frequency counting with deterministic ordering
//!
//! Keys are remembered in first-occurrence order. `most_common` sorts by
//! descending count with a stable sort, so equal counts keep the order in which
//! their keys were first seen.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct FrequencyCounter<K> {
    index: HashMap<K, usize>,
    entries: Vec<(K, usize)>,
}

impl<K: Eq + Hash + Clone> FrequencyCounter<K> {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Count one occurrence of `key`
    pub fn add(&mut self, key: K) {
        match self.index.get(&key) {
            Some(&position) => self.entries[position].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    pub fn count(&self, key: &K) -> usize {
        self.index
            .get(key)
            .map(|&position| self.entries[position].1)
            .unwrap_or(0)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-occurrence order
    pub fn iter(&self) -> impl Iterator<Item = (&K, usize)> {
        self.entries.iter().map(|(key, count)| (key, *count))
    }

    /// Up to `n` entries by descending count, ties in first-occurrence order
    pub fn most_common(&self, n: usize) -> Vec<(K, usize)> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }
}

impl<K: Eq + Hash + Clone + Ord> FrequencyCounter<K> {
    pub fn to_btree_map(&self) -> BTreeMap<K, usize> {
        self.entries.iter().cloned().collect()
    }
}

impl<K: Eq + Hash + Clone> Default for FrequencyCounter<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone> FromIterator<K> for FrequencyCounter<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut counter = Self::new();
        counter.extend(iter);
        counter
    }
}

impl<K: Eq + Hash + Clone> Extend<K> for FrequencyCounter<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.add(key);
        }
    }
}
