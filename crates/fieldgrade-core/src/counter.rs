//! Frequency counter: observed value -> number of occurrences.
//!
//! Both the rule evaluator and the assertion engine keep one counter per
//! registered key so that every value ever submitted for a field can be
//! charted later. Counters are backed by a `BTreeMap`, so every ordered
//! view is deterministic: equal counts are always listed by ascending key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::format::null_safe;

/// Counts occurrences of keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrequencyCounter<K: Ord> {
    counts: BTreeMap<K, u64>,
}

impl<K: Ord> Default for FrequencyCounter<K> {
    fn default() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone> FrequencyCounter<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one occurrence of `key`.
    pub fn increment(&mut self, key: K) {
        self.increment_by(key, 1);
    }

    /// Adds `amount` occurrences of `key`, creating it if absent.
    pub fn increment_by(&mut self, key: K, amount: u64) {
        *self.counts.entry(key).or_insert(0) += amount;
    }

    /// Count for `key`, or `None` if it was never observed.
    pub fn get_count(&self, key: &K) -> Option<u64> {
        self.counts.get(key).copied()
    }

    /// Sum of all counts.
    pub fn value_total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of distinct keys.
    pub fn key_count(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Adds every count of `other` into this counter. `other` is left untouched.
    pub fn merge(&mut self, other: &FrequencyCounter<K>) {
        for (key, &count) in &other.counts {
            self.increment_by(key.clone(), count);
        }
    }

    /// Snapshot ordered by count, highest first; ties by ascending key.
    pub fn by_count_descending(&self) -> Vec<(K, u64)> {
        let mut entries = self.snapshot();
        // stable sort keeps the ascending key order among equal counts
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }

    /// Snapshot ordered by count, lowest first; ties by ascending key.
    pub fn by_count_ascending(&self) -> Vec<(K, u64)> {
        let mut entries = self.snapshot();
        entries.sort_by(|a, b| a.1.cmp(&b.1));
        entries
    }

    /// Snapshot ordered by key, highest first.
    pub fn by_key_descending(&self) -> Vec<(K, u64)> {
        let mut entries = self.snapshot();
        entries.reverse();
        entries
    }

    /// Snapshot ordered by key, lowest first.
    pub fn by_key_ascending(&self) -> Vec<(K, u64)> {
        self.snapshot()
    }

    fn snapshot(&self) -> Vec<(K, u64)> {
        self.counts
            .iter()
            .map(|(key, &count)| (key.clone(), count))
            .collect()
    }
}

impl FrequencyCounter<String> {
    /// Counts `key`, mapping a missing or blank value to [`crate::format::NULL_SENTINEL`].
    pub fn increment_null_safe(&mut self, key: Option<&str>) {
        self.increment(null_safe(key));
    }

    /// Count for a string key without allocating.
    pub fn count_of(&self, key: &str) -> Option<u64> {
        self.counts.get(key).copied()
    }
}
