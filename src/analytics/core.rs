//! Shared grouping, reduction, and ranking primitives.
//!
//! Every domain aggregator is an instantiation of the same shape: filter
//! rows, group by a key, reduce to a mean or count, and optionally rank.
//! The primitives here own the ordering rules so all three variants stay
//! deterministic.

use crate::models::MetricEntry;
use std::collections::{BTreeMap, HashMap};

/// Round to 2 decimal places for display stability.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mean of a slice, rounded. `None` when the slice is empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(round2(values.iter().sum::<f64>() / values.len() as f64))
}

/// Per-group accumulator that remembers first-encounter key order.
///
/// Ranking ties are broken by the order keys were first seen, so the
/// accumulator keeps that order alongside the sums.
#[derive(Debug, Default)]
pub struct GroupedValues {
    order: Vec<String>,
    sums: HashMap<String, (f64, u64)>,
}

impl GroupedValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one observation to a group.
    pub fn add(&mut self, key: &str, value: f64) {
        if !self.sums.contains_key(key) {
            self.order.push(key.to_string());
        }
        let slot = self.sums.entry(key.to_string()).or_insert((0.0, 0));
        slot.0 += value;
        slot.1 += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Group means with keys sorted lexicographically, rounded.
    pub fn sorted_means(&self) -> BTreeMap<String, f64> {
        self.order
            .iter()
            .map(|key| {
                let (sum, count) = self.sums[key];
                (key.clone(), round2(sum / count as f64))
            })
            .collect()
    }

    /// Group counts with keys sorted lexicographically.
    pub fn sorted_counts(&self) -> BTreeMap<String, u64> {
        self.order
            .iter()
            .map(|key| (key.clone(), self.sums[key].1))
            .collect()
    }

    /// Mean entries in first-encounter order, rounded.
    pub fn mean_entries(&self) -> Vec<MetricEntry> {
        self.order
            .iter()
            .map(|key| {
                let (sum, count) = self.sums[key];
                MetricEntry::new(key.clone(), round2(sum / count as f64))
            })
            .collect()
    }

    /// Count entries in first-encounter order.
    pub fn count_entries(&self) -> Vec<MetricEntry> {
        self.order
            .iter()
            .map(|key| MetricEntry::new(key.clone(), self.sums[key].1 as f64))
            .collect()
    }
}

/// Sort entries by value descending and cap to `limit` when given.
///
/// The sort is stable, so equal values keep their first-encountered
/// order. `None` keeps every entry; downstream consumers choose their
/// own display truncation.
pub fn rank_desc(mut entries: Vec<MetricEntry>, limit: Option<usize>) -> Vec<MetricEntry> {
    entries.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(81.2345), 81.23);
        assert_eq!(round2(81.235), 81.24);
        assert_eq!(round2(0.75), 0.75);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1.0, 0.0, 1.0, 1.0]), Some(0.75));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_sorted_means_lexicographic_keys() {
        let mut grouped = GroupedValues::new();
        grouped.add("ECE", 70.0);
        grouped.add("CSE", 90.0);
        grouped.add("CSE", 80.0);

        let means = grouped.sorted_means();
        let keys: Vec<&String> = means.keys().collect();
        assert_eq!(keys, ["CSE", "ECE"]);
        assert_eq!(means["CSE"], 85.0);
    }

    #[test]
    fn test_rank_desc_ties_keep_first_encounter_order() {
        let entries = vec![
            MetricEntry::new("alpha", 3.0),
            MetricEntry::new("beta", 5.0),
            MetricEntry::new("gamma", 3.0),
        ];
        let ranked = rank_desc(entries, None);
        let names: Vec<&str> = ranked.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["beta", "alpha", "gamma"]);
    }

    #[test]
    fn test_rank_desc_cap() {
        let entries = vec![
            MetricEntry::new("a", 1.0),
            MetricEntry::new("b", 2.0),
            MetricEntry::new("c", 3.0),
        ];
        let ranked = rank_desc(entries, Some(2));
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].name, "c");
    }
}
