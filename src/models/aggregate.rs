use crate::models::display_tenth;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Minimal sufficient statistic for count/min/max/mean of one station.
///
/// The running sum is kept instead of a running mean so that merging is
/// associative and commutative. An aggregate with `count == 0` is the
/// identity element of [`StationAggregate::merge`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationAggregate {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for StationAggregate {
    fn default() -> Self {
        Self::empty()
    }
}

impl StationAggregate {
    pub const fn empty() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn from_value(value: f64) -> Self {
        Self {
            count: 1,
            sum: value,
            min: value,
            max: value,
        }
    }

    /// Rebuild a partial from a published mean rather than an exact sum.
    ///
    /// Lower fidelity: when `mean` was rounded before publication the
    /// reconstructed sum carries that rounding error, scaled by `count`.
    pub fn from_mean(count: u64, min: f64, max: f64, mean: f64) -> Self {
        if count == 0 {
            return Self::empty();
        }

        Self {
            count,
            sum: mean * count as f64,
            min,
            max,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn merge(self, other: Self) -> Self {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }

        Self {
            count: self.count + other.count,
            sum: self.sum + other.sum,
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }

    /// `min <= mean <= max`, allowing for summation rounding
    pub fn is_consistent(&self) -> bool {
        match self.mean() {
            None => true,
            Some(mean) => {
                let tolerance = 1e-9 * mean.abs().max(1.0);
                self.min <= mean + tolerance && mean <= self.max + tolerance
            }
        }
    }
}

/// One rendered output row with values rounded for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub station_name: String,
    pub station_count: u64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub temp_mean: f64,
}

/// Per-station aggregates keyed by station name.
///
/// Accumulation order is irrelevant; [`AggregateTable::sorted`] yields
/// stations in byte-wise name order for rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateTable {
    stations: HashMap<String, StationAggregate>,
}

impl AggregateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn get(&self, station_name: &str) -> Option<&StationAggregate> {
        self.stations.get(station_name)
    }

    pub fn record(&mut self, station_name: &str, value: f64) {
        match self.stations.get_mut(station_name) {
            Some(aggregate) => aggregate.add(value),
            None => {
                self.stations
                    .insert(station_name.to_string(), StationAggregate::from_value(value));
            }
        }
    }

    /// Fold one partial aggregate in. Zero-count partials leave no trace.
    pub fn merge_aggregate(&mut self, station_name: &str, aggregate: StationAggregate) {
        if aggregate.is_empty() {
            return;
        }

        match self.stations.get_mut(station_name) {
            Some(existing) => *existing = existing.merge(aggregate),
            None => {
                self.stations.insert(station_name.to_string(), aggregate);
            }
        }
    }

    pub fn merge(mut self, other: Self) -> Self {
        if self.stations.len() < other.stations.len() {
            return other.merge(self);
        }

        for (station_name, aggregate) in other.stations {
            self.merge_aggregate(&station_name, aggregate);
        }
        self
    }

    pub fn total_count(&self) -> u64 {
        self.stations.values().map(|a| a.count).sum()
    }

    pub fn sorted(&self) -> Vec<(&str, &StationAggregate)> {
        let mut entries: Vec<(&str, &StationAggregate)> = self
            .stations
            .iter()
            .map(|(name, aggregate)| (name.as_str(), aggregate))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
        entries
    }

    pub fn rows(&self) -> Vec<AggregateRow> {
        self.sorted()
            .into_iter()
            .filter_map(|(name, aggregate)| {
                aggregate.mean().map(|mean| AggregateRow {
                    station_name: name.to_string(),
                    station_count: aggregate.count,
                    temp_min: display_tenth(aggregate.min),
                    temp_max: display_tenth(aggregate.max),
                    temp_mean: display_tenth(mean),
                })
            })
            .collect()
    }
}

impl FromIterator<(String, StationAggregate)> for AggregateTable {
    fn from_iter<I: IntoIterator<Item = (String, StationAggregate)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (station_name, aggregate) in iter {
            table.merge_aggregate(&station_name, aggregate);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::round_to_tenth;

    fn partial(values: &[f64]) -> StationAggregate {
        values.iter().fold(StationAggregate::empty(), |mut acc, v| {
            acc.add(*v);
            acc
        })
    }

    fn assert_close(a: &StationAggregate, b: &StationAggregate) {
        assert_eq!(a.count, b.count);
        assert_eq!(a.min, b.min);
        assert_eq!(a.max, b.max);
        assert!((a.sum - b.sum).abs() <= 1e-9 * a.sum.abs().max(1.0));
    }

    #[test]
    fn test_merge_identity() {
        let a = partial(&[1.5, -3.0, 7.25]);

        assert_eq!(a.merge(StationAggregate::empty()), a);
        assert_eq!(StationAggregate::empty().merge(a), a);
        assert_eq!(StationAggregate::empty().merge(StationAggregate::empty()).mean(), None);
    }

    #[test]
    fn test_merge_associative_and_commutative() {
        let a = partial(&[12.3, -4.5, 0.1]);
        let b = partial(&[99.9, 13.0]);
        let c = partial(&[-20.0, 5.5, 6.6, 7.7]);

        let left = a.merge(b).merge(c);
        let right = a.merge(b.merge(c));
        let swapped = a.merge(c).merge(b);

        assert_close(&left, &right);
        assert_close(&left, &swapped);
        assert_close(&a.merge(b), &b.merge(a));
    }

    #[test]
    fn test_merge_two_equal_partials() {
        let partial = StationAggregate {
            count: 10,
            sum: 100.0,
            min: 5.0,
            max: 15.0,
        };

        let merged = partial.merge(partial);
        assert_eq!(merged.count, 20);
        assert_eq!(merged.sum, 200.0);
        assert_eq!(merged.min, 5.0);
        assert_eq!(merged.max, 15.0);
        assert_eq!(merged.mean(), Some(10.0));
    }

    #[test]
    fn test_from_mean_loses_precision() {
        let exact = partial(&[1.04, 1.04, 1.04]);
        let published = round_to_tenth(exact.mean().unwrap());
        let rebuilt = StationAggregate::from_mean(exact.count, exact.min, exact.max, published);

        assert_eq!(rebuilt.count, 3);
        assert!((rebuilt.sum - 3.0).abs() < 1e-12);
        assert!((exact.sum - rebuilt.sum).abs() > 0.1);
        assert!(StationAggregate::from_mean(0, 1.0, 2.0, 1.5).is_empty());
    }

    #[test]
    fn test_consistency() {
        assert!(partial(&[1.0, 2.0, 3.0]).is_consistent());
        assert!(StationAggregate::empty().is_consistent());

        let broken = StationAggregate {
            count: 2,
            sum: 100.0,
            min: 0.0,
            max: 1.0,
        };
        assert!(!broken.is_consistent());
    }

    #[test]
    fn test_table_ignores_zero_count_partials() {
        let mut table = AggregateTable::new();
        table.merge_aggregate("Ghost", StationAggregate::empty());
        table.record("Oslo", 5.0);

        assert_eq!(table.len(), 1);
        assert!(table.get("Ghost").is_none());
    }

    #[test]
    fn test_sorted_is_bytewise() {
        let mut table = AggregateTable::new();
        for name in ["Zürich", "abha", "Abha", "Ürümqi", "Zagreb"] {
            table.record(name, 1.0);
        }

        let names: Vec<&str> = table.sorted().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Abha", "Zagreb", "Zürich", "abha", "Ürümqi"]);
    }

    #[test]
    fn test_table_merge_carries_unshared_stations() {
        let mut a = AggregateTable::new();
        a.record("A", 1.0);
        a.record("B", 2.0);
        let mut b = AggregateTable::new();
        b.record("B", 4.0);
        b.record("C", 3.0);

        let merged = a.merge(b);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get("B").unwrap().count, 2);
        assert_eq!(merged.get("B").unwrap().mean(), Some(3.0));
        assert_eq!(merged.get("C").unwrap().count, 1);
        assert_eq!(merged.total_count(), 4);
    }

    #[test]
    fn test_rows_are_rounded() {
        let mut table = AggregateTable::new();
        table.record("X", 1.04);
        table.record("X", 2.16);

        let rows = table.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].temp_min, 1.0);
        assert_eq!(rows[0].temp_max, 2.2);
        assert_eq!(rows[0].temp_mean, 1.6);
        assert_eq!(rows[0].station_count, 2);
    }
}
