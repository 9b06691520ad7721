use crate::error::{ProcessingError, Result};
use crate::models::{AggregateTable, MeasurementRecord};

/// Folds measurement rows into one [`AggregateTable`].
///
/// The result depends only on the multiset of rows, never on their order.
#[derive(Debug, Default)]
pub struct PartialAggregator {
    table: AggregateTable,
    rows: u64,
}

impl PartialAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one row read from `source` at `line`.
    pub fn push(&mut self, source: &str, line: u64, station_name: &str, value: f64) -> Result<()> {
        if station_name.is_empty() {
            return Err(ProcessingError::malformed(source, line, "missing station name"));
        }
        if !value.is_finite() {
            return Err(ProcessingError::malformed(
                source,
                line,
                format!("non-finite temperature {} for '{}'", value, station_name),
            ));
        }

        self.table.record(station_name, value);
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn finish(self) -> AggregateTable {
        self.table
    }
}

/// Aggregate an in-memory sequence of rows in a single pass.
pub fn aggregate<I>(rows: I) -> Result<AggregateTable>
where
    I: IntoIterator<Item = MeasurementRecord>,
{
    let mut aggregator = PartialAggregator::new();
    for (i, row) in rows.into_iter().enumerate() {
        aggregator.push("<rows>", i as u64 + 1, &row.station_name, row.temperature)?;
    }
    Ok(aggregator.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn rows(pairs: &[(&str, f64)]) -> Vec<MeasurementRecord> {
        pairs
            .iter()
            .map(|(name, value)| MeasurementRecord::new(*name, *value))
            .collect()
    }

    #[test]
    fn test_aggregate_counts_min_max_mean() {
        let table = aggregate(rows(&[
            ("Oslo", -5.0),
            ("Accra", 30.0),
            ("Oslo", 3.0),
            ("Oslo", 8.0),
        ]))
        .unwrap();

        assert_eq!(table.len(), 2);
        let oslo = table.get("Oslo").unwrap();
        assert_eq!(oslo.count, 3);
        assert_eq!(oslo.min, -5.0);
        assert_eq!(oslo.max, 8.0);
        assert_eq!(oslo.mean(), Some(2.0));
        assert!(oslo.is_consistent());
    }

    #[test]
    fn test_two_stations_one_row_each() {
        let table = aggregate(rows(&[("A", 0.0), ("B", 100.0)])).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("A").unwrap().count, 1);
        assert_eq!(table.get("B").unwrap().count, 1);
    }

    #[test]
    fn test_order_independence() {
        let mut data = rows(&[
            ("A", 1.5),
            ("B", -2.25),
            ("A", 3.0),
            ("C", 0.0),
            ("B", 7.5),
            ("A", -1.0),
        ]);
        let expected = aggregate(data.clone()).unwrap();

        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..5 {
            data.shuffle(&mut rng);
            let shuffled = aggregate(data.clone()).unwrap();
            for (name, aggregate) in expected.sorted() {
                let other = shuffled.get(name).unwrap();
                assert_eq!(aggregate.count, other.count);
                assert_eq!(aggregate.min, other.min);
                assert_eq!(aggregate.max, other.max);
                assert!((aggregate.sum - other.sum).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_rejects_missing_station_name() {
        let err = aggregate(rows(&[("A", 1.0), ("", 2.0)])).unwrap_err();
        match err {
            ProcessingError::MalformedRecord { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_accepts_negative_rejects_nan() {
        assert!(aggregate(rows(&[("Yakutsk", -45.3)])).is_ok());
        assert!(aggregate(rows(&[("Yakutsk", f64::NAN)])).is_err());
    }

    #[test]
    fn test_empty_input() {
        let table = aggregate(Vec::new()).unwrap();
        assert!(table.is_empty());
    }
}
