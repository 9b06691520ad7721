use crate::models::{AggregateTable, StationAggregate};
use rayon::prelude::*;

/// Combine two partials of the same station.
pub fn merge(a: StationAggregate, b: StationAggregate) -> StationAggregate {
    a.merge(b)
}

/// Sequential left fold of partial tables, keyed by station name.
pub fn merge_all<I>(tables: I) -> AggregateTable
where
    I: IntoIterator<Item = AggregateTable>,
{
    tables
        .into_iter()
        .fold(AggregateTable::new(), |acc, table| acc.merge(table))
}

/// Pairwise tree reduction on the rayon pool.
///
/// Equal to [`merge_all`] up to floating-point summation order, since the
/// merge rule is associative and commutative.
pub fn tree_merge(tables: Vec<AggregateTable>) -> AggregateTable {
    tables
        .into_par_iter()
        .reduce(AggregateTable::new, |a, b| a.merge(b))
}
