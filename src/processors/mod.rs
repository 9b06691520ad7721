pub mod aggregator;
pub mod merger;
pub mod parallel_processor;

pub use aggregator::{aggregate, PartialAggregator};
pub use merger::{merge, merge_all, tree_merge};
pub use parallel_processor::{expand_pattern, InputKind, ParallelProcessor, ScanReport, Strategy};
