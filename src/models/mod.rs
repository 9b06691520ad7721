pub mod aggregate;
pub mod builtin_stations;
pub mod format;
pub mod measurement;
pub mod station;

pub use aggregate::{AggregateRow, AggregateTable, StationAggregate};
pub use format::FileFormat;
pub use measurement::{display_tenth, format_tenth, round_to_tenth, MeasurementRecord};
pub use station::{StationCatalog, StationProfile};
