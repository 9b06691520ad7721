pub mod aggregate_reader;
pub mod measurement_reader;

pub use aggregate_reader::AggregateReader;
pub use measurement_reader::{parse_line, MeasurementReader};
