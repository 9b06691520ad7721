pub mod measurement_writer;
pub mod parquet_writer;
pub mod partition_writer;
pub mod result_formatter;

pub use measurement_writer::MeasurementSink;
pub use parquet_writer::{ParquetFileInfo, ParquetWriter};
pub use partition_writer::{BuildSettings, Destination, PartitionDescriptor, PartitionWriter};
pub use result_formatter::{render, render_to, OutputFormat};
