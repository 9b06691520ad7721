use crate::error::{ProcessingError, Result};
use crate::models::{display_tenth, AggregateTable};
use crate::utils::constants::{
    COL_STATION_COUNT, COL_STATION_NAME, COL_TEMPERATURE, COL_TEMP_MAX, COL_TEMP_MEAN, COL_TEMP_MIN,
    DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::{ArrayRef, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            "snappy" => Compression::SNAPPY,
            "gzip" => Compression::GZIP(GzipLevel::default()),
            "lz4" => Compression::LZ4,
            "zstd" => Compression::ZSTD(ZstdLevel::default()),
            "none" => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::UnsupportedFormat {
                    kind: "parquet compression",
                    value: compression.to_string(),
                })
            }
        };
        Ok(self)
    }

    pub fn properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build()
    }

    /// Open an Arrow writer for raw measurement rows
    pub fn measurement_writer<W: Write + Send>(&self, sink: W) -> Result<ArrowWriter<W>> {
        Ok(ArrowWriter::try_new(
            sink,
            measurement_schema(),
            Some(self.properties()),
        )?)
    }

    /// Write a per-station table using the aggregate schema
    pub fn write_aggregates<W: Write + Send>(&self, table: &AggregateTable, sink: W) -> Result<()> {
        let schema = aggregate_schema();
        let batch = aggregates_to_batch(table, schema.clone())?;

        let mut writer = ArrowWriter::try_new(sink, schema, Some(self.properties()))?;
        writer.write(&batch)?;
        writer.close()?;

        Ok(())
    }

    /// Row and size metadata of a written partition
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path).map_err(|e| ProcessingError::file_access(path, e))?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let total_rows = metadata.file_metadata().num_rows();
        let file_size = std::fs::metadata(path)?.len();

        Ok(ParquetFileInfo {
            total_rows,
            row_groups,
            file_size,
            compression: self.compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Two-column schema of generated measurement files
pub fn measurement_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(COL_STATION_NAME, DataType::Utf8, false),
        Field::new(COL_TEMPERATURE, DataType::Float64, false),
    ]))
}

/// Per-station result schema, also accepted as input when merging partials
pub fn aggregate_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(COL_STATION_NAME, DataType::Utf8, false),
        Field::new(COL_STATION_COUNT, DataType::UInt64, false),
        Field::new(COL_TEMP_MIN, DataType::Float64, false),
        Field::new(COL_TEMP_MAX, DataType::Float64, false),
        Field::new(COL_TEMP_MEAN, DataType::Float64, false),
    ]))
}

/// Build one measurement batch; temperatures are rounded to one decimal.
pub fn measurements_to_batch(names: &[&str], temperatures: &[f64]) -> Result<RecordBatch> {
    let rounded: Vec<f64> = temperatures.iter().map(|t| display_tenth(*t)).collect();

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(names.to_vec())),
        Arc::new(Float64Array::from(rounded)),
    ];

    Ok(RecordBatch::try_new(measurement_schema(), columns)?)
}

fn aggregates_to_batch(table: &AggregateTable, schema: SchemaRef) -> Result<RecordBatch> {
    let rows = table.rows();

    let names: Vec<&str> = rows.iter().map(|r| r.station_name.as_str()).collect();
    let counts: Vec<u64> = rows.iter().map(|r| r.station_count).collect();
    let mins: Vec<f64> = rows.iter().map(|r| r.temp_min).collect();
    let maxs: Vec<f64> = rows.iter().map(|r| r.temp_max).collect();
    let means: Vec<f64> = rows.iter().map(|r| r.temp_mean).collect();

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(names)),
        Arc::new(UInt64Array::from(counts)),
        Arc::new(Float64Array::from(mins)),
        Arc::new(Float64Array::from(maxs)),
        Arc::new(Float64Array::from(means)),
    ];

    Ok(RecordBatch::try_new(schema, columns)?)
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: usize,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "{} rows in {} row group(s), {} bytes, {:?}",
            self.total_rows, self.row_groups, self.file_size, self.compression
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn sample_table() -> AggregateTable {
        let mut table = AggregateTable::new();
        table.record("Oslo", 5.04);
        table.record("Oslo", -2.0);
        table.record("Accra", 26.4);
        table
    }

    #[test]
    fn test_write_aggregates() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;

        writer.write_aggregates(&sample_table(), File::create(temp_file.path())?)?;

        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 2);
        assert!(info.file_size > 0);
        assert!(info.summary().starts_with("2 rows in 1 row group(s)"), "{}", info.summary());

        Ok(())
    }

    #[test]
    fn test_write_empty_table() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;

        writer.write_aggregates(&AggregateTable::new(), File::create(temp_file.path())?)?;
        assert_eq!(writer.get_file_info(temp_file.path())?.total_rows, 0);

        Ok(())
    }

    #[test]
    fn test_different_compressions() -> Result<()> {
        let compressions = ["snappy", "gzip", "lz4", "zstd", "none"];

        for compression in &compressions {
            let writer = ParquetWriter::new().with_compression(compression)?;
            let mut buffer = Vec::new();

            let result = writer.write_aggregates(&sample_table(), &mut buffer);
            assert!(result.is_ok(), "Failed with compression: {}", compression);
            assert!(!buffer.is_empty());
        }

        assert!(ParquetWriter::new().with_compression("brotli9000").is_err());
        Ok(())
    }

    #[test]
    fn test_measurement_batch_is_rounded() -> Result<()> {
        let batch = measurements_to_batch(&["A", "B"], &[1.26, -0.049])?;
        let temperatures = batch
            .column(1)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();

        assert_eq!(temperatures.value(0), 1.3);
        assert_eq!(temperatures.value(1), 0.0);
        Ok(())
    }
}
