use crate::error::{ProcessingError, Result};
use crate::models::{FileFormat, StationCatalog, StationProfile};
use crate::processors::PartialAggregator;
use crate::utils::constants::{
    COL_STATION_NAME, COL_TEMPERATURE, DEFAULT_BATCH_SIZE, DEFAULT_BUFFER_SIZE, MEASUREMENT_DELIMITER,
};
use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use arrow::record_batch::RecordBatch;
use memmap2::Mmap;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Reads `station_name;temperature` partitions (delimited text or Parquet)
/// and feeds every row into a [`PartialAggregator`].
pub struct MeasurementReader {
    use_mmap: bool,
}

impl MeasurementReader {
    pub fn new() -> Self {
        Self { use_mmap: false }
    }

    pub fn with_mmap(use_mmap: bool) -> Self {
        Self { use_mmap }
    }

    /// Scan one partition file; returns the number of rows read.
    pub fn read_into(
        &self,
        path: &Path,
        format: FileFormat,
        aggregator: &mut PartialAggregator,
    ) -> Result<u64> {
        let file = File::open(path).map_err(|e| ProcessingError::file_access(path, e))?;
        let source = path.display().to_string();

        match format {
            FileFormat::Csv if self.use_mmap => {
                let mmap = unsafe { Mmap::map(&file)? };
                let content = std::str::from_utf8(&mmap).map_err(|e| {
                    ProcessingError::malformed(&source, 0, format!("invalid UTF-8: {}", e))
                })?;
                read_lines(content.lines().map(Ok::<_, std::io::Error>), &source, aggregator)
            }
            FileFormat::Csv => {
                let reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
                read_lines(reader.lines(), &source, aggregator)
            }
            FileFormat::Parquet => read_parquet(file, &source, aggregator),
        }
    }

    /// Scan delimited rows from any reader (e.g. standard input)
    pub fn read_stream<R: Read>(
        &self,
        reader: R,
        source: &str,
        aggregator: &mut PartialAggregator,
    ) -> Result<u64> {
        let reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, reader);
        read_lines(reader.lines(), source, aggregator)
    }

    /// Load a `name;baseline` station catalog.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    pub fn read_catalog(&self, path: &Path) -> Result<StationCatalog> {
        let file = File::open(path).map_err(|e| ProcessingError::file_access(path, e))?;
        let reader = BufReader::new(file);
        let source = path.display().to_string();
        let mut stations = Vec::new();

        for (i, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let (name, baseline) = parse_line(trimmed)
                .map_err(|message| ProcessingError::malformed(&source, i as u64 + 1, message))?;
            stations.push(StationProfile::new(name, baseline));
        }

        StationCatalog::new(stations)
    }
}

impl Default for MeasurementReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Split one delimited row into station name and value.
pub fn parse_line(line: &str) -> std::result::Result<(&str, f64), String> {
    let line = line.trim_end_matches('\r');
    let (name, value) = line
        .rsplit_once(MEASUREMENT_DELIMITER)
        .ok_or_else(|| format!("expected 'station;temperature', got '{}'", line))?;

    if name.is_empty() {
        return Err("missing station name".to_string());
    }

    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("non-numeric temperature '{}' for '{}'", value, name))?;

    Ok((name, value))
}

fn read_lines<I, S>(lines: I, source: &str, aggregator: &mut PartialAggregator) -> Result<u64>
where
    I: Iterator<Item = std::io::Result<S>>,
    S: AsRef<str>,
{
    let mut rows = 0;

    for (i, line_result) in lines.enumerate() {
        let line = line_result?;
        let line = line.as_ref();
        let line_number = i as u64 + 1;

        if line.trim().is_empty() {
            continue;
        }

        let (name, value) = parse_line(line)
            .map_err(|message| ProcessingError::malformed(source, line_number, message))?;
        aggregator.push(source, line_number, name, value)?;
        rows += 1;
    }

    Ok(rows)
}

fn read_parquet(file: File, source: &str, aggregator: &mut PartialAggregator) -> Result<u64> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
        .with_batch_size(DEFAULT_BATCH_SIZE)
        .build()?;

    let mut rows = 0u64;
    for batch_result in reader {
        let batch = batch_result?;
        rows += read_batch(&batch, source, rows, aggregator)?;
    }

    Ok(rows)
}

fn read_batch(
    batch: &RecordBatch,
    source: &str,
    offset: u64,
    aggregator: &mut PartialAggregator,
) -> Result<u64> {
    let names = column(batch, COL_STATION_NAME, &DataType::Utf8, source)?;
    let temperatures = column(batch, COL_TEMPERATURE, &DataType::Float64, source)?;
    let names = names.as_string::<i32>();
    let temperatures = temperatures.as_primitive::<Float64Type>();

    for i in 0..batch.num_rows() {
        let line = offset + i as u64 + 1;
        if names.is_null(i) {
            return Err(ProcessingError::malformed(source, line, "missing station name"));
        }
        if temperatures.is_null(i) {
            return Err(ProcessingError::malformed(source, line, "missing temperature"));
        }
        aggregator.push(source, line, names.value(i), temperatures.value(i))?;
    }

    Ok(batch.num_rows() as u64)
}

/// Look up a column by name and cast it to the expected type
pub(crate) fn column(
    batch: &RecordBatch,
    name: &str,
    data_type: &DataType,
    source: &str,
) -> Result<arrow::array::ArrayRef> {
    let array = batch.column_by_name(name).ok_or_else(|| {
        ProcessingError::malformed(source, 0, format!("missing column '{}'", name))
    })?;

    Ok(cast(array, data_type)?)
}
