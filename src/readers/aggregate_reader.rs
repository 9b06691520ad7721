use crate::error::{ProcessingError, Result};
use crate::models::{AggregateRow, AggregateTable, FileFormat, StationAggregate};
use crate::readers::measurement_reader::column;
use crate::utils::constants::{
    COL_STATION_COUNT, COL_STATION_NAME, COL_TEMP_MAX, COL_TEMP_MEAN, COL_TEMP_MIN,
    DEFAULT_BATCH_SIZE,
};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float64Type, UInt64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::path::Path;

/// Reads previously published per-station results back as partials.
///
/// Published files carry `station_count` and a rounded `temp_mean`, not a
/// sum, so each partial's sum is rebuilt as `mean * count`. That is the
/// lower-fidelity merge: the rounding error of every input mean is carried
/// into the merged result, weighted by its count.
pub struct AggregateReader;

impl AggregateReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read_table(&self, path: &Path, format: FileFormat) -> Result<AggregateTable> {
        let file = File::open(path).map_err(|e| ProcessingError::file_access(path, e))?;
        let source = path.display().to_string();

        let rows = match format {
            FileFormat::Csv => read_csv(file, &source)?,
            FileFormat::Parquet => read_parquet(file, &source)?,
        };

        let mut table = AggregateTable::new();
        for (i, row) in rows.into_iter().enumerate() {
            let (name, aggregate) = to_partial(row, &source, i as u64 + 1)?;
            table.merge_aggregate(&name, aggregate);
        }
        Ok(table)
    }
}

impl Default for AggregateReader {
    fn default() -> Self {
        Self::new()
    }
}

fn to_partial(row: AggregateRow, source: &str, line: u64) -> Result<(String, StationAggregate)> {
    if row.station_name.is_empty() {
        return Err(ProcessingError::malformed(source, line, "missing station name"));
    }

    let values = [row.temp_min, row.temp_max, row.temp_mean];
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ProcessingError::malformed(
            source,
            line,
            format!("non-finite statistic for '{}'", row.station_name),
        ));
    }

    let aggregate =
        StationAggregate::from_mean(row.station_count, row.temp_min, row.temp_max, row.temp_mean);
    Ok((row.station_name, aggregate))
}

fn read_csv(file: File, source: &str) -> Result<Vec<AggregateRow>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);

    let mut rows = Vec::new();
    for (i, result) in reader.deserialize::<AggregateRow>().enumerate() {
        // header occupies line 1
        let row = result.map_err(|e| ProcessingError::malformed(source, i as u64 + 2, e.to_string()))?;
        rows.push(row);
    }
    Ok(rows)
}

fn read_parquet(file: File, source: &str) -> Result<Vec<AggregateRow>> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
        .with_batch_size(DEFAULT_BATCH_SIZE)
        .build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;

        let names = column(&batch, COL_STATION_NAME, &DataType::Utf8, source)?;
        let counts = column(&batch, COL_STATION_COUNT, &DataType::UInt64, source)?;
        let mins = column(&batch, COL_TEMP_MIN, &DataType::Float64, source)?;
        let maxs = column(&batch, COL_TEMP_MAX, &DataType::Float64, source)?;
        let means = column(&batch, COL_TEMP_MEAN, &DataType::Float64, source)?;

        let names = names.as_string::<i32>();
        let counts = counts.as_primitive::<UInt64Type>();
        let mins = mins.as_primitive::<Float64Type>();
        let maxs = maxs.as_primitive::<Float64Type>();
        let means = means.as_primitive::<Float64Type>();

        for i in 0..batch.num_rows() {
            let line = rows.len() as u64 + 1;
            if names.is_null(i)
                || counts.is_null(i)
                || mins.is_null(i)
                || maxs.is_null(i)
                || means.is_null(i)
            {
                return Err(ProcessingError::malformed(source, line, "null field in aggregate row"));
            }

            rows.push(AggregateRow {
                station_name: names.value(i).to_string(),
                station_count: counts.value(i),
                temp_min: mins.value(i),
                temp_max: maxs.value(i),
                temp_mean: means.value(i),
            });
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writers::ParquetWriter;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_csv_partials() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "station_name,station_count,temp_min,temp_max,temp_mean\n\
             Y,10,5.0,15.0,10.0\n\
             Z,4,-1.0,1.0,0.5\n\
             Y,10,4.0,16.0,12.0\n"
        )
        .unwrap();

        let table = AggregateReader::new()
            .read_table(file.path(), FileFormat::Csv)
            .unwrap();

        let y = table.get("Y").unwrap();
        assert_eq!(y.count, 20);
        assert_eq!(y.min, 4.0);
        assert_eq!(y.max, 16.0);
        assert_eq!(y.mean(), Some(11.0));
        assert_eq!(table.get("Z").unwrap().sum, 2.0);
    }

    #[test]
    fn test_zero_count_rows_are_ignored() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "station_name,station_count,temp_min,temp_max,temp_mean\nGhost,0,0.0,0.0,0.0\n"
        )
        .unwrap();

        let table = AggregateReader::new()
            .read_table(file.path(), FileFormat::Csv)
            .unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_bad_count_is_malformed() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "station_name,station_count,temp_min,temp_max,temp_mean\nY,many,1.0,2.0,1.5\n"
        )
        .unwrap();

        let err = AggregateReader::new()
            .read_table(file.path(), FileFormat::Csv)
            .unwrap_err();
        assert!(matches!(err, ProcessingError::MalformedRecord { line: 2, .. }));
    }

    #[test]
    fn test_parquet_roundtrip_through_writer() {
        let mut table = AggregateTable::new();
        table.record("A", 1.0);
        table.record("A", 2.0);
        table.record("B", -7.5);

        let file = NamedTempFile::new().unwrap();
        ParquetWriter::new()
            .write_aggregates(&table, File::create(file.path()).unwrap())
            .unwrap();

        let read = AggregateReader::new()
            .read_table(file.path(), FileFormat::Parquet)
            .unwrap();
        assert_eq!(read.get("A").unwrap().count, 2);
        assert_eq!(read.get("A").unwrap().mean(), Some(1.5));
        assert_eq!(read.get("B").unwrap().min, -7.5);
    }
}
