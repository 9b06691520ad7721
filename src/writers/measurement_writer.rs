use crate::error::Result;
use crate::models::{display_tenth, FileFormat};
use crate::utils::constants::{DEFAULT_BATCH_SIZE, DEFAULT_BUFFER_SIZE, MEASUREMENT_DELIMITER};
use crate::writers::parquet_writer::{measurements_to_batch, ParquetWriter};
use parquet::arrow::ArrowWriter;
use std::io::{BufWriter, Write};

/// Row sink for generated measurements in one of the on-disk encodings.
///
/// Delimited rows are `name;value` with exactly one decimal digit and no
/// header. Parquet rows are buffered into batches of `DEFAULT_BATCH_SIZE`.
pub enum MeasurementSink<'a, W: Write + Send> {
    Csv(BufWriter<W>),
    Parquet {
        writer: ArrowWriter<W>,
        names: Vec<&'a str>,
        temperatures: Vec<f64>,
    },
}

impl<'a, W: Write + Send> MeasurementSink<'a, W> {
    pub fn new(format: FileFormat, sink: W, parquet: &ParquetWriter) -> Result<Self> {
        Ok(match format {
            FileFormat::Csv => MeasurementSink::Csv(BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, sink)),
            FileFormat::Parquet => MeasurementSink::Parquet {
                writer: parquet.measurement_writer(sink)?,
                names: Vec::with_capacity(DEFAULT_BATCH_SIZE),
                temperatures: Vec::with_capacity(DEFAULT_BATCH_SIZE),
            },
        })
    }

    pub fn write_row(&mut self, station_name: &'a str, temperature: f64) -> Result<()> {
        match self {
            MeasurementSink::Csv(writer) => {
                writeln!(
                    writer,
                    "{}{}{:.1}",
                    station_name,
                    MEASUREMENT_DELIMITER,
                    display_tenth(temperature)
                )?;
            }
            MeasurementSink::Parquet {
                writer,
                names,
                temperatures,
            } => {
                names.push(station_name);
                temperatures.push(temperature);
                if names.len() >= DEFAULT_BATCH_SIZE {
                    flush_batch(writer, names, temperatures)?;
                }
            }
        }
        Ok(())
    }

    /// Flush buffered rows and finalize the encoding.
    pub fn finish(self) -> Result<()> {
        match self {
            MeasurementSink::Csv(mut writer) => {
                writer.flush()?;
            }
            MeasurementSink::Parquet {
                mut writer,
                mut names,
                mut temperatures,
            } => {
                flush_batch(&mut writer, &mut names, &mut temperatures)?;
                writer.close()?;
            }
        }
        Ok(())
    }
}

fn flush_batch<W: Write + Send>(
    writer: &mut ArrowWriter<W>,
    names: &mut Vec<&str>,
    temperatures: &mut Vec<f64>,
) -> Result<()> {
    if names.is_empty() {
        return Ok(());
    }

    let batch = measurements_to_batch(names, temperatures)?;
    writer.write(&batch)?;
    names.clear();
    temperatures.clear();
    Ok(())
}
