use crate::error::{ProcessingError, Result};
use crate::models::{format_tenth, AggregateTable};
use crate::utils::constants::{
    COL_STATION_COUNT, COL_STATION_NAME, COL_TEMP_MAX, COL_TEMP_MEAN, COL_TEMP_MIN, STREAM_PATH,
};
use crate::writers::parquet_writer::ParquetWriter;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// Encoding of the final per-station table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Normal,
    Csv,
    Json,
    Parquet,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Normal => "normal",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Parquet => "parquet",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(OutputFormat::Normal),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "parquet" => Ok(OutputFormat::Parquet),
            _ => Err(ProcessingError::UnsupportedFormat {
                kind: "print format",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const HEADERS: [&str; 5] = [
    COL_STATION_NAME,
    COL_STATION_COUNT,
    COL_TEMP_MIN,
    COL_TEMP_MAX,
    COL_TEMP_MEAN,
];

/// Render `table` in station-name order.
///
/// Min, max and mean are rounded to one decimal; rendering the same table
/// twice yields identical bytes.
pub fn render<W: Write + Send>(table: &AggregateTable, format: OutputFormat, sink: W) -> Result<()> {
    match format {
        OutputFormat::Normal => render_normal(table, sink),
        OutputFormat::Csv => render_csv(table, sink),
        OutputFormat::Json => render_json(table, sink),
        OutputFormat::Parquet => ParquetWriter::new().write_aggregates(table, sink),
    }
}

/// Render to a file, or to stdout when `destination` is `-`.
pub fn render_to(table: &AggregateTable, format: OutputFormat, destination: &str) -> Result<()> {
    if destination == STREAM_PATH {
        return render(table, format, std::io::stdout());
    }

    let path = Path::new(destination);
    let file = File::create(path).map_err(|e| ProcessingError::file_access(path, e))?;
    render(table, format, BufWriter::new(file))
}

fn text_rows(table: &AggregateTable) -> Vec<[String; 5]> {
    table
        .rows()
        .into_iter()
        .map(|row| {
            [
                row.station_name,
                row.station_count.to_string(),
                format_tenth(row.temp_min),
                format_tenth(row.temp_max),
                format_tenth(row.temp_mean),
            ]
        })
        .collect()
}

fn render_normal<W: Write>(table: &AggregateTable, sink: W) -> Result<()> {
    let rows = text_rows(table);

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = BufWriter::new(sink);
    write_padded(&mut out, &HEADERS, &widths)?;
    for row in &rows {
        write_padded(&mut out, row, &widths)?;
    }
    out.flush()?;
    Ok(())
}

fn write_padded<W: Write, S: AsRef<str>>(out: &mut W, cells: &[S], widths: &[usize; 5]) -> Result<()> {
    let line = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, width)| {
            let cell = cell.as_ref();
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", " ".repeat(pad), cell)
        })
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(out, "{}", line)?;
    Ok(())
}

fn render_csv<W: Write>(table: &AggregateTable, sink: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record(HEADERS)?;
    for row in text_rows(table) {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn render_json<W: Write>(table: &AggregateTable, sink: W) -> Result<()> {
    let mut out = BufWriter::new(sink);
    serde_json::to_writer_pretty(&mut out, &table.rows())?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
