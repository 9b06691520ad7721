use crate::error::{ProcessingError, Result};
use crate::generators::{partition_seeds, Sampler};
use crate::models::{FileFormat, StationCatalog};
use crate::utils::cancel::CancelToken;
use crate::utils::constants::PROGRESS_INTERVAL;
use crate::utils::filename::partition_path;
use crate::utils::progress::ProgressReporter;
use crate::writers::measurement_writer::MeasurementSink;
use crate::writers::parquet_writer::ParquetWriter;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, error, info};
use validator::Validate;

/// Validated parameters of one generation run.
#[derive(Debug, Clone, Validate)]
pub struct BuildSettings {
    pub output_dir: PathBuf,
    pub format: FileFormat,
    pub rows_per_partition: u64,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub partitions: u32,
    #[validate(range(min = 0.0, message = "must be >= 0"))]
    pub stdev: f64,
    pub stream_output: bool,
    pub seed: Option<u64>,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub max_workers: usize,
}

impl BuildSettings {
    pub fn check(&self) -> Result<()> {
        if !self.stdev.is_finite() {
            return Err(ProcessingError::invalid_parameter(
                "stdev",
                format!("must be finite, got {}", self.stdev),
            ));
        }

        self.validate().map_err(|errors| {
            let field_errors = errors.field_errors();
            match field_errors.iter().next() {
                Some((field, errs)) => {
                    let message = errs
                        .first()
                        .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                        .unwrap_or_else(|| "invalid value".to_string());
                    ProcessingError::invalid_parameter(field.to_string(), message)
                }
                None => ProcessingError::Validation(errors.clone()),
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    File(PathBuf),
    Stream,
}

/// One physical output unit of a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionDescriptor {
    pub index: u32,
    pub row_count: u64,
    pub destination: Destination,
}

/// Samples and serializes `partitions` independent partitions.
///
/// Every partition gets its own generator seeded from a master seed, so
/// partitions are uncorrelated and any one of them can be rewritten alone.
pub struct PartitionWriter<'a> {
    catalog: &'a StationCatalog,
    settings: BuildSettings,
    total_rows: u64,
    seeds: Vec<u64>,
    parquet: ParquetWriter,
    cancel: CancelToken,
}

impl<'a> PartitionWriter<'a> {
    pub fn new(catalog: &'a StationCatalog, settings: BuildSettings) -> Result<Self> {
        settings.check()?;
        if catalog.is_empty() {
            return Err(ProcessingError::invalid_parameter(
                "catalog",
                "cannot sample from an empty catalog",
            ));
        }

        let total_rows = settings
            .rows_per_partition
            .checked_mul(settings.partitions as u64)
            .ok_or_else(|| {
                ProcessingError::invalid_parameter(
                    "num_samples",
                    format!(
                        "{} rows x {} partitions exceeds {} rows",
                        settings.rows_per_partition,
                        settings.partitions,
                        u64::MAX
                    ),
                )
            })?;

        let seeds = partition_seeds(settings.seed, settings.partitions as usize);
        Ok(Self {
            catalog,
            settings,
            total_rows,
            seeds,
            parquet: ParquetWriter::new(),
            cancel: CancelToken::new(),
        })
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_parquet_writer(mut self, parquet: ParquetWriter) -> Self {
        self.parquet = parquet;
        self
    }

    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }

    /// Write to files under `output_dir`, or to stdout in stream mode.
    pub fn write_partitions(&self, progress: &ProgressReporter) -> Result<Vec<PartitionDescriptor>> {
        if self.settings.stream_output {
            self.write_stream(std::io::stdout(), progress)
        } else {
            self.write_files(progress)
        }
    }

    /// One file per partition, written concurrently.
    pub fn write_files(&self, progress: &ProgressReporter) -> Result<Vec<PartitionDescriptor>> {
        std::fs::create_dir_all(&self.settings.output_dir)
            .map_err(|e| ProcessingError::file_access(&self.settings.output_dir, e))?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.max_workers)
            .build()
            .map_err(|e| ProcessingError::invalid_parameter("max_workers", e.to_string()))?;

        let results: Vec<Result<PartitionDescriptor>> = pool.install(|| {
            (0..self.settings.partitions)
                .into_par_iter()
                .map(|index| self.write_partition_file(index, progress))
                .collect()
        });

        let mut descriptors = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(e) => {
                    error!("Partition failed: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(descriptors),
        }
    }

    /// Generate (or regenerate) a single partition file.
    ///
    /// The file is removed again if the partition does not complete.
    pub fn write_partition_file(
        &self,
        index: u32,
        progress: &ProgressReporter,
    ) -> Result<PartitionDescriptor> {
        self.cancel.check()?;

        let path = partition_path(
            &self.settings.output_dir,
            index,
            self.settings.partitions,
            self.settings.format.extension(),
        );
        if let Some(name) = path.file_name() {
            progress.set_message(&name.to_string_lossy());
        }
        info!(
            "Writing data ({}) to file ({})",
            self.settings.rows_per_partition,
            path.display()
        );

        let file = File::create(&path).map_err(|e| ProcessingError::file_access(&path, e))?;
        let result = MeasurementSink::new(self.settings.format, file, &self.parquet).and_then(|mut sink| {
            let rows = self.write_rows(index, &mut sink, progress)?;
            sink.finish()?;
            Ok(rows)
        });

        match result {
            Ok(row_count) => Ok(PartitionDescriptor {
                index,
                row_count,
                destination: Destination::File(path),
            }),
            Err(e) => {
                debug!("Removing incomplete partition {}", path.display());
                let _ = std::fs::remove_file(&path);
                Err(e)
            }
        }
    }

    /// All partitions into one destination, in partition order.
    pub fn write_stream<W: Write + Send>(
        &self,
        sink: W,
        progress: &ProgressReporter,
    ) -> Result<Vec<PartitionDescriptor>> {
        info!(
            "Writing data ({}) to stream (<stdout>)",
            self.total_rows()
        );

        let mut sink = MeasurementSink::new(self.settings.format, sink, &self.parquet)?;
        let mut descriptors = Vec::with_capacity(self.settings.partitions as usize);

        for index in 0..self.settings.partitions {
            self.cancel.check()?;
            let row_count = self.write_rows(index, &mut sink, progress)?;
            descriptors.push(PartitionDescriptor {
                index,
                row_count,
                destination: Destination::Stream,
            });
        }

        sink.finish()?;
        Ok(descriptors)
    }

    fn write_rows<W: Write + Send>(
        &self,
        index: u32,
        sink: &mut MeasurementSink<'a, W>,
        progress: &ProgressReporter,
    ) -> Result<u64> {
        let rng = StdRng::seed_from_u64(self.seeds[index as usize]);
        let mut sampler = Sampler::new(
            self.catalog,
            self.settings.rows_per_partition,
            self.settings.stdev,
            rng,
        )?;

        let mut rows = 0u64;
        while let Some((station, value)) = sampler.next_sample() {
            sink.write_row(&station.name, value)?;
            rows += 1;

            if rows % PROGRESS_INTERVAL == 0 {
                progress.increment(PROGRESS_INTERVAL);
                self.cancel.check()?;
            }
        }
        progress.increment(rows % PROGRESS_INTERVAL);

        debug!("Partition {} complete ({} rows)", index, rows);
        Ok(rows)
    }
}
