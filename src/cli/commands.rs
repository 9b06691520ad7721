use crate::cli::args::{BuildArgs, Cli, Commands, RunArgs};
use crate::config::{AppConfig, BuildConfig};
use crate::error::Result;
use crate::models::{FileFormat, StationCatalog};
use crate::processors::{InputKind, ParallelProcessor, Strategy};
use crate::query::QuerySettings;
use crate::readers::MeasurementReader;
use crate::utils::cancel::CancelToken;
use crate::utils::progress::ProgressReporter;
use crate::writers::{
    render_to, BuildSettings, Destination, OutputFormat, ParquetWriter, PartitionWriter,
};
use tracing::{debug, info, warn};

/// Dispatch a parsed command line.
///
/// The work itself is blocking (file I/O and rayon), so it runs on the
/// blocking pool while the async runtime stays free to watch for Ctrl-C.
pub async fn run(cli: Cli, config: AppConfig, cancel: CancelToken) -> Result<()> {
    tokio::task::spawn_blocking(move || match cli.command {
        Commands::Build(args) => build(args, &config.build, cancel),
        Commands::Run(args) => run_strategy(args, cancel),
    })
    .await?
}

pub fn build(args: BuildArgs, defaults: &BuildConfig, cancel: CancelToken) -> Result<()> {
    let format: FileFormat = args.format.parse()?;

    let catalog = match &args.stations {
        Some(path) => MeasurementReader::new().read_catalog(path)?,
        None => StationCatalog::builtin(),
    };
    debug!("Sampling from {} stations", catalog.len());

    let settings = BuildSettings {
        output_dir: args.output_dir,
        format,
        rows_per_partition: args.num_samples.unwrap_or(defaults.samples),
        partitions: args.num_files.unwrap_or(defaults.files),
        stdev: args.stdev.unwrap_or(defaults.stdev),
        stream_output: args.stream_output,
        seed: args.seed,
        max_workers: args.max_workers,
    };

    let parquet = ParquetWriter::new().with_compression(&args.compression)?;
    let writer = PartitionWriter::new(&catalog, settings)?
        .with_parquet_writer(parquet)
        .with_cancel_token(cancel);
    let progress = ProgressReporter::new(writer.total_rows(), "rows", !args.progress);

    let descriptors = writer.write_partitions(&progress)?;
    let rows: u64 = descriptors.iter().map(|d| d.row_count).sum();
    progress.finish_with_message(&format!("Wrote {} rows", rows));
    info!("Wrote {} partition(s), {} rows", descriptors.len(), rows);

    if format == FileFormat::Parquet {
        for descriptor in &descriptors {
            if let Destination::File(path) = &descriptor.destination {
                let file_info = parquet.get_file_info(path)?;
                debug!("{}: {}", path.display(), file_info.summary());
            }
        }
    }

    Ok(())
}

pub fn run_strategy(args: RunArgs, cancel: CancelToken) -> Result<()> {
    let strategy: Strategy = args.strategy.parse()?;
    let print_format: OutputFormat = args.print_format().parse()?;
    let settings = QuerySettings::parse(&args.settings, &args.pragmas)?;

    let input_format = if args.from_parquet {
        FileFormat::Parquet
    } else {
        FileFormat::Csv
    };
    let input = if args.merge {
        InputKind::Aggregates
    } else {
        InputKind::Measurements
    };

    let processor = ParallelProcessor::new(strategy)
        .with_format(input_format)
        .with_input(input)
        .with_allow_partial(args.allow_partial)
        .with_max_workers(args.max_workers)
        .with_settings(settings)
        .with_cancel_token(cancel);

    let report = processor.scan(&args.filepattern)?;
    if !report.is_complete() {
        warn!(
            "Result covers {} of {} partitions",
            report.scanned.len(),
            report.scanned.len() + report.failed.len()
        );
    }

    info!(
        "Aggregated {} rows over {} stations",
        report.table.total_count(),
        report.table.len()
    );
    render_to(&report.table, print_format, &args.output)
}
