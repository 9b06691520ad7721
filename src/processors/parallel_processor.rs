use crate::error::{ProcessingError, Result};
use crate::models::{AggregateTable, FileFormat};
use crate::processors::aggregator::PartialAggregator;
use crate::processors::merger::{merge_all, tree_merge};
use crate::query::QuerySettings;
use crate::readers::{AggregateReader, MeasurementReader};
use crate::utils::cancel::CancelToken;
use crate::utils::constants::STREAM_PATH;
use crate::utils::progress::ProgressReporter;
use crate::utils::timer::{format_elapsed, RunTimer};
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// The closed set of ways to turn a file pattern into one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Files scanned one after another on the calling thread.
    Basic,
    /// Files scanned independently on the rayon pool, partials tree-merged.
    Partitioned,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::Basic, Strategy::Partitioned];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Basic => "basic",
            Strategy::Partitioned => "partitioned",
        }
    }

    /// Scan `pattern` with default options.
    pub fn scan(self, pattern: &str) -> Result<AggregateTable> {
        Ok(ParallelProcessor::new(self).scan(pattern)?.table)
    }
}

impl FromStr for Strategy {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(Strategy::Basic),
            "partitioned" => Ok(Strategy::Partitioned),
            _ => Err(ProcessingError::invalid_parameter(
                "strategy",
                format!("unknown strategy '{}', expected one of: basic, partitioned", s),
            )),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the matched files contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputKind {
    /// Raw `station_name;temperature` rows.
    #[default]
    Measurements,
    /// Published per-station results, merged through their rounded means.
    Aggregates,
}

/// Merged table plus which partitions contributed to it.
///
/// Stations of a failed partition are simply missing from `table`.
#[derive(Debug)]
pub struct ScanReport {
    pub table: AggregateTable,
    pub scanned: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

impl ScanReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct ParallelProcessor {
    strategy: Strategy,
    format: FileFormat,
    input: InputKind,
    allow_partial: bool,
    max_workers: usize,
    use_mmap: bool,
    settings: QuerySettings,
    cancel: CancelToken,
}

impl ParallelProcessor {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            format: FileFormat::Csv,
            input: InputKind::Measurements,
            allow_partial: false,
            max_workers: num_cpus::get(),
            use_mmap: false,
            settings: QuerySettings::new(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_input(mut self, input: InputKind) -> Self {
        self.input = input;
        self
    }

    pub fn with_allow_partial(mut self, allow_partial: bool) -> Self {
        self.allow_partial = allow_partial;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    pub fn with_settings(mut self, settings: QuerySettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Aggregate every file matching `pattern` (`-` reads standard input).
    pub fn scan(&self, pattern: &str) -> Result<ScanReport> {
        let _timer = RunTimer::start(self.strategy.as_str(), pattern);

        if !self.settings.is_empty() {
            debug!("Engine settings:\n{}", self.settings.preamble());
        }
        self.settings.log_unapplied();

        if self.input == InputKind::Aggregates {
            warn!("Merging published partials: sums are rebuilt from rounded means, final digits may differ from a full scan");
        }

        if pattern == STREAM_PATH {
            return self.scan_stdin();
        }

        let paths = expand_pattern(pattern)?;
        info!("Scanning {} file(s) matching '{}'", paths.len(), pattern);

        let progress = ProgressReporter::new(
            paths.len() as u64,
            "files",
            !self.settings.progress_enabled(false),
        );

        let threads = self.settings.threads()?.unwrap_or(self.max_workers);
        let (tables, scanned, failed) = match self.strategy {
            Strategy::Basic => {
                let outcomes = paths
                    .iter()
                    .map(|path| (path.clone(), self.scan_file(path, &progress)));
                let (tables, scanned, failed) = collect_outcomes(outcomes)?;
                (merge_all(tables), scanned, failed)
            }
            Strategy::Partitioned => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| ProcessingError::invalid_parameter("threads", e.to_string()))?;

                pool.install(|| -> Result<_> {
                    let outcomes: Vec<(PathBuf, Result<AggregateTable>)> = paths
                        .par_iter()
                        .map(|path| (path.clone(), self.scan_file(path, &progress)))
                        .collect();
                    let (tables, scanned, failed) = collect_outcomes(outcomes)?;
                    Ok((tree_merge(tables), scanned, failed))
                })?
            }
        };
        progress.finish_with_message(&format!("Scanned {} file(s)", scanned.len()));

        if !failed.is_empty() {
            for path in &failed {
                warn!("Partition {} is absent from the result", path.display());
            }
            if !self.allow_partial {
                return Err(ProcessingError::IncompleteCoverage {
                    failed: failed.len(),
                    total: paths.len(),
                });
            }
        }

        Ok(ScanReport {
            table: tables,
            scanned,
            failed,
        })
    }

    fn scan_file(&self, path: &Path, progress: &ProgressReporter) -> Result<AggregateTable> {
        self.cancel.check()?;
        let started = Instant::now();

        let table = match self.input {
            InputKind::Measurements => {
                let mut aggregator = PartialAggregator::new();
                MeasurementReader::with_mmap(self.use_mmap).read_into(
                    path,
                    self.format,
                    &mut aggregator,
                )?;
                aggregator.finish()
            }
            InputKind::Aggregates => AggregateReader::new().read_table(path, self.format)?,
        };

        if self.settings.profiling_enabled() {
            info!(
                "Profile: {} -> {} station(s), {} row(s) in {}",
                path.display(),
                table.len(),
                table.total_count(),
                format_elapsed(started.elapsed())
            );
        }
        progress.increment(1);
        Ok(table)
    }

    fn scan_stdin(&self) -> Result<ScanReport> {
        if self.format != FileFormat::Csv || self.input != InputKind::Measurements {
            return Err(ProcessingError::UnsupportedFormat {
                kind: "stdin input",
                value: self.format.to_string(),
            });
        }

        let progress =
            ProgressReporter::new_spinner("Reading <stdin>", !self.settings.progress_enabled(false));
        let mut aggregator = PartialAggregator::new();
        let stdin = std::io::stdin();
        let rows = MeasurementReader::new().read_stream(stdin.lock(), "<stdin>", &mut aggregator)?;
        progress.finish_with_message(&format!("Read {} rows", rows));

        Ok(ScanReport {
            table: aggregator.finish(),
            scanned: vec![PathBuf::from(STREAM_PATH)],
            failed: Vec::new(),
        })
    }
}

/// Expand a file glob into a sorted list of regular files.
pub fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in glob::glob(pattern)? {
        let path = entry?;
        if path.is_file() {
            paths.push(path);
        }
    }

    if paths.is_empty() {
        return Err(ProcessingError::NoMatchingFiles(pattern.to_string()));
    }

    paths.sort();
    Ok(paths)
}

type Outcomes = (Vec<AggregateTable>, Vec<PathBuf>, Vec<PathBuf>);

/// Split per-file results into tables, scanned and failed paths.
///
/// Cancellation aborts the whole scan instead of marking a partition absent.
fn collect_outcomes<I>(outcomes: I) -> Result<Outcomes>
where
    I: IntoIterator<Item = (PathBuf, Result<AggregateTable>)>,
{
    let mut tables = Vec::new();
    let mut scanned = Vec::new();
    let mut failed = Vec::new();

    for (path, outcome) in outcomes {
        match outcome {
            Ok(table) => {
                tables.push(table);
                scanned.push(path);
            }
            Err(ProcessingError::Cancelled) => return Err(ProcessingError::Cancelled),
            Err(e) => {
                error!("Failed to scan {}: {}", path.display(), e);
                failed.push(path);
            }
        }
    }

    Ok((tables, scanned, failed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_partitions(dir: &TempDir, contents: &[&str]) -> String {
        for (i, content) in contents.iter().enumerate() {
            fs::write(dir.path().join(format!("measurements-{}.csv", i)), content).unwrap();
        }
        dir.path().join("measurements-*.csv").display().to_string()
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("basic".parse::<Strategy>().unwrap(), Strategy::Basic);
        assert_eq!("Partitioned".parse::<Strategy>().unwrap(), Strategy::Partitioned);
        assert!("polars".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_strategies_agree() {
        let dir = TempDir::new().unwrap();
        let pattern = write_partitions(
            &dir,
            &["A;1.0\nB;2.0\nA;3.0\n", "B;-4.0\nC;10.0\n", "A;5.5\n"],
        );

        let basic = Strategy::Basic.scan(&pattern).unwrap();
        let partitioned = Strategy::Partitioned.scan(&pattern).unwrap();

        let mapped = ParallelProcessor::new(Strategy::Partitioned)
            .with_mmap(true)
            .scan(&pattern)
            .unwrap()
            .table;

        assert_eq!(basic.rows(), partitioned.rows());
        assert_eq!(basic.rows(), mapped.rows());
        assert_eq!(basic.get("A").unwrap().count, 3);
        assert_eq!(basic.get("B").unwrap().min, -4.0);
    }

    #[test]
    fn test_no_matching_files() {
        let dir = TempDir::new().unwrap();
        let pattern = dir.path().join("*.csv").display().to_string();

        let err = Strategy::Basic.scan(&pattern).unwrap_err();
        assert!(matches!(err, ProcessingError::NoMatchingFiles(_)));
    }

    #[test]
    fn test_failed_partition_requires_allow_partial() {
        let dir = TempDir::new().unwrap();
        let pattern = write_partitions(&dir, &["A;1.0\n", "A;oops\n", "B;2.0\n"]);

        for strategy in Strategy::ALL {
            let err = ParallelProcessor::new(strategy)
                .scan(&pattern)
                .unwrap_err();
            assert!(matches!(
                err,
                ProcessingError::IncompleteCoverage { failed: 1, total: 3 }
            ));

            let report = ParallelProcessor::new(strategy)
                .with_allow_partial(true)
                .scan(&pattern)
                .unwrap();
            assert!(!report.is_complete());
            assert_eq!(report.scanned.len(), 2);
            assert_eq!(report.failed, vec![dir.path().join("measurements-1.csv")]);
            assert_eq!(report.table.get("A").unwrap().count, 1);
        }
    }

    #[test]
    fn test_cancelled_scan() {
        let dir = TempDir::new().unwrap();
        let pattern = write_partitions(&dir, &["A;1.0\n", "B;2.0\n"]);
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = ParallelProcessor::new(Strategy::Partitioned)
            .with_cancel_token(cancel)
            .with_allow_partial(true)
            .scan(&pattern)
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Cancelled));
    }

    #[test]
    fn test_merge_published_partials() {
        let dir = TempDir::new().unwrap();
        let header = "station_name,station_count,temp_min,temp_max,temp_mean\n";
        fs::write(dir.path().join("part-0.csv"), format!("{header}Y,10,5.0,15.0,10.0\n")).unwrap();
        fs::write(dir.path().join("part-1.csv"), format!("{header}Y,10,5.0,15.0,10.0\n")).unwrap();
        let pattern = dir.path().join("part-*.csv").display().to_string();

        let report = ParallelProcessor::new(Strategy::Partitioned)
            .with_input(InputKind::Aggregates)
            .scan(&pattern)
            .unwrap();

        let y = report.table.get("Y").unwrap();
        assert_eq!(y.count, 20);
        assert_eq!(y.sum, 200.0);
        assert_eq!(y.mean(), Some(10.0));
    }

    #[test]
    fn test_threads_setting_is_validated() {
        let dir = TempDir::new().unwrap();
        let pattern = write_partitions(&dir, &["A;1.0\n"]);
        let none: &[&str] = &[];

        let settings = QuerySettings::parse(&["threads=0"], none).unwrap();
        let err = ParallelProcessor::new(Strategy::Partitioned)
            .with_settings(settings)
            .scan(&pattern)
            .unwrap_err();
        assert!(matches!(err, ProcessingError::InvalidParameter { .. }));

        let settings = QuerySettings::parse(&["threads=2"], &["enable_profiling"]).unwrap();
        let report = ParallelProcessor::new(Strategy::Partitioned)
            .with_settings(settings)
            .scan(&pattern)
            .unwrap();
        assert_eq!(report.table.total_count(), 1);
    }
}
