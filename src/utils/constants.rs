/// Generated file naming
pub const MEASUREMENTS_PREFIX: &str = "measurements";

/// Row encoding of delimited measurement files
pub const MEASUREMENT_DELIMITER: char = ';';

/// Column names shared by every aggregate encoding
pub const COL_STATION_NAME: &str = "station_name";
pub const COL_TEMPERATURE: &str = "temperature";
pub const COL_STATION_COUNT: &str = "station_count";
pub const COL_TEMP_MIN: &str = "temp_min";
pub const COL_TEMP_MAX: &str = "temp_max";
pub const COL_TEMP_MEAN: &str = "temp_mean";

/// Generation defaults
pub const DEFAULT_SAMPLES: u64 = 10_000_000;
pub const DEFAULT_FILES: u32 = 1;
pub const DEFAULT_STDEV: f64 = 10.0;

/// Processing defaults
pub const DEFAULT_BATCH_SIZE: usize = 64 * 1024;
pub const DEFAULT_ROW_GROUP_SIZE: usize = 1024 * 1024;
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB

/// Rows between progress/cancellation checks while writing a partition
pub const PROGRESS_INTERVAL: u64 = 100_000;

/// Environment variable prefix for configuration
pub const ENV_PREFIX: &str = "ONETRC";

/// Path naming the process's standard input or output
pub const STREAM_PATH: &str = "-";
