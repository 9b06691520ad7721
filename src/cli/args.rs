use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "onetrc")]
#[command(about = "One Trillion Row Challenge: build measurement data and run aggregations")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create measurement data
    Build(BuildArgs),

    /// Run an aggregation strategy over measurement files
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    #[arg(short, long = "output", default_value = ".", help = "Output directory")]
    pub output_dir: PathBuf,

    #[arg(short, long, default_value = "csv", help = "Either csv or parquet")]
    pub format: String,

    #[arg(short, long, help = "Write all data to <stdout> instead")]
    pub stream_output: bool,

    #[arg(short = 'n', long, help = "Rows per output file [default: ONETRC_BUILD_SAMPLES or 10M]")]
    pub num_samples: Option<u64>,

    #[arg(short = 'N', long, help = "Number of output files [default: ONETRC_BUILD_FILES or 1]")]
    pub num_files: Option<u32>,

    #[arg(long, help = "Noise standard deviation [default: ONETRC_BUILD_STDEV or 10.0]")]
    pub stdev: Option<f64>,

    #[arg(long, help = "Seed for reproducible output")]
    pub seed: Option<u64>,

    #[arg(long, help = "Station catalog file with 'name;baseline' rows")]
    pub stations: Option<PathBuf>,

    #[arg(short, long, help = "Show progress bar")]
    pub progress: bool,

    #[arg(short, long, default_value = "snappy", help = "Parquet compression codec")]
    pub compression: String,

    #[arg(long, default_value_t = num_cpus::get())]
    pub max_workers: usize,
}

#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("print_format").args(["format", "csv", "json", "parquet"])))]
pub struct RunArgs {
    #[arg(help = "Aggregation strategy (basic, partitioned)")]
    pub strategy: String,

    #[arg(help = "File glob of input partitions, or '-' for stdin")]
    pub filepattern: String,

    #[arg(short = 'p', long, help = "Input files are Parquet")]
    pub from_parquet: bool,

    #[arg(long, help = "Input files hold published per-station results")]
    pub merge: bool,

    #[arg(short, long, default_value = "normal", help = "normal, csv, json or parquet")]
    pub format: String,

    #[arg(long, help = "Same as --format csv")]
    pub csv: bool,

    #[arg(long, help = "Same as --format json")]
    pub json: bool,

    #[arg(long, help = "Same as --format parquet")]
    pub parquet: bool,

    #[arg(short, long, default_value = "-", help = "Output path ('-' for stdout)")]
    pub output: String,

    #[arg(short = 's', long = "set", value_name = "KEY=VALUE", num_args = 1..)]
    pub settings: Vec<String>,

    #[arg(long = "pragma", value_name = "NAME", num_args = 1..)]
    pub pragmas: Vec<String>,

    #[arg(long, help = "Accept a result with missing partitions")]
    pub allow_partial: bool,

    #[arg(long, default_value_t = num_cpus::get())]
    pub max_workers: usize,
}

impl RunArgs {
    /// Print format after applying the `--csv/--json/--parquet` shorthands.
    pub fn print_format(&self) -> &str {
        if self.csv {
            "csv"
        } else if self.json {
            "json"
        } else if self.parquet {
            "parquet"
        } else {
            &self.format
        }
    }
}
