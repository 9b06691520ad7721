use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    #[error("Unsupported {kind}: '{value}'")]
    UnsupportedFormat { kind: &'static str, value: String },

    #[error("Malformed record in {source_name} at line {line}: {message}")]
    MalformedRecord {
        source_name: String,
        line: u64,
        message: String,
    },

    #[error("Cannot access '{}': {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No files match pattern '{0}'")]
    NoMatchingFiles(String),

    #[error("{failed} of {total} partitions failed; rerun with --allow-partial to accept incomplete coverage")]
    IncompleteCoverage { failed: usize, total: usize },

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Processing cancelled by user")]
    Cancelled,

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl ProcessingError {
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn malformed(source_name: impl Into<String>, line: u64, message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            source_name: source_name.into(),
            line,
            message: message.into(),
        }
    }

    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileAccess {
            path: path.into(),
            source,
        }
    }

    /// Process exit status reported for this error kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidParameter { .. } | Self::Validation(_) | Self::Pattern(_) => 2,
            Self::UnsupportedFormat { .. } => 3,
            Self::MalformedRecord { .. } | Self::Csv(_) | Self::Json(_) => 4,
            Self::FileAccess { .. } | Self::Io(_) | Self::NoMatchingFiles(_) => 5,
            Self::Parquet(_) | Self::Arrow(_) => 6,
            Self::IncompleteCoverage { .. } => 7,
            Self::Config(_) => 8,
            Self::Cancelled => 130,
            Self::TaskJoin(_) => 1,
        }
    }
}

impl From<glob::GlobError> for ProcessingError {
    fn from(err: glob::GlobError) -> Self {
        let path = err.path().to_path_buf();
        Self::file_access(path, err.into())
    }
}
