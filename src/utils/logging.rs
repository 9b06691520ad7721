use crate::config::LogConfig;
use crate::error::{ProcessingError, Result};
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStyle {
    Default,
    Compact,
}

impl FromStr for LogStyle {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "default" => Ok(LogStyle::Default),
            "compact" => Ok(LogStyle::Compact),
            _ => Err(ProcessingError::UnsupportedFormat {
                kind: "log style",
                value: s.to_string(),
            }),
        }
    }
}

/// Parse a level name; `warning` and `critical` are accepted as aliases.
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    match level.to_lowercase().as_str() {
        "warning" => Ok(LevelFilter::WARN),
        "critical" => Ok(LevelFilter::ERROR),
        other => LevelFilter::from_str(other)
            .map_err(|_| ProcessingError::invalid_parameter("log.level", level.to_string())),
    }
}

/// Install the global subscriber. Logs go to stderr unless `log_file` is set.
pub fn init_logging(config: &LogConfig, verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let mut level = parse_level(&config.level)?;
    if verbose && level < LevelFilter::INFO {
        level = LevelFilter::INFO;
    }
    let style: LogStyle = config.style.parse()?;

    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    let result = match (log_file, style) {
        (Some(path), style) => {
            let file = File::create(path).map_err(|e| ProcessingError::file_access(path, e))?;
            let builder = builder.with_ansi(false).with_writer(Mutex::new(file));
            match style {
                LogStyle::Default => builder.try_init(),
                LogStyle::Compact => builder.compact().try_init(),
            }
        }
        (None, LogStyle::Default) => builder.with_writer(std::io::stderr).try_init(),
        (None, LogStyle::Compact) => builder.with_writer(std::io::stderr).compact().try_init(),
    };

    result.map_err(|e| ProcessingError::invalid_parameter("log", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_aliases() {
        assert_eq!(parse_level("warning").unwrap(), LevelFilter::WARN);
        assert_eq!(parse_level("WARNING").unwrap(), LevelFilter::WARN);
        assert_eq!(parse_level("critical").unwrap(), LevelFilter::ERROR);
        assert_eq!(parse_level("debug").unwrap(), LevelFilter::DEBUG);
        assert!(parse_level("chatty").is_err());
    }

    #[test]
    fn test_log_style() {
        assert_eq!("Default".parse::<LogStyle>().unwrap(), LogStyle::Default);
        assert_eq!("compact".parse::<LogStyle>().unwrap(), LogStyle::Compact);
        assert!("rainbow".parse::<LogStyle>().is_err());
    }
}
