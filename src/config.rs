use crate::error::{ProcessingError, Result};
use crate::utils::constants::{DEFAULT_FILES, DEFAULT_SAMPLES, DEFAULT_STDEV, ENV_PREFIX};
use config::{Config, Environment};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub style: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BuildConfig {
    pub samples: u64,
    pub files: u32,
    pub stdev: f64,
}

/// Runtime configuration: built-in defaults overlaid by `ONETRC_*`
/// environment variables (`ONETRC_LOG_LEVEL`, `ONETRC_BUILD_STDEV`, ...).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    pub log: LogConfig,
    pub build: BuildConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_environment(Environment::with_prefix(ENV_PREFIX))
    }

    /// Same as [`AppConfig::from_env`] but reading from an explicit map
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::from_environment(Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
    }

    fn from_environment(environment: Environment) -> Result<Self> {
        let config = Config::builder()
            .set_default("log.level", "warning")?
            .set_default("log.style", "default")?
            .set_default("build.samples", DEFAULT_SAMPLES as i64)?
            .set_default("build.files", DEFAULT_FILES as i64)?
            .set_default("build.stdev", DEFAULT_STDEV)?
            .add_source(environment.separator("_").try_parsing(true))
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<()> {
        if !self.build.stdev.is_finite() || self.build.stdev < 0.0 {
            return Err(ProcessingError::invalid_parameter(
                "ONETRC_BUILD_STDEV",
                format!("must be a finite value >= 0, got {}", self.build.stdev),
            ));
        }
        if self.build.files == 0 {
            return Err(ProcessingError::invalid_parameter(
                "ONETRC_BUILD_FILES",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_vars(HashMap::new()).unwrap();

        assert_eq!(config.log.level, "warning");
        assert_eq!(config.log.style, "default");
        assert_eq!(config.build.samples, 10_000_000);
        assert_eq!(config.build.files, 1);
        assert_eq!(config.build.stdev, 10.0);
    }

    #[test]
    fn test_environment_overrides() {
        let config = AppConfig::from_vars(vars(&[
            ("ONETRC_LOG_LEVEL", "debug"),
            ("ONETRC_BUILD_SAMPLES", "2500"),
            ("ONETRC_BUILD_FILES", "4"),
            ("ONETRC_BUILD_STDEV", "2.5"),
        ]))
        .unwrap();

        assert_eq!(config.log.level, "debug");
        assert_eq!(config.build.samples, 2500);
        assert_eq!(config.build.files, 4);
        assert_eq!(config.build.stdev, 2.5);
    }

    #[test]
    fn test_invalid_environment_values() {
        assert!(AppConfig::from_vars(vars(&[("ONETRC_BUILD_STDEV", "-1")])).is_err());
        assert!(AppConfig::from_vars(vars(&[("ONETRC_BUILD_FILES", "0")])).is_err());
        assert!(AppConfig::from_vars(vars(&[("ONETRC_BUILD_SAMPLES", "lots")])).is_err());
    }
}
