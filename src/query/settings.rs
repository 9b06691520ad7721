use crate::error::{ProcessingError, Result};
use tracing::debug;

const SETTING_THREADS: &str = "threads";
const PRAGMA_ENABLE_PROGRESS: &str = "enable_progress_bar";
const PRAGMA_DISABLE_PROGRESS: &str = "disable_progress_bar";
const PRAGMA_ENABLE_PROFILING: &str = "enable_profiling";

/// Engine settings and pragmas forwarded from the command line.
///
/// Values stay opaque strings. Only `threads` and the progress/profiling
/// pragmas are interpreted by the built-in scan; everything else is carried
/// through to [`QuerySettings::preamble`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySettings {
    settings: Vec<(String, String)>,
    pragmas: Vec<String>,
}

impl QuerySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `key=value` arguments and pragma names.
    ///
    /// Splits at the first `=`; a repeated key keeps its first position
    /// and its last value.
    pub fn parse<S, P>(settings: &[S], pragmas: &[P]) -> Result<Self>
    where
        S: AsRef<str>,
        P: AsRef<str>,
    {
        let mut parsed = Self::new();
        for arg in settings {
            let (key, value) = parse_setting(arg.as_ref())?;
            parsed.set(key, value);
        }
        for pragma in pragmas {
            parsed.add_pragma(pragma.as_ref())?;
        }
        Ok(parsed)
    }

    pub fn set(&mut self, key: &str, value: &str) {
        match self.settings.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.settings.push((key.to_string(), value.to_string())),
        }
    }

    pub fn add_pragma(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ProcessingError::invalid_parameter(
                "pragma",
                format!("expected an identifier, got '{}'", name),
            ));
        }
        self.pragmas.push(name.to_string());
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.settings
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pragmas(&self) -> &[String] {
        &self.pragmas
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty() && self.pragmas.is_empty()
    }

    /// `PRAGMA name;` lines followed by `SET key = value;` lines.
    pub fn preamble(&self) -> String {
        let pragmas = self.pragmas.iter().map(|p| format!("PRAGMA {};", p));
        let settings = self
            .settings
            .iter()
            .map(|(k, v)| format!("SET {} = {};", k, format_value(v)));
        pragmas.chain(settings).collect::<Vec<_>>().join("\n")
    }

    /// Worker threads requested with `threads=N`.
    pub fn threads(&self) -> Result<Option<usize>> {
        match self.get(SETTING_THREADS) {
            None => Ok(None),
            Some(value) => match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => Ok(Some(n)),
                _ => Err(ProcessingError::invalid_parameter(
                    SETTING_THREADS,
                    format!("expected a positive integer, got '{}'", value),
                )),
            },
        }
    }

    /// Progress bar state after applying the progress pragmas in order.
    pub fn progress_enabled(&self, default: bool) -> bool {
        self.pragmas.iter().fold(default, |enabled, pragma| match pragma.as_str() {
            PRAGMA_ENABLE_PROGRESS => true,
            PRAGMA_DISABLE_PROGRESS => false,
            _ => enabled,
        })
    }

    pub fn profiling_enabled(&self) -> bool {
        self.pragmas.iter().any(|p| p == PRAGMA_ENABLE_PROFILING)
    }

    /// Log the settings the built-in scan does not interpret.
    pub fn log_unapplied(&self) {
        for (key, value) in &self.settings {
            if key != SETTING_THREADS {
                debug!("Setting '{}' = {} has no effect on the built-in scan", key, format_value(value));
            }
        }
        for pragma in &self.pragmas {
            if ![PRAGMA_ENABLE_PROGRESS, PRAGMA_DISABLE_PROGRESS, PRAGMA_ENABLE_PROFILING]
                .contains(&pragma.as_str())
            {
                debug!("Pragma '{}' has no effect on the built-in scan", pragma);
            }
        }
    }
}

fn parse_setting(arg: &str) -> Result<(&str, &str)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() && !value.is_empty() => Ok((key.trim(), value)),
        _ => Err(ProcessingError::invalid_parameter(
            "setting",
            format!("expected KEY=VALUE, got '{}'", arg),
        )),
    }
}

/// Integers are rendered bare, anything else single-quoted.
pub fn format_value(value: &str) -> String {
    match value.trim().parse::<i64>() {
        Ok(n) => n.to_string(),
        Err(_) => format!("'{}'", value.replace('\'', "''")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value("8"), "8");
        assert_eq!(format_value("-3"), "-3");
        assert_eq!(format_value("007"), "7");
        assert_eq!(format_value("1.5"), "'1.5'");
        assert_eq!(format_value("4GB"), "'4GB'");
        assert_eq!(format_value("it's"), "'it''s'");
    }

    #[test]
    fn test_parse_and_preamble() {
        let settings = QuerySettings::parse(
            &["threads=4", "memory_limit=4GB", "threads=8", "path=a=b"],
            &["enable_profiling"],
        )
        .unwrap();

        assert_eq!(settings.get("threads"), Some("8"));
        assert_eq!(settings.get("path"), Some("a=b"));
        assert_eq!(
            settings.preamble(),
            "PRAGMA enable_profiling;\n\
             SET threads = 8;\n\
             SET memory_limit = '4GB';\n\
             SET path = 'a=b';"
        );
    }

    #[test]
    fn test_malformed_settings() {
        let none: &[&str] = &[];
        assert!(QuerySettings::parse(&["threads"], none).is_err());
        assert!(QuerySettings::parse(&["=4"], none).is_err());
        assert!(QuerySettings::parse(&["threads="], none).is_err());
        assert!(QuerySettings::parse(none, &["drop table"]).is_err());
        assert!(QuerySettings::parse(none, &[""]).is_err());
    }

    #[test]
    fn test_applied_settings() {
        let none: &[&str] = &[];
        let settings = QuerySettings::parse(
            &["threads=3"],
            &["enable_progress_bar", "disable_progress_bar", "enable_profiling"],
        )
        .unwrap();

        assert_eq!(settings.threads().unwrap(), Some(3));
        assert!(!settings.progress_enabled(true));
        assert!(settings.profiling_enabled());

        let bad = QuerySettings::parse(&["threads=many"], none).unwrap();
        assert!(bad.threads().is_err());
        assert_eq!(QuerySettings::new().threads().unwrap(), None);
        assert!(QuerySettings::new().progress_enabled(true));
    }
}
