use serde::{Deserialize, Serialize};

/// One sampled row: a station name and its temperature reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub station_name: String,
    pub temperature: f64,
}

impl MeasurementRecord {
    pub fn new(station_name: impl Into<String>, temperature: f64) -> Self {
        Self {
            station_name: station_name.into(),
            temperature,
        }
    }
}

/// Round to the single decimal digit used by every serialized encoding.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Rounded value ready for `{:.1}` rendering; negative zero becomes zero.
pub fn display_tenth(value: f64) -> f64 {
    let rounded = round_to_tenth(value);
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Render a value with exactly one digit after the decimal point.
pub fn format_tenth(value: f64) -> String {
    format!("{:.1}", display_tenth(value))
}
