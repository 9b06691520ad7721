use crate::error::{ProcessingError, Result};
use crate::models::builtin_stations::BUILTIN_STATIONS;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationProfile {
    pub name: String,
    pub baseline: f64,
}

impl StationProfile {
    pub fn new(name: impl Into<String>, baseline: f64) -> Self {
        Self {
            name: name.into(),
            baseline,
        }
    }
}

/// Immutable population of stations that samples are drawn from.
///
/// Cloning is cheap: every clone shares the same backing slice.
#[derive(Debug, Clone)]
pub struct StationCatalog {
    stations: Arc<[StationProfile]>,
}

impl StationCatalog {
    pub fn new(stations: Vec<StationProfile>) -> Result<Self> {
        if stations.is_empty() {
            return Err(ProcessingError::invalid_parameter(
                "catalog",
                "station catalog must contain at least one station",
            ));
        }

        if let Some(station) = stations.iter().find(|s| s.name.is_empty()) {
            return Err(ProcessingError::invalid_parameter(
                "catalog",
                format!("station with baseline {} has an empty name", station.baseline),
            ));
        }

        if let Some(station) = stations.iter().find(|s| !s.baseline.is_finite()) {
            return Err(ProcessingError::invalid_parameter(
                "catalog",
                format!("station '{}' has a non-finite baseline", station.name),
            ));
        }

        Ok(Self {
            stations: stations.into(),
        })
    }

    /// Catalog compiled into the binary
    pub fn builtin() -> Self {
        let stations: Vec<StationProfile> = BUILTIN_STATIONS
            .iter()
            .map(|(name, baseline)| StationProfile::new(*name, *baseline))
            .collect();

        Self {
            stations: stations.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StationProfile> {
        self.stations.get(index)
    }

    pub fn stations(&self) -> &[StationProfile] {
        &self.stations
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stations.iter().any(|s| s.name == name)
    }
}
