use crate::error::{ProcessingError, Result};
use crate::models::{MeasurementRecord, StationCatalog, StationProfile};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Chooses which catalog entry the next row is drawn from.
pub trait StationSelector {
    fn select<R: Rng + ?Sized>(&mut self, rng: &mut R, len: usize) -> usize;
}

/// Every entry equally likely on every draw (sampling with replacement).
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformSelector;

impl StationSelector for UniformSelector {
    fn select<R: Rng + ?Sized>(&mut self, rng: &mut R, len: usize) -> usize {
        rng.random_range(0..len)
    }
}

/// Lazily draws `rows` measurements from a catalog.
///
/// Each row picks a station and adds `Normal(0, stdev)` noise to its
/// baseline. Nothing beyond the current row is held in memory.
pub struct Sampler<'a, R, S = UniformSelector> {
    catalog: &'a StationCatalog,
    noise: Normal<f64>,
    rng: R,
    selector: S,
    remaining: u64,
}

impl<'a, R: Rng> Sampler<'a, R> {
    pub fn new(catalog: &'a StationCatalog, rows: u64, stdev: f64, rng: R) -> Result<Self> {
        if catalog.is_empty() {
            return Err(ProcessingError::invalid_parameter(
                "catalog",
                "cannot sample from an empty catalog",
            ));
        }

        if !stdev.is_finite() || stdev < 0.0 {
            return Err(ProcessingError::invalid_parameter(
                "stdev",
                format!("must be a finite value >= 0, got {}", stdev),
            ));
        }

        let noise = Normal::new(0.0, stdev)
            .map_err(|e| ProcessingError::invalid_parameter("stdev", e.to_string()))?;

        Ok(Self {
            catalog,
            noise,
            rng,
            selector: UniformSelector,
            remaining: rows,
        })
    }
}

impl<'a, R: Rng, S: StationSelector> Sampler<'a, R, S> {
    pub fn with_selector<T: StationSelector>(self, selector: T) -> Sampler<'a, R, T> {
        Sampler {
            catalog: self.catalog,
            noise: self.noise,
            rng: self.rng,
            selector,
            remaining: self.remaining,
        }
    }

    /// Draw the next row without allocating a record.
    pub fn next_sample(&mut self) -> Option<(&'a StationProfile, f64)> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let index = self.selector.select(&mut self.rng, self.catalog.len());
        let station = self.catalog.get(index)?;
        let value = station.baseline + self.noise.sample(&mut self.rng);

        Some((station, value))
    }
}

impl<R: Rng, S: StationSelector> Iterator for Sampler<'_, R, S> {
    type Item = MeasurementRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_sample()
            .map(|(station, value)| MeasurementRecord::new(station.name.clone(), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

/// One independent seed per partition, drawn from a master generator.
///
/// With a fixed master seed the same partition index always receives the
/// same seed, so any single partition can be regenerated on its own.
pub fn partition_seeds(master_seed: Option<u64>, partitions: usize) -> Vec<u64> {
    let mut master = match master_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    (0..partitions).map(|_| master.next_u64()).collect()
}
