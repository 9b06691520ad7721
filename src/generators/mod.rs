pub mod sampler;

pub use sampler::{partition_seeds, Sampler, StationSelector, UniformSelector};
