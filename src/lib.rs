pub mod cli;
pub mod config;
pub mod error;
pub mod generators;
pub mod models;
pub mod processors;
pub mod query;
pub mod readers;
pub mod utils;
pub mod writers;

pub use error::{ProcessingError, Result};
