pub mod settings;

pub use settings::{format_value, QuerySettings};
