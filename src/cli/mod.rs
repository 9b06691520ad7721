pub mod args;
pub mod commands;

pub use args::{BuildArgs, Cli, Commands, RunArgs};
pub use commands::run;
