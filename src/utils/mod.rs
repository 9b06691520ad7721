pub mod cancel;
pub mod constants;
pub mod filename;
pub mod logging;
pub mod progress;
pub mod timer;

pub use cancel::CancelToken;
pub use constants::*;
pub use filename::{partition_file_name, partition_path};
pub use progress::ProgressReporter;
pub use timer::RunTimer;
