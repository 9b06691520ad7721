use std::time::{Duration, Instant};
use tracing::info;

/// Logs the start of a run on creation and its duration when dropped,
/// so the timing is reported on error paths as well.
pub struct RunTimer {
    name: String,
    started: Instant,
}

impl RunTimer {
    pub fn start(name: &str, target: &str) -> Self {
        info!("Starting {} on '{}'", name, target);
        Self {
            name: name.to_string(),
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for RunTimer {
    fn drop(&mut self) {
        info!("Completed {} in {}", self.name, format_elapsed(self.elapsed()));
    }
}

/// `H:MM:SS.ffffff`
pub fn format_elapsed(elapsed: Duration) -> String {
    let duration = chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero());

    let hours = duration.num_hours();
    let minutes = duration.num_minutes() % 60;
    let seconds = duration.num_seconds() % 60;
    let micros = elapsed.subsec_micros();

    format!("{}:{:02}:{:02}.{:06}", hours, minutes, seconds, micros)
}
