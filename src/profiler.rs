use log::info;
use std::time::{Duration, Instant};

/// Logs the start and duration of named program steps.
pub struct Profiler {
    start_time: Instant,
    curr: Option<Step>,
}

struct Step {
    start_time: Instant,
    name: String,
}

fn seconds(elapsed: Duration) -> f64 {
    elapsed.as_secs() as f64 + elapsed.subsec_millis() as f64 / 1_000.0
}

impl Profiler {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            curr: None,
        }
    }

    pub fn step(&mut self, step_name: &str) {
        self.finish();
        info!("{} - START", step_name);
        self.curr = Some(Step {
            start_time: Instant::now(),
            name: step_name.to_string(),
        });
    }

    pub fn finish(&mut self) {
        if let Some(ref step) = self.curr {
            info!("{} - STOP {:.3} s", step.name, seconds(step.start_time.elapsed()));
        }
        self.curr = None
    }

    /// Time since the profiler was created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Drop for Profiler {
    fn drop(&mut self) {
        self.finish();
        info!("TOTAL - {:.3} s", seconds(self.elapsed()));
    }
}
