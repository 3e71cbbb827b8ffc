//! Repeated dispatch and the timing report.

use crate::dispatch::Smoother;
use crate::errors::*;
use log::debug;
use std::fmt;
use std::time::{Duration, Instant};

pub const DEFAULT_ITERATIONS: usize = 100;

/// Runs `iterations` passes of `smoother` and returns their wall-clock time.
///
/// Each pass recomputes the whole output from the unchanged input, so the
/// result after any number of passes equals the result after one.
pub fn run<S: Smoother + ?Sized>(smoother: &mut S, radius: usize, iterations: usize) -> Result<Duration> {
    if iterations == 0 {
        bail!(ErrorKind::InvalidConfig("at least one iteration is required".into()));
    }

    let pixels = smoother.info().len() as f64;
    let start = Instant::now();
    for iteration in 0..iterations {
        let pass = Instant::now();
        smoother
            .smooth(radius)
            .chain_err(|| format!("Error in {} pass {} of {}", smoother.name(), iteration + 1, iterations))?;
        let elapsed = pass.elapsed();
        debug!(
            "{} pass {}: {:.3} ms, {:.1} Mpx/s",
            smoother.name(),
            iteration + 1,
            elapsed.as_secs_f64() * 1_000.0,
            pixels / elapsed.as_secs_f64().max(1e-9) / 1e6
        );
    }

    Ok(start.elapsed())
}

/// Dispatch-phase and whole-program durations, printed in whole seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub phases: Vec<(&'static str, Duration)>,
    pub total: Duration,
}

fn whole_seconds(elapsed: Duration) -> f64 {
    elapsed.as_secs() as f64
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.phases.as_slice() {
            [(_, elapsed)] => {
                writeln!(f, "Algorithm time: {:.2} sec.", whole_seconds(*elapsed))?;
            }
            phases => {
                for (name, elapsed) in phases {
                    writeln!(f, "Algorithm time ({}): {:.2} sec.", name, whole_seconds(*elapsed))?;
                }
            }
        }
        writeln!(f, "Total time: {:.2} sec.", whole_seconds(self.total))
    }
}
