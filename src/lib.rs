#[macro_use]
extern crate error_chain;

pub mod bench;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod errors;
pub mod format;
pub mod profiler;
pub mod raster;
pub mod transfer;

pub use common::{ImageInfo, Pixel};

use bench::Report;
use config::{Config, DeviceKind, Strategy};
use device::{Device, HostDevice};
use dispatch::{Smoother, ThreadedSmoother, WideSmoother};
use errors::*;
use log::info;
use profiler::Profiler;
use raster::Raster;
use std::time::Duration;

fn smooth_threaded(
    config: &Config,
    input: &Raster,
    profiler: &mut Profiler,
) -> Result<(Duration, Raster)> {
    profiler.step("Starting worker threads");
    let mut smoother = ThreadedSmoother::new(input, config.threads)?;

    profiler.step("Running threaded smoothing");
    let elapsed = bench::run(&mut smoother, config.radius, config.iterations)?;
    Ok((elapsed, smoother.output()?))
}

fn smooth_on<D: Device>(
    device: &D,
    config: &Config,
    input: &Raster,
    profiler: &mut Profiler,
) -> Result<(Duration, Raster)> {
    profiler.step("Copying data to device");
    let mut smoother = WideSmoother::new(device, input, config.block_size)?;

    profiler.step("Running wide smoothing");
    let elapsed = bench::run(&mut smoother, config.radius, config.iterations)?;

    profiler.step("Copying data from device");
    Ok((elapsed, smoother.output()?))
}

fn smooth_wide(
    config: &Config,
    input: &Raster,
    profiler: &mut Profiler,
) -> Result<(Duration, Raster)> {
    match config.device {
        DeviceKind::Host => {
            let device = match config.device_memory {
                Some(bytes) => HostDevice::with_capacity(bytes),
                None => HostDevice::new(),
            };
            smooth_on(&device, config, input, profiler)
        }
        #[cfg(feature = "cuda")]
        DeviceKind::Cuda => {
            profiler.step("Initializing CUDA device");
            let device = device::CudaDevice::new(0)?;
            smooth_on(&device, config, input, profiler)
        }
        #[cfg(not(feature = "cuda"))]
        DeviceKind::Cuda => bail!(ErrorKind::DeviceUnavailable("cuda".into())),
    }
}

/// Reads the input image, smooths it `config.iterations` times with the
/// configured strategy and writes the result.
pub fn run(config: &Config) -> Result<Report> {
    config.validate()?;
    let mut profiler = Profiler::new();

    profiler.step("Reading input image");
    let (header, input) = format::load(&config.input)?;
    info!("Image size: {}×{}", input.width(), input.height());
    info!("Radius: {}", config.radius);

    let mut phases = Vec::new();
    let output = match config.strategy {
        Strategy::Threaded => {
            let (elapsed, output) = smooth_threaded(config, &input, &mut profiler)?;
            phases.push(("threaded", elapsed));
            output
        }
        Strategy::Wide => {
            let (elapsed, output) = smooth_wide(config, &input, &mut profiler)?;
            phases.push(("wide", elapsed));
            output
        }
        Strategy::Compare => {
            let (threaded_elapsed, threaded) = smooth_threaded(config, &input, &mut profiler)?;
            phases.push(("threaded", threaded_elapsed));
            let (wide_elapsed, wide) = smooth_wide(config, &input, &mut profiler)?;
            phases.push(("wide", wide_elapsed));

            profiler.step("Comparing outputs");
            if let Some(idx) = threaded.first_difference(&wide) {
                bail!(ErrorKind::OutputMismatch(idx));
            }
            threaded
        }
    };
    profiler.step("Saving image");
    format::save(&config.output, &header, &output)?;
    profiler.finish();

    Ok(Report {
        phases,
        total: profiler.elapsed(),
    })
}
