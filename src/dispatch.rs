//! Parallel dispatch of the smoothing kernel.
//!
//! Both strategies evaluate `common::kernel::smooth_pixel` once per output
//! pixel, so their results are identical bit for bit; they differ only in
//! how the pixel grid is split across execution units.

use crate::device::{Device, LaunchConfig};
use crate::errors::*;
use crate::raster::Raster;
use crate::transfer::DeviceImage;
use common::kernel::smooth_pixel;
use common::ImageInfo;
use log::info;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

pub const DEFAULT_WORKERS: usize = 4;

fn ceil_div(x: usize, y: usize) -> usize {
    let mut n = x / y;
    if x % y != 0 {
        n += 1;
    }
    n
}

/// Chooses a one-dimensional launch covering `work` pixels.
///
/// The block is the device maximum, or `requested` clamped to it, and never
/// larger than the work itself. The grid is rounded up, so the last block may
/// contain threads past the end of the image.
pub fn partition_work<D: Device>(
    device: &D,
    work: usize,
    requested: Option<u32>,
) -> Result<LaunchConfig> {
    info!("Work size: {} items", work);

    let max_threads_per_block = device.max_threads_per_block()?;
    info!("Max threads per block: {} threads", max_threads_per_block);
    if max_threads_per_block == 0 {
        bail!(ErrorKind::InvalidConfig(format!(
            "device '{}' reports no threads per block",
            device.name()
        )));
    }

    let mut block = match requested {
        Some(0) => bail!(ErrorKind::InvalidConfig("block size must be positive".into())),
        Some(requested) => requested.min(max_threads_per_block),
        None => max_threads_per_block,
    };
    if (block as usize) > work {
        block = work.max(1) as u32;
    }

    let grid = ceil_div(work, block as usize);
    if grid > u32::MAX as usize {
        bail!(ErrorKind::InvalidConfig(format!(
            "{} blocks exceed the launch grid limit",
            grid
        )));
    }
    let config = LaunchConfig {
        grid: grid as u32,
        block,
    };

    info!("Block size: {} threads", config.block);
    info!("Grid size: {} blocks", config.grid);
    info!(
        "Threads per block: {} threads ({:.2}%)",
        config.block,
        config.block as f32 / max_threads_per_block as f32 * 100.
    );

    Ok(config)
}

/// A way of running complete smoothing passes over one image.
pub trait Smoother {
    fn name(&self) -> &'static str;

    fn info(&self) -> ImageInfo;

    /// One full pass from the input to the output. Returns after every output
    /// pixel has been written.
    fn smooth(&mut self, radius: usize) -> Result<()>;

    /// The output of the latest pass, copied to the host.
    fn output(&self) -> Result<Raster>;
}

/// Host threads, each owning a contiguous range of output rows.
pub struct ThreadedSmoother<'a> {
    pool: ThreadPool,
    workers: usize,
    input: &'a Raster,
    output: Raster,
}

impl<'a> ThreadedSmoother<'a> {
    pub fn new(input: &'a Raster, workers: usize) -> Result<Self> {
        if workers == 0 {
            bail!(ErrorKind::InvalidConfig("at least one worker is required".into()));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|idx| format!("smooth-worker-{}", idx))
            .build()
            .chain_err(|| "Error starting worker threads")?;
        let output = Raster::new(input.width(), input.height())?;
        info!("Workers: {}", workers);

        Ok(Self {
            pool,
            workers,
            input,
            output,
        })
    }

    pub fn rows_per_worker(&self) -> usize {
        ceil_div(self.input.height(), self.workers)
    }
}

impl<'a> Smoother for ThreadedSmoother<'a> {
    fn name(&self) -> &'static str {
        "threaded"
    }

    fn info(&self) -> ImageInfo {
        self.input.info()
    }

    fn smooth(&mut self, radius: usize) -> Result<()> {
        let info = self.input.info();
        if info.is_empty() {
            return Ok(());
        }

        let rows = self.rows_per_worker();
        let chunk = rows * info.width;
        let input = self.input.pixels();
        let output = &mut self.output;
        self.pool.install(|| {
            output
                .pixels_mut()
                .par_chunks_mut(chunk)
                .enumerate()
                .for_each(|(worker, out)| {
                    let first = worker * chunk;
                    for (offset, pixel) in out.iter_mut().enumerate() {
                        if let Some(smoothed) = smooth_pixel(input, &info, radius, first + offset) {
                            *pixel = smoothed;
                        }
                    }
                });
        });

        Ok(())
    }

    fn output(&self) -> Result<Raster> {
        Ok(self.output.clone())
    }
}

/// One device thread per pixel.
pub struct WideSmoother<'d, D: Device> {
    image: DeviceImage<'d, D>,
    launch: LaunchConfig,
}

impl<'d, D: Device> WideSmoother<'d, D> {
    /// Stages `input` on `device` and sizes the launch grid for it.
    pub fn new(device: &'d D, input: &Raster, block_size: Option<u32>) -> Result<Self> {
        let image = DeviceImage::stage(device, input)?;
        let launch = partition_work(device, input.len(), block_size)?;
        Ok(Self { image, launch })
    }
}

impl<'d, D: Device> Smoother for WideSmoother<'d, D> {
    fn name(&self) -> &'static str {
        "wide"
    }

    fn info(&self) -> ImageInfo {
        self.image.info()
    }

    fn smooth(&mut self, radius: usize) -> Result<()> {
        if self.image.info().is_empty() {
            return Ok(());
        }
        self.image.dispatch(radius, self.launch)
    }

    fn output(&self) -> Result<Raster> {
        let info = self.image.info();
        let mut raster = Raster::new(info.width, info.height)?;
        self.image.retrieve(&mut raster)?;
        Ok(raster)
    }
}
