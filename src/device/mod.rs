//! Execution devices for the wide strategy.
//!
//! A device owns its buffers: a [`Device::Buffer`] has no host-side view of
//! its pixels, so the only way to read device memory from the host is
//! [`Device::download`]. Buffers release their memory when dropped.

pub mod host;
#[cfg(feature = "cuda")]
pub mod cuda;

pub use self::host::HostDevice;
#[cfg(feature = "cuda")]
pub use self::cuda::CudaDevice;

use crate::errors::*;
use common::{ImageInfo, Pixel};

/// Geometry of a one-dimensional kernel launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Blocks in the grid.
    pub grid: u32,
    /// Threads per block.
    pub block: u32,
}

impl LaunchConfig {
    pub fn threads(&self) -> u64 {
        self.grid as u64 * self.block as u64
    }
}

pub trait Device {
    type Buffer;

    fn name(&self) -> String;

    /// Largest block the smoothing kernel can be launched with.
    fn max_threads_per_block(&self) -> Result<u32>;

    /// Allocates room for `len` pixels in device memory.
    fn allocate(&self, len: usize) -> Result<Self::Buffer>;

    fn upload(&self, src: &[Pixel], dst: &mut Self::Buffer) -> Result<()>;

    fn download(&self, src: &Self::Buffer, dst: &mut [Pixel]) -> Result<()>;

    /// Runs the smoothing kernel over `config`, one thread per output pixel,
    /// and blocks until every thread has finished.
    fn launch(
        &self,
        input: &Self::Buffer,
        output: &mut Self::Buffer,
        info: ImageInfo,
        radius: usize,
        config: LaunchConfig,
    ) -> Result<()>;
}

/// Checks that `config` covers every pixel of `info` with buffers of `len` pixels.
pub(crate) fn check_launch(info: &ImageInfo, len: usize, config: &LaunchConfig) -> Result<()> {
    if len != info.len() {
        bail!(ErrorKind::PixelCount(len, info.len()));
    }
    if config.block == 0 {
        bail!(ErrorKind::InvalidConfig("block size must be positive".into()));
    }
    if config.threads() < info.len() as u64 {
        bail!(ErrorKind::InvalidConfig(format!(
            "launch of {} threads cannot cover {} pixels",
            config.threads(),
            info.len()
        )));
    }
    Ok(())
}
