//! A device emulated on the host.
//!
//! Launches run on the rayon global pool one block at a time per worker,
//! with the same thread-id mapping and bounds check as the PTX kernel.

use super::{check_launch, Device, LaunchConfig};
use crate::errors::*;
use crate::raster::PIXEL_SIZE;
use common::kernel::{global_index, smooth_pixel};
use common::{ImageInfo, Pixel};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const DEFAULT_MAX_THREADS_PER_BLOCK: u32 = 1024;

#[derive(Debug)]
pub struct HostDevice {
    max_threads_per_block: u32,
    capacity: usize,
    allocated: Arc<AtomicUsize>,
}

/// Device memory of a [`HostDevice`].
#[derive(Debug)]
pub struct HostBuffer {
    pixels: Vec<Pixel>,
    ledger: Arc<AtomicUsize>,
}

impl Drop for HostBuffer {
    fn drop(&mut self) {
        self.ledger
            .fetch_sub(self.pixels.len() * PIXEL_SIZE, Ordering::SeqCst);
    }
}

impl HostDevice {
    /// A device with unlimited memory.
    pub fn new() -> Self {
        Self::with_capacity(usize::MAX)
    }

    /// A device with `capacity` bytes of memory.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            max_threads_per_block: DEFAULT_MAX_THREADS_PER_BLOCK,
            capacity,
            allocated: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn max_threads(mut self, max_threads_per_block: u32) -> Self {
        self.max_threads_per_block = max_threads_per_block;
        self
    }

    /// Bytes currently held by live buffers.
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::SeqCst)
    }
}

impl Default for HostDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for HostDevice {
    type Buffer = HostBuffer;

    fn name(&self) -> String {
        "host".into()
    }

    fn max_threads_per_block(&self) -> Result<u32> {
        Ok(self.max_threads_per_block)
    }

    fn allocate(&self, len: usize) -> Result<HostBuffer> {
        let bytes = len
            .checked_mul(PIXEL_SIZE)
            .ok_or_else(|| Error::from(ErrorKind::Allocation("device buffer".into(), usize::MAX)))?;
        let capacity = self.capacity;
        self.allocated
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                used.checked_add(bytes).filter(|&total| total <= capacity)
            })
            .map_err(|_| ErrorKind::Allocation("device buffer".into(), bytes))?;

        let mut pixels = Vec::new();
        if pixels.try_reserve_exact(len).is_err() {
            self.allocated.fetch_sub(bytes, Ordering::SeqCst);
            bail!(ErrorKind::Allocation("device buffer".into(), bytes));
        }
        pixels.resize(len, Pixel::default());

        Ok(HostBuffer {
            pixels,
            ledger: Arc::clone(&self.allocated),
        })
    }

    fn upload(&self, src: &[Pixel], dst: &mut HostBuffer) -> Result<()> {
        if src.len() != dst.pixels.len() {
            bail!(ErrorKind::PixelCount(src.len(), dst.pixels.len()));
        }
        dst.pixels.copy_from_slice(src);
        Ok(())
    }

    fn download(&self, src: &HostBuffer, dst: &mut [Pixel]) -> Result<()> {
        if src.pixels.len() != dst.len() {
            bail!(ErrorKind::PixelCount(src.pixels.len(), dst.len()));
        }
        dst.copy_from_slice(&src.pixels);
        Ok(())
    }

    fn launch(
        &self,
        input: &HostBuffer,
        output: &mut HostBuffer,
        info: ImageInfo,
        radius: usize,
        config: LaunchConfig,
    ) -> Result<()> {
        check_launch(&info, input.pixels.len(), &config)?;
        check_launch(&info, output.pixels.len(), &config)?;
        if info.is_empty() {
            return Ok(());
        }

        let block_dim = config.block as usize;
        let input = &input.pixels[..];
        // threads of the last block that fall past the end of the image write nothing
        output
            .pixels
            .par_chunks_mut(block_dim)
            .enumerate()
            .for_each(|(block_idx, block)| {
                for thread_idx in 0..block_dim {
                    let idx = global_index(block_idx, block_dim, thread_idx);
                    if let Some(pixel) = smooth_pixel(input, &info, radius, idx) {
                        debug_assert!(thread_idx < block.len());
                        block[thread_idx] = pixel;
                    }
                }
            });

        Ok(())
    }
}
