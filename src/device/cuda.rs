//! CUDA device running the PTX build of the `kernel` crate.

use super::{check_launch, Device, LaunchConfig};
use crate::errors::*;
use crate::raster::PIXEL_SIZE;
use log::info;
use common::{ImageInfo, Pixel};
use rustacuda::context::{Context, ContextFlags};
use rustacuda::device::{Device as Gpu, DeviceAttribute};
use rustacuda::function::FunctionAttribute;
use rustacuda::launch;
use rustacuda::memory::{CopyDestination, DeviceBuffer, DevicePointer};
use rustacuda::module::Module;
use rustacuda::stream::{Stream, StreamFlags};
use rustacuda::CudaFlags;
use std::ffi::CString;

const KERNEL_NAME: &str = "smooth_filter";

/// A CUDA context on one GPU with the smoothing module loaded.
///
/// The context is pushed onto the creating thread; use the device from that
/// thread only.
pub struct CudaDevice {
    gpu: Gpu,
    module: Module,
    stream: Stream,
    // dropped last
    _context: Context,
}

/// Device memory holding pixels as raw bytes.
pub struct CudaBuffer {
    bytes: DeviceBuffer<u8>,
}

fn log_devices() -> Result<()> {
    let device_count = Gpu::num_devices()?;
    info!("Total devices: {}", device_count);

    for (idx, gpu) in Gpu::devices()?.enumerate() {
        let gpu = gpu?;
        info!("Device {}: {}", idx, gpu.name()?);
        info!(
            "Total memory: {} MiB",
            gpu.total_memory()? as f32 / (1 << 20) as f32
        );
        info!(
            "Memory clock rate: {} MHz",
            gpu.get_attribute(DeviceAttribute::MemoryClockRate)? as f32 / 1000.
        );
        info!(
            "Multiprocessors: {}",
            gpu.get_attribute(DeviceAttribute::MultiprocessorCount)?
        );
        info!(
            "Clock rate: {} MHz",
            gpu.get_attribute(DeviceAttribute::ClockRate)? as f32 / 1000.
        );
    }

    Ok(())
}

impl CudaDevice {
    pub fn new(ordinal: u32) -> Result<Self> {
        rustacuda::init(CudaFlags::empty()).chain_err(|| "Error initializing CUDA driver")?;
        log_devices()?;

        let gpu = Gpu::get_device(ordinal)
            .chain_err(|| format!("Error initializing CUDA device {}", ordinal))?;
        let context = Context::create_and_push(ContextFlags::MAP_HOST | ContextFlags::SCHED_AUTO, gpu)
            .chain_err(|| "Error initializing device context")?;

        info!("PTX source from {}", env!("KERNEL_PTX_PATH"));
        let ptx = CString::new(include_str!(env!("KERNEL_PTX_PATH")))
            .chain_err(|| "PTX source contains a NUL byte")?;
        let module = Module::load_from_string(&ptx).chain_err(|| "Error loading PTX module")?;
        let stream = Stream::new(StreamFlags::DEFAULT, None)?;

        Ok(Self {
            gpu,
            module,
            stream,
            _context: context,
        })
    }
}

impl Device for CudaDevice {
    type Buffer = CudaBuffer;

    fn name(&self) -> String {
        self.gpu.name().unwrap_or_else(|_| "cuda".into())
    }

    fn max_threads_per_block(&self) -> Result<u32> {
        let name = CString::new(KERNEL_NAME).chain_err(|| "invalid kernel name")?;
        let function = self.module.get_function(&name)?;

        let kernel_max = function.get_attribute(FunctionAttribute::MaxThreadsPerBlock)? as u32;
        let device_max = self.gpu.get_attribute(DeviceAttribute::MaxThreadsPerBlock)? as u32;
        let registers = function.get_attribute(FunctionAttribute::NumRegisters)?;

        info!("Kernel max threads per block: {} threads", kernel_max);
        info!("Device max threads per block: {} threads", device_max);
        info!("Registers per thread: {} registers", registers);

        Ok(kernel_max.min(device_max))
    }

    fn allocate(&self, len: usize) -> Result<CudaBuffer> {
        let bytes = len * PIXEL_SIZE;
        // contents are written by upload or by the kernel before any read
        let buffer = unsafe { DeviceBuffer::uninitialized(bytes) }
            .chain_err(|| ErrorKind::Allocation("device buffer".into(), bytes))?;
        Ok(CudaBuffer { bytes: buffer })
    }

    fn upload(&self, src: &[Pixel], dst: &mut CudaBuffer) -> Result<()> {
        let src: &[u8] = bytemuck::cast_slice(src);
        if src.len() != dst.bytes.len() {
            bail!(ErrorKind::PixelCount(src.len() / PIXEL_SIZE, dst.bytes.len() / PIXEL_SIZE));
        }
        dst.bytes.copy_from(src)?;
        Ok(())
    }

    fn download(&self, src: &CudaBuffer, dst: &mut [Pixel]) -> Result<()> {
        let dst: &mut [u8] = bytemuck::cast_slice_mut(dst);
        if src.bytes.len() != dst.len() {
            bail!(ErrorKind::PixelCount(src.bytes.len() / PIXEL_SIZE, dst.len() / PIXEL_SIZE));
        }
        src.bytes.copy_to(dst)?;
        Ok(())
    }

    fn launch(
        &self,
        input: &CudaBuffer,
        output: &mut CudaBuffer,
        info: ImageInfo,
        radius: usize,
        config: LaunchConfig,
    ) -> Result<()> {
        check_launch(&info, input.bytes.len() / PIXEL_SIZE, &config)?;
        check_launch(&info, output.bytes.len() / PIXEL_SIZE, &config)?;
        if info.is_empty() {
            return Ok(());
        }

        let module = &self.module;
        let stream = &self.stream;
        // the kernel only reads through this pointer
        let input_ptr = unsafe { DevicePointer::wrap(input.bytes.as_ptr() as *mut u8) };
        let output_ptr = output.bytes.as_device_ptr();
        let width = info.width;
        let height = info.height;

        unsafe {
            launch!(module.smooth_filter<<<config.grid, config.block, 0, stream>>>(
                input_ptr,
                output_ptr,
                width,
                height,
                radius
            ))
            .chain_err(|| "Error running smoothing kernel")?;
        }
        stream
            .synchronize()
            .chain_err(|| "Error waiting for smoothing kernel")?;

        Ok(())
    }
}
