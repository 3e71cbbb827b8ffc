//! Staging of host rasters in device memory.

use crate::device::{Device, LaunchConfig};
use crate::errors::*;
use crate::raster::Raster;
use common::ImageInfo;
use log::info;

/// Input and output buffers of one image on an execution device.
///
/// Both buffers live exactly as long as this value.
pub struct DeviceImage<'d, D: Device> {
    device: &'d D,
    info: ImageInfo,
    input: D::Buffer,
    output: D::Buffer,
}

fn allocate<D: Device>(device: &D, len: usize, what: &str) -> Result<D::Buffer> {
    match device.allocate(len) {
        Ok(buffer) => Ok(buffer),
        Err(e) => {
            if let ErrorKind::Allocation(_, bytes) = *e.kind() {
                let what = format!("{} on device '{}'", what, device.name());
                return Err(Error::with_chain(e, ErrorKind::Allocation(what, bytes)));
            }
            Err(e)
        }
    }
}

impl<'d, D: Device> DeviceImage<'d, D> {
    /// Allocates input and output buffers and copies `raster` into the input.
    ///
    /// Fails without staging anything if either allocation fails.
    pub fn stage(device: &'d D, raster: &Raster) -> Result<Self> {
        let len = raster.len();
        info!("Allocating 2 × {} pixels on device '{}'", len, device.name());
        let mut input = allocate(device, len, "input pixel data")?;
        let output = allocate(device, len, "output pixel data")?;

        device
            .upload(raster.pixels(), &mut input)
            .chain_err(|| "Error copying input image to device")?;

        Ok(Self {
            device,
            info: raster.info(),
            input,
            output,
        })
    }

    pub fn info(&self) -> ImageInfo {
        self.info
    }

    /// One blocking launch reading the input buffer and writing the output buffer.
    pub fn dispatch(&mut self, radius: usize, config: LaunchConfig) -> Result<()> {
        self.device
            .launch(&self.input, &mut self.output, self.info, radius, config)
    }

    /// Copies the output buffer into `raster`, which must have the staged shape.
    pub fn retrieve(&self, raster: &mut Raster) -> Result<()> {
        raster.ensure_shape(&self.info)?;
        self.device
            .download(&self.output, raster.pixels_mut())
            .chain_err(|| "Error copying output image from device")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HostDevice;
    use common::Pixel;

    fn gradient(width: usize, height: usize) -> Raster {
        Raster::from_fn(width, height, |row, col| Pixel::new(row as u8, col as u8, 7)).unwrap()
    }

    #[test]
    fn output_allocation_failure_is_fatal() {
        // room for the input buffer only
        let device = HostDevice::with_capacity(4 * 4 * 3);
        let err = DeviceImage::stage(&device, &gradient(4, 4)).err().unwrap();
        match *err.kind() {
            ErrorKind::Allocation(ref what, 48) => assert!(what.contains("output")),
            ref other => panic!("unexpected error: {}", other),
        }
        assert_eq!(device.allocated(), 0);
    }

    #[test]
    fn input_allocation_failure_is_fatal() {
        let device = HostDevice::with_capacity(10);
        let err = DeviceImage::stage(&device, &gradient(4, 4)).err().unwrap();
        match *err.kind() {
            ErrorKind::Allocation(ref what, 48) => assert!(what.contains("input")),
            ref other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn staged_buffers_are_released() {
        let device = HostDevice::new();
        {
            let staged = DeviceImage::stage(&device, &gradient(3, 2)).unwrap();
            assert_eq!(staged.info(), ImageInfo::new(3, 2));
            assert_eq!(device.allocated(), 2 * 6 * 3);
        }
        assert_eq!(device.allocated(), 0);
    }

    #[test]
    fn retrieve_checks_shape() {
        let device = HostDevice::new();
        let staged = DeviceImage::stage(&device, &gradient(3, 2)).unwrap();
        let mut wrong = Raster::new(2, 3).unwrap();
        assert!(staged.retrieve(&mut wrong).is_err());
    }

    #[test]
    fn dispatch_then_retrieve() {
        let device = HostDevice::new();
        let input = gradient(3, 2);
        let mut staged = DeviceImage::stage(&device, &input).unwrap();
        staged
            .dispatch(0, LaunchConfig { grid: 1, block: 8 })
            .unwrap();
        let mut output = Raster::new(3, 2).unwrap();
        staged.retrieve(&mut output).unwrap();
        assert_eq!(output, input);
    }
}
