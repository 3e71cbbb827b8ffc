use common::{ImageInfo, Pixel};
use crate::errors::*;
use std::mem::size_of;

/// Bytes per pixel in host and device memory.
pub const PIXEL_SIZE: usize = size_of::<Pixel>();

/// Host-owned, row-major pixel grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    info: ImageInfo,
    pixels: Vec<Pixel>,
}

/// Pixel count of `info`, checking that its byte size is addressable.
pub fn pixel_count(info: &ImageInfo) -> Result<usize> {
    info.checked_len()
        .filter(|len| len.checked_mul(PIXEL_SIZE).is_some())
        .ok_or_else(|| ErrorKind::ImageTooLarge(info.width, info.height).into())
}

impl Raster {
    /// Allocates a black `width`×`height` raster.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let info = ImageInfo::new(width, height);
        let len = pixel_count(&info)?;

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| ErrorKind::Allocation("host raster".into(), len * PIXEL_SIZE))?;
        pixels.resize(len, Pixel::default());

        Ok(Self { info, pixels })
    }

    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Pixel>) -> Result<Self> {
        let info = ImageInfo::new(width, height);
        let len = pixel_count(&info)?;
        if pixels.len() != len {
            bail!(ErrorKind::PixelCount(pixels.len(), len));
        }
        Ok(Self { info, pixels })
    }

    /// Builds a raster by evaluating `f(row, col)` for every pixel.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, usize) -> Pixel,
    {
        let mut raster = Self::new(width, height)?;
        for row in 0..height {
            for col in 0..width {
                raster.pixels[row * width + col] = f(row, col);
            }
        }
        Ok(raster)
    }

    pub fn info(&self) -> ImageInfo {
        self.info
    }

    pub fn width(&self) -> usize {
        self.info.width
    }

    pub fn height(&self) -> usize {
        self.info.height
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Pixel> {
        if row >= self.info.height || col >= self.info.width {
            return None;
        }
        self.pixels.get(self.info.offset(row, col))
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    /// Pixel data in on-disk order (blue, green, red per pixel).
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.pixels)
    }

    pub fn ensure_shape(&self, info: &ImageInfo) -> Result<()> {
        if self.info != *info {
            bail!(ErrorKind::ShapeMismatch(
                info.width,
                info.height,
                self.info.width,
                self.info.height
            ));
        }
        Ok(())
    }

    /// Index of the first pixel where `self` and `other` differ.
    pub fn first_difference(&self, other: &Raster) -> Option<usize> {
        if self.info != other.info {
            return Some(0);
        }
        self.pixels
            .iter()
            .zip(other.pixels.iter())
            .position(|(a, b)| a != b)
    }
}
