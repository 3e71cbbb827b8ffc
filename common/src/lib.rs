#![cfg_attr(not(feature = "std"), no_std)]

pub mod kernel;
pub mod window;

use bytemuck::{Pod, Zeroable};

/// Shape of a row-major raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ImageInfo {
    pub width: usize,
    pub height: usize,
}

impl ImageInfo {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Pixel count, or `None` if `width * height` overflows.
    pub fn checked_len(&self) -> Option<usize> {
        self.width.checked_mul(self.height)
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn offset(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    /// `(row, col)` of a linear index. The image must not be empty.
    pub fn coords(&self, idx: usize) -> (usize, usize) {
        (idx / self.width, idx % self.width)
    }
}

/// One 24-bit pixel, stored in blue-green-red order with no padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct Pixel {
    pub b: u8,
    pub g: u8,
    pub r: u8,
}

impl Pixel {
    pub const fn new(b: u8, g: u8, r: u8) -> Self {
        Self { b, g, r }
    }

    /// A pixel with every channel set to `v`.
    pub const fn splat(v: u8) -> Self {
        Self { b: v, g: v, r: v }
    }
}
