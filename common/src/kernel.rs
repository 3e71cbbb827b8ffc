use core::slice;

use super::window::Window;
use super::{ImageInfo, Pixel};

/// Linear id of a thread in a one-dimensional launch grid.
#[inline]
pub fn global_index(block_idx: usize, block_dim: usize, thread_idx: usize) -> usize {
    block_idx * block_dim + thread_idx
}

#[inline]
fn round_mean(sum: u64, count: u64) -> u8 {
    (sum as f64 / count as f64 + 0.5) as u8
}

/// Box-filtered value of pixel `idx`: the per-channel mean of its clamped
/// window, rounded half up.
///
/// Returns `None` when `idx` is past the end of the image.
pub fn smooth_pixel(input: &[Pixel], info: &ImageInfo, radius: usize, idx: usize) -> Option<Pixel> {
    let window = Window::around(info, radius, idx)?;

    let mut b = 0u64;
    let mut g = 0u64;
    let mut r = 0u64;
    for row in window.rows.start..=window.rows.end {
        let line = &input[info.offset(row, window.cols.start)..=info.offset(row, window.cols.end)];
        for p in line {
            b += p.b as u64;
            g += p.g as u64;
            r += p.r as u64;
        }
    }

    let count = window.count() as u64;
    Some(Pixel {
        b: round_mean(b, count),
        g: round_mean(g, count),
        r: round_mean(r, count),
    })
}

/// Per-thread body of the smoothing kernel.
///
/// # Safety
///
/// `input` and `output` must each point to `info.len()` pixels and must not
/// overlap.
pub unsafe fn smooth_filter(
    input: *const Pixel,
    output: *mut Pixel,
    info: ImageInfo,
    radius: usize,
    idx: usize,
) {
    let input = slice::from_raw_parts(input, info.len());
    if let Some(pixel) = smooth_pixel(input, &info, radius, idx) {
        *output.add(idx) = pixel;
    }
}
