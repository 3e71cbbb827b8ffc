#![feature(abi_ptx, intrinsics)]
#![no_std]

extern crate common;
extern crate nvptx_builtins;

use common::{kernel, ImageInfo, Pixel};
use core::panic::PanicInfo;
use nvptx_builtins::*;

#[no_mangle]
pub unsafe extern "ptx-kernel" fn smooth_filter(
    input_image: *const Pixel,
    output_image: *mut Pixel,
    width: usize,
    height: usize,
    radius: usize,
) {
    let idx = kernel::global_index(
        block_idx_x() as usize,
        block_dim_x() as usize,
        thread_idx_x() as usize,
    );

    kernel::smooth_filter(
        input_image,
        output_image,
        ImageInfo::new(width, height),
        radius,
        idx,
    );
}

#[panic_handler]
fn panic(_info: &PanicInfo) -> ! {
    loop {}
}
