error_chain! {
    foreign_links {
        Io(::std::io::Error);
        Cuda(::rustacuda::error::CudaError) #[cfg(feature = "cuda")];
    }

    errors {
        TruncatedHeader(read: usize, expected: usize) {
            description("image header is truncated")
            display("image header is truncated: read {} of {} bytes", read, expected)
        }
        TruncatedPixels(read: usize, expected: usize) {
            description("pixel data is truncated")
            display("pixel data is truncated: read {} of {} pixels", read, expected)
        }
        PixelCount(actual: usize, expected: usize) {
            description("wrong number of pixels")
            display("got {} pixels, expected {}", actual, expected)
        }
        ImageTooLarge(width: usize, height: usize) {
            description("image dimensions overflow the address space")
            display("image of {}×{} pixels does not fit in memory", width, height)
        }
        ShapeMismatch(expected_width: usize, expected_height: usize, width: usize, height: usize) {
            description("raster shapes differ")
            display("expected a {}×{} raster, got {}×{}", expected_width, expected_height, width, height)
        }
        Allocation(what: String, bytes: usize) {
            description("buffer allocation failed")
            display("could not allocate {} bytes for {}", bytes, what)
        }
        InvalidConfig(msg: String) {
            description("invalid configuration")
            display("invalid configuration: {}", msg)
        }
        DeviceUnavailable(name: String) {
            description("execution device unavailable")
            display("execution device '{}' is not available in this build", name)
        }
        OutputMismatch(idx: usize) {
            description("strategies disagree")
            display("wide and threaded outputs differ at pixel {}", idx)
        }
    }
}
