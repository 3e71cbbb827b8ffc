//! Properties shared by the threaded and wide strategies.

use common::window::Window;
use proptest::prelude::*;
use smooth_filter_bench::bench;
use smooth_filter_bench::device::HostDevice;
use smooth_filter_bench::dispatch::{Smoother, ThreadedSmoother, WideSmoother};
use smooth_filter_bench::raster::Raster;
use smooth_filter_bench::Pixel;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn threaded(input: &Raster, radius: usize, workers: usize) -> Raster {
    let mut smoother = ThreadedSmoother::new(input, workers).unwrap();
    smoother.smooth(radius).unwrap();
    smoother.output().unwrap()
}

fn wide(input: &Raster, radius: usize, block_size: Option<u32>) -> Raster {
    let device = HostDevice::new();
    let mut smoother = WideSmoother::new(&device, input, block_size).unwrap();
    smoother.smooth(radius).unwrap();
    smoother.output().unwrap()
}

/// Straightforward signed-coordinate box blur.
fn reference(input: &Raster, radius: usize) -> Raster {
    let (w, h, r) = (input.width() as isize, input.height() as isize, radius as isize);
    Raster::from_fn(input.width(), input.height(), |row, col| {
        let (mut sums, mut count) = ([0u64; 3], 0u64);
        for y in (row as isize - r)..=(row as isize + r) {
            for x in (col as isize - r)..=(col as isize + r) {
                if x < 0 || y < 0 || x >= w || y >= h {
                    continue;
                }
                let p = input.get(y as usize, x as usize).unwrap();
                sums[0] += p.b as u64;
                sums[1] += p.g as u64;
                sums[2] += p.r as u64;
                count += 1;
            }
        }
        let mean = |sum: u64| (sum as f64 / count as f64 + 0.5) as u8;
        Pixel::new(mean(sums[0]), mean(sums[1]), mean(sums[2]))
    })
    .unwrap()
}

fn raster(max_side: usize) -> impl Strategy<Value = Raster> {
    (0..=max_side, 0..=max_side).prop_flat_map(|(width, height)| {
        prop::collection::vec(any::<(u8, u8, u8)>(), width * height).prop_map(move |pixels| {
            let pixels = pixels
                .into_iter()
                .map(|(b, g, r)| Pixel::new(b, g, r))
                .collect();
            Raster::from_pixels(width, height, pixels).unwrap()
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn strategies_agree(
        input in raster(16),
        radius in 0usize..12,
        workers in 1usize..7,
        block in 1u32..64,
    ) {
        init_logging();
        let threaded = threaded(&input, radius, workers);
        prop_assert_eq!(&wide(&input, radius, Some(block)), &threaded);
        prop_assert_eq!(&wide(&input, radius, None), &threaded);
    }

    #[test]
    fn matches_reference(input in raster(12), radius in 0usize..8) {
        prop_assert_eq!(threaded(&input, radius, 4), reference(&input, radius));
    }

    #[test]
    fn radius_zero_is_identity(input in raster(16), block in 1u32..40) {
        prop_assert_eq!(&threaded(&input, 0, 4), &input);
        prop_assert_eq!(&wide(&input, 0, Some(block)), &input);
    }

    #[test]
    fn uniform_image_is_unchanged(
        width in 1usize..20,
        height in 1usize..20,
        value in any::<(u8, u8, u8)>(),
        radius in 0usize..30,
    ) {
        let input = Raster::from_fn(width, height, |_, _| Pixel::new(value.0, value.1, value.2)).unwrap();
        prop_assert_eq!(&threaded(&input, radius, 4), &input);
        prop_assert_eq!(&wide(&input, radius, None), &input);
    }

    #[test]
    fn output_is_bounded_by_window(input in raster(12), radius in 0usize..6) {
        let output = threaded(&input, radius, 3);
        let info = input.info();
        for idx in 0..info.len() {
            let window = Window::around(&info, radius, idx).unwrap();
            let mut lo = [u8::MAX; 3];
            let mut hi = [u8::MIN; 3];
            for row in window.rows.start..=window.rows.end {
                for col in window.cols.start..=window.cols.end {
                    let p = input.get(row, col).unwrap();
                    for (c, v) in [p.b, p.g, p.r].iter().enumerate() {
                        lo[c] = lo[c].min(*v);
                        hi[c] = hi[c].max(*v);
                    }
                }
            }
            let out = output.pixels()[idx];
            for (c, v) in [out.b, out.g, out.r].iter().enumerate() {
                prop_assert!(lo[c] <= *v && *v <= hi[c]);
            }
        }
    }

    #[test]
    fn repeated_passes_are_idempotent(input in raster(10), radius in 0usize..5) {
        let once = threaded(&input, radius, 4);

        let mut smoother = ThreadedSmoother::new(&input, 4).unwrap();
        bench::run(&mut smoother, radius, 5).unwrap();
        prop_assert_eq!(&smoother.output().unwrap(), &once);

        let device = HostDevice::new();
        let mut smoother = WideSmoother::new(&device, &input, Some(7)).unwrap();
        bench::run(&mut smoother, radius, 5).unwrap();
        prop_assert_eq!(&smoother.output().unwrap(), &once);
    }
}

#[test]
fn two_by_two_averages_everything() {
    let input = Raster::from_pixels(
        2,
        2,
        vec![
            Pixel::splat(10),
            Pixel::splat(20),
            Pixel::splat(30),
            Pixel::splat(40),
        ],
    )
    .unwrap();
    let expected = Raster::from_pixels(2, 2, vec![Pixel::splat(25); 4]).unwrap();
    assert_eq!(threaded(&input, 1, 4), expected);
    assert_eq!(wide(&input, 1, None), expected);
}

#[test]
fn huge_radius_covers_whole_image() {
    let input = Raster::from_fn(5, 3, |row, col| Pixel::splat((row * 5 + col) as u8)).unwrap();
    // mean of 0..15 is 7
    let expected = Raster::from_pixels(5, 3, vec![Pixel::splat(7); 15]).unwrap();
    assert_eq!(threaded(&input, usize::MAX, 4), expected);
    assert_eq!(wide(&input, usize::MAX, Some(4)), expected);
}

#[test]
fn single_row_and_single_column() {
    let row = Raster::from_fn(9, 1, |_, col| Pixel::splat(col as u8 * 10)).unwrap();
    let col = Raster::from_fn(1, 9, |row, _| Pixel::splat(row as u8 * 10)).unwrap();
    let smoothed_row = threaded(&row, 1, 4);
    let smoothed_col = threaded(&col, 1, 4);
    assert_eq!(smoothed_row.pixels(), smoothed_col.pixels());
    // (0 + 10) / 2 rounds half up
    assert_eq!(smoothed_row.pixels()[0], Pixel::splat(5));
    assert_eq!(smoothed_row.pixels()[4], Pixel::splat(40));
    assert_eq!(wide(&row, 1, Some(2)), smoothed_row);
}
