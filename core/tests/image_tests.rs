use cv_core::{
    dtype, image_info, item, item_set, merge, paste, roi, shape, split, swap_channels,
    try_get_pixel, try_put_pixel, CoreError, PixelType, Rect, Scalar, TickMeter,
};
use image::{GrayImage, Luma, Rgb, RgbImage, Rgba};

fn scene() -> RgbImage {
    RgbImage::from_fn(40, 30, |x, y| Rgb([(x * 6) as u8, (y * 8) as u8, 100]))
}

#[test]
fn test_pixel_access_and_shape() {
    let mut img = scene();
    assert_eq!(img.get_pixel(10, 5).0, [60, 40, 100]);

    let s = shape(&img);
    assert_eq!((s.rows, s.cols, s.channels), (30, 40, 3));
    assert_eq!(s.size(), 30 * 40 * 3);
    assert_eq!(s.to_string(), "(30, 40, 3)");
    assert_eq!(dtype(&img), PixelType::U8);
    assert!(image_info(&img).is_color());

    img.put_pixel(10, 5, Rgb([255, 255, 255]));
    assert_eq!(try_get_pixel(&img, 10, 5).unwrap(), Rgb([255, 255, 255]));
    assert!(matches!(try_get_pixel(&img, 40, 0), Err(CoreError::OutOfBounds(_))));
    assert!(try_put_pixel(&mut img, 0, 30, Rgb([0, 0, 0])).is_err());
}

#[test]
fn test_item_reads_and_writes_one_sample() {
    let mut img = scene();
    assert_eq!(item(&img, 10, 10, 2).unwrap(), 100);

    item_set(&mut img, 10, 10, 2, 7).unwrap();
    assert_eq!(img.get_pixel(10, 10).0, [60, 80, 7]);
    assert!(item(&img, 10, 10, 3).is_err());
    assert!(item_set(&mut img, 99, 0, 0, 1).is_err());
}

#[test]
fn test_roi_copy_leaves_source_untouched() {
    let mut img = scene();
    let block = roi(&img, Rect::from_ranges(0..10, 0..10)).unwrap();
    assert_eq!(block.dimensions(), (10, 10));

    paste(&mut img, &block, 30, 20).unwrap();
    assert_eq!(img.get_pixel(30, 20), img.get_pixel(0, 0));
    assert_eq!(img.get_pixel(39, 29).0, [54, 72, 100]);

    assert!(roi(&img, Rect::new(35, 0, 10, 10)).is_err());
    assert!(paste(&mut img, &block, 31, 0).is_err());
    assert!(roi(&img, Rect::new(0, 0, 0, 4)).is_err());
}

#[test]
fn test_split_merge_and_channel_swap() {
    let img = scene();
    let planes = split(&img);
    assert_eq!(planes.len(), 3);
    assert_eq!(planes[1].get_pixel(3, 2), &Luma([16]));

    let back: RgbImage = merge(&planes).unwrap();
    assert_eq!(back, img);

    let mut swapped = img.clone();
    swap_channels(&mut swapped, 0, 2).unwrap();
    assert_eq!(swapped.get_pixel(5, 0).0, [100, 0, 30]);

    let short = [GrayImage::new(40, 30), GrayImage::new(40, 30)];
    assert!(merge::<Rgb<u8>>(&short).is_err());
}

#[test]
fn test_scalar_to_pixel() {
    let s = Scalar::from([1, 2, 3]);
    assert_eq!(s.to_pixel::<Rgb<u8>>(), Rgb([1, 2, 3]));
    assert_eq!(s.to_pixel::<Rgba<u8>>(), Rgba([1, 2, 3, 0]));
    assert_eq!(Scalar::from(9u8).to_pixel::<Luma<u8>>(), Luma([9]));
    assert_eq!(s.channel(7), 0);
}

#[test]
fn test_tick_meter_laps() {
    let mut meter = TickMeter::new();
    meter.stop();
    assert_eq!(meter.laps(), 0);

    for _ in 0..3 {
        meter.start();
        std::thread::sleep(std::time::Duration::from_millis(2));
        meter.stop();
    }
    assert_eq!(meter.laps(), 3);
    assert!(meter.elapsed_secs() >= 0.006);
    assert!(meter.average_secs() >= 0.002);

    meter.reset();
    assert_eq!(meter.laps(), 0);
    assert_eq!(meter.average_secs(), 0.0);
}
