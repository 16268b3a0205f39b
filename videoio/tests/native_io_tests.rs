use cv_videoio::{
    open_video, open_writer, AviCapture, AviWriter, CaptureProperty, FourCC, PngSequenceCapture,
    PngSequenceWriter, VideoCapture, VideoError, VideoWriter,
};
use image::{Rgb, RgbImage};
use tempfile::tempdir;

fn solid(width: u32, height: u32, value: u8) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([value, value / 2, 255 - value]))
}

fn close(a: u8, b: u8) -> bool {
    (a as i16 - b as i16).abs() <= 4
}

#[test]
fn test_png_sequence_roundtrip() {
    let dir = tempdir().expect("Failed to create temp dir");
    let prefix = "frame";

    // 1. Write frames
    let mut writer = PngSequenceWriter::new(dir.path(), prefix).unwrap();
    let width = 64;
    let height = 48;

    for i in 0..5u8 {
        writer.write(&solid(width, height, i * 10)).unwrap();
    }
    writer.release().unwrap();
    assert!(writer.write(&solid(width, height, 0)).is_err());

    // 2. Read frames back
    let mut capture = PngSequenceCapture::new(dir.path()).unwrap();
    assert!(capture.is_opened());
    assert_eq!(capture.get(CaptureProperty::FrameCount), Some(5.0));

    for i in 0..5u8 {
        let img = capture.read().unwrap();
        assert_eq!(img.dimensions(), (width, height));
        assert_eq!(img.get_pixel(0, 0), &Rgb([i * 10, i * 5, 255 - i * 10]));
    }

    // 3. Verify end of stream
    assert!(matches!(capture.read(), Err(VideoError::EndOfStream)));
}

#[test]
fn test_png_sequence_invalid_dir() {
    let res = PngSequenceCapture::new("/non/existent/path");
    assert!(res.is_err());
}

#[test]
fn test_avi_mjpg_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("output.avi");

    let mut writer = AviWriter::create(&path, FourCC::new(b"MJPG"), 20.0, (64, 48), true).unwrap();
    for i in 0..6u8 {
        writer.write(&solid(64, 48, i * 40)).unwrap();
    }
    assert_eq!(writer.frame_count(), 6);
    writer.release().unwrap();

    let mut capture = AviCapture::new(&path).unwrap();
    assert!(capture.is_opened());
    assert_eq!(capture.get(CaptureProperty::FrameWidth), Some(64.0));
    assert_eq!(capture.get(CaptureProperty::FrameHeight), Some(48.0));
    assert_eq!(capture.get(CaptureProperty::Fps), Some(20.0));
    assert_eq!(capture.get(CaptureProperty::FrameCount), Some(6.0));

    let mut count = 0u8;
    while let Ok(frame) = capture.read() {
        let expected = solid(1, 1, count * 40);
        let (got, want) = (frame.get_pixel(32, 24), expected.get_pixel(0, 0));
        assert!((0..3).all(|c| close(got[c], want[c])), "frame {count}: {got:?} vs {want:?}");
        count += 1;
    }
    assert_eq!(count, 6);

    // Seek back and read again
    assert!(capture.set(CaptureProperty::PosFrames, 2.0));
    let frame = capture.read().unwrap();
    assert!(close(frame.get_pixel(0, 0)[0], 80));

    capture.release();
    assert!(!capture.is_opened());
    assert!(capture.read().is_err());
}

#[test]
fn test_avi_grayscale_writer() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gray.avi");

    let mut writer = open_writer(&path, FourCC::MJPG, 15.0, (32, 32), false).unwrap();
    writer.write(&RgbImage::from_pixel(32, 32, Rgb([200, 200, 200]))).unwrap();
    writer.release().unwrap();

    let mut capture = open_video(&path).unwrap();
    let frame = capture.read().unwrap();
    let px = frame.get_pixel(10, 10);
    assert_eq!(px[0], px[1]);
    assert_eq!(px[1], px[2]);
    assert!(close(px[0], 200));
}

#[test]
fn test_avi_rejects_wrong_frame_size() {
    let dir = tempdir().unwrap();
    let mut writer =
        AviWriter::create(dir.path().join("a.avi"), FourCC::MJPG, 20.0, (640, 480), true).unwrap();
    let err = writer.write(&solid(320, 240, 0)).unwrap_err();
    assert!(matches!(err, VideoError::InvalidParameters(_)));
    writer.release().unwrap();
}

#[test]
fn test_avi_rejects_other_codecs() {
    let dir = tempdir().unwrap();
    let res = AviWriter::create(dir.path().join("x.avi"), FourCC::new(b"XVID"), 20.0, (640, 480), true);
    assert!(matches!(res, Err(VideoError::UnsupportedCodec(code)) if code == FourCC::new(b"XVID")));
}

#[test]
fn test_dropped_writer_is_still_readable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dropped.avi");
    {
        let mut writer = AviWriter::create(&path, FourCC::MJPG, 30.0, (16, 16), true).unwrap();
        writer.write(&solid(16, 16, 100)).unwrap();
        writer.write(&solid(16, 16, 150)).unwrap();
    }
    let capture = AviCapture::new(&path).unwrap();
    assert_eq!(capture.get(CaptureProperty::FrameCount), Some(2.0));
}

#[test]
fn test_non_avi_file_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fake.avi");
    std::fs::write(&path, b"definitely not a RIFF file").unwrap();
    assert!(AviCapture::new(&path).is_err());
}
