//! Capture, segmentation and output wired together the way the binary does it

use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use vibe_fx::capture::{CaptureSource, ImageSequence};
use vibe_fx::output::{ImageDirOutput, OutputSink};
use vibe_fx::segmentation::updater::neighbour_coord;
use vibe_fx::segmentation::{
    create_default_model, DisplayMode, Preprocessor, SegmentationModel, VibeConfig,
};

fn scene(width: u32, height: u32, object_at: Option<u32>) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| match object_at {
        Some(left) if (left..left + 4).contains(&x) && (4..8).contains(&y) => Rgb([250, 20, 20]),
        _ => Rgb([40, 70 + (y as u8), 90]),
    })
}

#[test]
fn moving_object_is_segmented_across_a_sequence() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    let frames = [None, None, Some(2), Some(6), Some(10)];
    for (i, object_at) in frames.iter().enumerate() {
        scene(16, 12, *object_at)
            .save(input.path().join(format!("{i:03}.png")))
            .unwrap();
    }

    let mut capture = ImageSequence::open(input.path()).unwrap();
    let (width, height) = capture.resolution();
    let config = VibeConfig {
        display_mode: DisplayMode::Mask,
        seed: Some(5),
        ..VibeConfig::default()
    };
    let mut model = create_default_model(config, width, height).unwrap();
    let preprocessor = Preprocessor::new(width, height);
    let mut sink = ImageDirOutput::new(output.path(), width, height).unwrap();

    let mut foreground = Vec::new();
    while let Some(frame) = capture.capture_frame().unwrap() {
        let segmentation = model.segment(&preprocessor.preprocess(&frame)).unwrap();
        foreground.push(segmentation.classes.foreground_count());
        sink.write_frame(&segmentation.image).unwrap();
    }

    assert_eq!(foreground, vec![0, 0, 16, 16, 16]);

    let last = image::open(output.path().join("frame_000004.png")).unwrap().to_rgb8();
    assert_eq!(last.get_pixel(11, 5).0, [255, 255, 255]);
    assert_eq!(last.get_pixel(1, 1).0, [0, 0, 0]);
}

#[test]
fn frames_larger_than_the_model_are_fitted() {
    let mut model = create_default_model(VibeConfig::default(), 8, 6).unwrap();
    let preprocessor = Preprocessor::new(8, 6);
    let frame = RgbImage::from_pixel(32, 24, Rgb([64, 64, 64]));

    let segmentation = model.segment(&preprocessor.preprocess(&frame)).unwrap();
    assert_eq!(segmentation.image.dimensions(), (8, 6));

    let restored = Preprocessor::postprocess(segmentation.image, 32, 24);
    assert_eq!(restored.dimensions(), (32, 24));
}

#[test]
fn neighbour_selection_stays_inside_the_frame() {
    let mut rng = StdRng::seed_from_u64(99);
    let (width, height) = (5u32, 3u32);
    for _ in 0..50 {
        for y in 0..height {
            for x in 0..width {
                let nx = neighbour_coord(&mut rng, x, width);
                let ny = neighbour_coord(&mut rng, y, height);
                assert!(nx < width && ny < height);
                assert!(nx.abs_diff(x) <= 1 && ny.abs_diff(y) <= 1);
                if x == 0 || x == width - 1 {
                    assert_eq!(nx, x);
                }
                if y == 0 || y == height - 1 {
                    assert_eq!(ny, y);
                }
            }
        }
    }
}
