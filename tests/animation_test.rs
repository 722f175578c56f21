//! End-to-end tests for animated input: GIF in, stamp.txt, frames.txt and
//! preview.gif out.

mod common;

use common::*;
use image::RgbaImage;
use pawcessor::services::{CancelToken, Progress, StampKind, StampPipeline};
use pretty_assertions::assert_eq;

fn blink_frames(second_delay: u32) -> Vec<(RgbaImage, u32)> {
    let first = solid(4, 4, colors::CREAM);
    let mut second = first.clone();
    second.put_pixel(1, 2, colors::SLATE);
    vec![(first, 100), (second, second_delay)]
}

#[test]
fn test_one_pixel_blink() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_gif(dir.path(), "blink.gif", &blink_frames(100));
    let out = dir.path().join("out");

    let output = StampPipeline::new(chalk_config(&out))
        .unwrap()
        .run(&input, &Progress::none(), &CancelToken::new())
        .unwrap();

    assert_eq!(output.kind, StampKind::Animated);
    assert_eq!(output.frame_count, 2);

    let (header, points) = parse_stamp(&read_text(&output.stamp_path));
    assert_eq!(header, "0.4,0.4,gif,2,100");
    assert_eq!(points.len(), 16);
    assert!(points.iter().all(|p| p.number == 0));

    let frames_path = output.frames_path.clone().unwrap();
    assert_eq!(
        read_text(&frames_path),
        "frame,1\n0.1,0.2,1\nframe,2\n0.1,0.2,0\n"
    );
    assert_gif_file(&output.preview_path);
    assert_no_leftovers(&out, &["stamp.txt", "frames.txt", "preview.gif"]);
}

#[test]
fn test_variable_delays_are_written_per_block() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_gif(dir.path(), "blink.gif", &blink_frames(150));

    let output = StampPipeline::new(chalk_config(dir.path()))
        .unwrap()
        .run(&input, &Progress::none(), &CancelToken::new())
        .unwrap();

    let (header, _) = parse_stamp(&read_text(&output.stamp_path));
    assert_eq!(header, "0.4,0.4,gif,2,-1");

    let blocks = parse_frames(&read_text(&output.frames_path.unwrap()));
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].0, "frame,1,150");
    assert_eq!(blocks[1].0, "frame,2,100");
}

#[test]
fn test_identical_frames_have_empty_deltas() {
    let dir = tempfile::tempdir().unwrap();
    let frame = solid(3, 2, colors::TEAL);
    let input = write_gif(
        dir.path(),
        "still.gif",
        &[(frame.clone(), 80), (frame.clone(), 80), (frame, 80)],
    );

    let output = StampPipeline::new(chalk_config(dir.path()))
        .unwrap()
        .run(&input, &Progress::none(), &CancelToken::new())
        .unwrap();

    let (header, points) = parse_stamp(&read_text(&output.stamp_path));
    assert_eq!(header, "0.3,0.2,gif,3,80");
    assert_eq!(points.len(), 6);
    assert_eq!(
        read_text(&output.frames_path.unwrap()),
        "frame,1\nframe,2\nframe,3\n"
    );
}

#[test]
fn test_disappearing_pixels_become_transparent() {
    use pawcessor::services::{AnimationFrame, DecodedImage};

    let dir = tempfile::tempdir().unwrap();
    let first = solid(2, 1, colors::MAGENTA);
    let mut second = first.clone();
    second.put_pixel(0, 0, colors::CLEAR);
    let frames = vec![
        AnimationFrame {
            image: first,
            delay_ms: 100,
        },
        AnimationFrame {
            image: second,
            delay_ms: 100,
        },
    ];

    let pipeline = StampPipeline::new(chalk_config(dir.path())).unwrap();
    let rendered = pipeline
        .render(DecodedImage::Animated(frames), &Progress::none(), &CancelToken::new())
        .unwrap();
    let output = pipeline.write(&rendered, dir.path()).unwrap();

    let blocks = parse_frames(&read_text(&output.frames_path.unwrap()));
    assert_eq!(blocks[0].1, vec![parse_point("0.0,0.0,-1")]);
    assert_eq!(blocks[1].1, vec![parse_point("0.0,0.0,2")]);
}
