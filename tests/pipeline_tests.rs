// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the frame pipeline

use qrscan::backends::camera::{CameraFrame, SensorRotation};
use qrscan::constants::BinarizerKind;
use qrscan::frame_processor::qr_detector::QrDetector;
use qrscan::frame_processor::{FrameOutcome, FramePipeline, Point};
use qrscan::media::LuminanceFrame;
use qrscan::media::qr_render::{place_on_canvas, render_symbol};
use qrscan::ScanConfig;
use std::time::{Duration, Instant};

/// Symbol "HELLO" at 6 px per module with a 4 module quiet zone (174 px)
fn hello_symbol() -> LuminanceFrame {
    render_symbol("HELLO", 6, 4).unwrap()
}

/// Canvas with the symbol centred on (`cx`, `cy`)
fn canvas_with_symbol(width: u32, height: u32, cx: u32, cy: u32) -> LuminanceFrame {
    let symbol = hello_symbol();
    let half = symbol.width() / 2;
    place_on_canvas(&symbol, width, height, cx - half, cy - half, 255).unwrap()
}

/// Camera frame whose rows are padded to `stride` with dark bytes
fn padded_frame(
    luma: &LuminanceFrame,
    stride: u32,
    rotation: SensorRotation,
    captured_at: Instant,
) -> CameraFrame {
    let mut plane = vec![0u8; stride as usize * luma.height() as usize];
    for y in 0..luma.height() {
        let start = y as usize * stride as usize;
        plane[start..start + luma.width() as usize].copy_from_slice(luma.row(y));
    }
    CameraFrame::from_luma_plane(
        plane,
        luma.width(),
        luma.height(),
        stride,
        rotation,
        captured_at,
    )
}

fn centroid(points: &[Point]) -> Point {
    let n = points.len() as f32;
    Point::new(
        points.iter().map(|p| p.x).sum::<f32>() / n,
        points.iter().map(|p| p.y).sum::<f32>() / n,
    )
}

fn assert_near(actual: Point, expected: (f32, f32), tolerance: f32) {
    assert!(
        (actual.x - expected.0).abs() <= tolerance && (actual.y - expected.1).abs() <= tolerance,
        "expected {:?} near {:?}",
        actual,
        expected
    );
}

#[test]
fn test_decodes_centered_symbol_in_vga_frame() {
    let mut pipeline = FramePipeline::open(&ScanConfig::default()).unwrap();
    let luma = canvas_with_symbol(640, 480, 320, 240);
    let frame = padded_frame(&luma, 704, SensorRotation::None, Instant::now());

    let outcome = pipeline.process(&frame).unwrap();
    let detection = outcome.detection().expect("symbol should decode");

    assert_eq!(detection.text, "HELLO");
    assert_eq!(detection.corners.len(), 4);
    assert_eq!((detection.image_width, detection.image_height), (640, 480));
    assert_near(centroid(&detection.corners), (320.0, 240.0), 6.0);
    for corner in &detection.corners {
        assert!((0.0..=640.0).contains(&corner.x));
        assert!((0.0..=480.0).contains(&corner.y));
    }
}

#[test]
fn test_rotated_portrait_frame_decodes_in_display_orientation() {
    let mut pipeline = FramePipeline::open(&ScanConfig::default()).unwrap();
    // Portrait sensor buffer, symbol centred on (200, 300)
    let luma = canvas_with_symbol(480, 640, 200, 300);
    let frame = padded_frame(&luma, 512, SensorRotation::Rotate90, Instant::now());

    let outcome = pipeline.process(&frame).unwrap();
    let detection = outcome.detection().expect("symbol should decode");

    assert_eq!(detection.text, "HELLO");
    assert_eq!((detection.image_width, detection.image_height), (640, 480));
    // (x, y) -> (height - y, x) for a clockwise quarter turn
    assert_near(centroid(&detection.corners), (340.0, 200.0), 6.0);
}

#[test]
fn test_upside_down_frame_decodes() {
    let mut pipeline = FramePipeline::open(&ScanConfig::default()).unwrap();
    let luma = canvas_with_symbol(640, 480, 300, 260);
    let frame = padded_frame(&luma, 640, SensorRotation::Rotate180, Instant::now());

    let detection = pipeline.process(&frame).unwrap().detection().cloned().unwrap();
    assert_eq!(detection.text, "HELLO");
    assert_near(centroid(&detection.corners), (340.0, 220.0), 6.0);
}

#[test]
fn test_blank_frame_is_a_miss_for_every_strategy() {
    let blank = LuminanceFrame::filled(200, 200, 255).unwrap();
    for kind in BinarizerKind::ALL {
        let config = ScanConfig {
            strategies: vec![kind],
            ..ScanConfig::default()
        };
        let mut detector = QrDetector::open(&config).unwrap();
        assert_eq!(detector.detect(&blank).unwrap(), None, "{:?}", kind);
    }
}

#[test]
fn test_throttle_keeps_decode_count_at_one() {
    let mut pipeline = FramePipeline::open(&ScanConfig::default()).unwrap();
    let luma = canvas_with_symbol(640, 480, 320, 240);
    let t0 = Instant::now();

    let first = pipeline
        .process(&padded_frame(&luma, 640, SensorRotation::None, t0))
        .unwrap();
    let second = pipeline
        .process(&padded_frame(
            &luma,
            640,
            SensorRotation::None,
            t0 + Duration::from_millis(50),
        ))
        .unwrap();

    assert!(first.detection().is_some());
    assert_eq!(second, FrameOutcome::Skipped);
    assert_eq!(pipeline.decode_attempts(), 1);
}

#[test]
fn test_lost_symbol_is_held_then_released() {
    let mut pipeline = FramePipeline::open(&ScanConfig::default()).unwrap();
    let with_code = canvas_with_symbol(640, 480, 320, 240);
    let blank = LuminanceFrame::filled(640, 480, 255).unwrap();
    let t0 = Instant::now();
    let at = |ms: u64| t0 + Duration::from_millis(ms);

    let hit = pipeline
        .process(&padded_frame(&with_code, 640, SensorRotation::None, at(0)))
        .unwrap();
    let held = pipeline
        .process(&padded_frame(&blank, 640, SensorRotation::None, at(360)))
        .unwrap();
    let released = pipeline
        .process(&padded_frame(&blank, 640, SensorRotation::None, at(720)))
        .unwrap();

    assert_eq!(hit.detection(), held.detection());
    assert!(held.detection().is_some());
    assert_eq!(released, FrameOutcome::Analyzed(None));
}

#[test]
fn test_rgba_frame_decodes() {
    let mut pipeline = FramePipeline::open(&ScanConfig::default()).unwrap();
    let luma = canvas_with_symbol(320, 240, 160, 120);
    let rgba: Vec<u8> = luma
        .as_bytes()
        .iter()
        .flat_map(|&v| [v, v, v, 255])
        .collect();
    let frame = CameraFrame {
        width: 320,
        height: 240,
        data: rgba.into(),
        format: qrscan::backends::camera::PixelFormat::RGBA,
        stride: 320 * 4,
        rotation: SensorRotation::None,
        captured_at: Instant::now(),
    };

    let detection = pipeline.process(&frame).unwrap().detection().cloned().unwrap();
    assert_eq!(detection.text, "HELLO");
}
