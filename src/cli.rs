// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for QR operations
//!
//! This module provides command-line functionality for:
//! - Decoding a QR code from a still image
//! - Replaying captured frames through a live scanning session
//! - Generating QR code images

use chrono::Local;
use qrscan::backends::camera::{FileFrameSource, SensorRotation};
use qrscan::frame_processor::qr_detector::QrDetector;
use qrscan::frame_processor::{QrAction, ScanSession, SessionUpdate, WifiSecurity};
use qrscan::media::qr_render;
use qrscan::qr_overlay::animation::CornerAnimation;
use qrscan::qr_overlay::{OverlayTracker, Quad, ViewSize, idle_target};
use qrscan::{ScanConfig, ScanError};
use std::path::Path;
use std::time::Instant;
use tracing::warn;

fn load_config(path: Option<&Path>) -> Result<ScanConfig, ScanError> {
    match path {
        Some(path) => ScanConfig::load(path),
        None => Ok(ScanConfig::default()),
    }
}

/// Decode a QR code from an image file and print its payload
pub fn decode_image(path: &Path, config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    let mut detector = QrDetector::open(&config)?;
    let result = detector.decode_image_file(path);
    detector.close();

    match result? {
        Some(text) => {
            let action = QrAction::parse(&text);
            println!("{}", text);
            eprintln!("Type: {}", action.action_label());
            if let QrAction::Wifi { ssid, security, .. } = &action {
                eprintln!("Network: {} ({})", ssid, security.display_name());
            }
            Ok(())
        }
        None => Err(format!("No QR code found in {}", path.display()).into()),
    }
}

/// Parse a `WIDTHxHEIGHT` view size
fn parse_view(view: &str, density: f32) -> Result<ViewSize, Box<dyn std::error::Error>> {
    let (w, h) = view
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("Invalid view size '{}', expected WIDTHxHEIGHT", view))?;
    Ok(ViewSize::new(w.trim().parse()?, h.trim().parse()?, density)?)
}

fn quad_json(quad: &Quad) -> serde_json::Value {
    serde_json::Value::Array(
        quad.corners
            .iter()
            .map(|p| serde_json::json!([p.x, p.y]))
            .collect(),
    )
}

fn print_update(update: &SessionUpdate, target: &Quad, animated: &Quad) {
    let line = serde_json::json!({
        "timestamp": Local::now().to_rfc3339(),
        "frame": update.frames,
        "analyzed": update.analyzed,
        "text": update.detection.as_ref().map(|d| d.text.as_str()),
        "action": update.detection.as_ref().map(|d| d.action()),
        "image_corners": update.detection.as_ref().map(|d| &d.corners),
        "bounds": update.detection.as_ref().and_then(|d| d.bounds()),
        "target": quad_json(target),
        "overlay": quad_json(animated),
    });
    println!("{}", line);
}

/// Replay a directory of frames through a scanning session
///
/// Prints one JSON line per analyzed frame with the reported detection and
/// its normalized bounds, the overlay target and the animated overlay
/// corners at that frame's time.
pub fn scan_directory(
    dir: &Path,
    rotation: i32,
    fps: f32,
    view: &str,
    density: f32,
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    let rotation = SensorRotation::from_degrees_int(rotation)?;
    let view = parse_view(view, density)?;
    let source = FileFrameSource::open(dir, fps, rotation)?;
    if source.is_empty() {
        println!("No image files found in {}", dir.display());
        return Ok(());
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let session = ScanSession::open(&config)?;
        let mut updates = session.subscribe();
        let mut tracker = OverlayTracker::new(config.overlay.clone(), config.reset_delay());
        let mut animation: Option<CornerAnimation> = None;
        let mut printed = 0u64;

        for (index, frame) in source.enumerate() {
            let frame = frame?;
            if session.submit_wait(frame).await.is_err() {
                break;
            }

            let update = match updates
                .wait_for(|u| u.frames > index as u64 || u.stopped)
                .await
            {
                Ok(update) => update.clone(),
                Err(_) => break,
            };
            if update.stopped {
                break;
            }
            if update.analyzed == printed {
                continue;
            }
            printed = update.analyzed;

            let now = update.captured_at.unwrap_or_else(Instant::now);
            let target = tracker.update(now, &view, update.detection.as_ref())?;
            let anim = animation.get_or_insert_with(|| {
                CornerAnimation::new(
                    idle_target(&view, &config.overlay),
                    now,
                    config.animation_duration(),
                )
            });
            anim.retarget(now, target);
            print_update(&update, &target, &anim.sample(now));
        }

        let dropped = session.dropped_frames();
        if dropped > 0 {
            warn!(dropped, "Frames dropped during replay");
        }
        session.close().await?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

/// Build the payload for `generate` from either free text or WiFi options
pub fn build_payload(
    payload: Option<String>,
    wifi_ssid: Option<String>,
    wifi_password: Option<String>,
    wifi_security: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(ssid) = wifi_ssid {
        let security = WifiSecurity::parse(wifi_security);
        let password = match security {
            WifiSecurity::None => None,
            _ => wifi_password,
        };
        return Ok(QrAction::Wifi {
            ssid,
            password,
            security,
            hidden: false,
        }
        .encode());
    }
    payload
        .filter(|p| !p.is_empty())
        .ok_or_else(|| "Nothing to encode".into())
}

/// Render `payload` to a PNG file
pub fn generate_code(
    payload: &str,
    output: &Path,
    size: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let frame = qr_render::generate(payload, size)?;
    qr_render::save_png(&frame, output)?;
    println!("QR code saved: {}", output.display());
    Ok(())
}
