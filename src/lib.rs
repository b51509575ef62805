// SPDX-License-Identifier: MPL-2.0

//! qrscan - real-time QR frame decoding pipeline
//!
//! This library turns raw camera frames into stable QR detections and the
//! overlay geometry a preview needs to highlight them.
//!
//! # Architecture
//!
//! The crate is organized into several modules, leaves first:
//!
//! - [`backends`]: Camera frame types and a file-backed frame source
//! - [`media`]: Luminance extraction, rotation, centre crop, binarization
//!   and QR rendering
//! - [`frame_processor`]: QR detector, detection stabilizer, per-frame
//!   pipeline and the async scanning session
//! - [`qr_overlay`]: Image-to-view mapping, corner ordering, idle target and
//!   corner animation
//! - [`config`]: Scanner configuration
//! - [`errors`]: Error types
//!
//! # Example
//!
//! ```ignore
//! let config = qrscan::ScanConfig::default();
//! let mut pipeline = qrscan::FramePipeline::open(&config)?;
//! if let Some(detection) = pipeline.process(&frame)?.detection() {
//!     println!("{}", detection.text);
//! }
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod frame_processor;
pub mod media;
pub mod qr_overlay;

// Re-export commonly used types
pub use backends::camera::{CameraFrame, SensorRotation};
pub use config::ScanConfig;
pub use errors::{ScanError, ScanResult};
pub use frame_processor::{
    DetectionResult, FrameOutcome, FramePipeline, Point, QrAction, ScanSession,
};
pub use media::LuminanceFrame;
pub use qr_overlay::{OverlayTracker, Quad, ViewSize};
