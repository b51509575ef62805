// SPDX-License-Identifier: MPL-2.0

//! Frame processor module for frame analysis
//!
//! Camera frames flow through [`pipeline::FramePipeline`]: the throttle gate,
//! preprocessing, the QR detector and the stabilizer. [`session::ScanSession`]
//! runs a pipeline on a dedicated worker and publishes its results.

pub mod pipeline;
pub mod session;
pub mod stabilizer;
pub mod tasks;
pub mod types;

pub use pipeline::{FrameOutcome, FramePipeline};
pub use session::{ScanSession, SessionUpdate};
pub use stabilizer::{DetectionStabilizer, StabilizerState};
pub use tasks::qr_detector;
pub use types::{
    DetectionResult, FrameRegion, Point, QrAction, StabilizedDetection, WifiSecurity,
};
