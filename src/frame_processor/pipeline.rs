// SPDX-License-Identifier: GPL-3.0-only

//! Synchronous per-frame pipeline
//!
//! Validation, throttle gate, preprocessing, decoding and stabilization for
//! one camera frame. The pipeline is driven from a single thread; see
//! [`super::session`] for the async wrapper.

use super::stabilizer::DetectionStabilizer;
use super::tasks::QrDetector;
use super::types::DetectionResult;
use crate::backends::camera::types::CameraFrame;
use crate::config::ScanConfig;
use crate::errors::ScanResult;
use crate::media::preprocess;

/// What happened to one submitted frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Dropped by the throttle gate without decoding
    Skipped,
    /// Decoded; carries the stabilized detection to report (possibly held)
    Analyzed(Option<DetectionResult>),
}

impl FrameOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, FrameOutcome::Skipped)
    }

    /// Reported detection, if the frame was analyzed and something is shown
    pub fn detection(&self) -> Option<&DetectionResult> {
        match self {
            FrameOutcome::Analyzed(detection) => detection.as_ref(),
            FrameOutcome::Skipped => None,
        }
    }
}

/// Frame-to-detection pipeline for one scanning session
#[derive(Debug)]
pub struct FramePipeline {
    detector: QrDetector,
    stabilizer: DetectionStabilizer,
}

impl FramePipeline {
    /// Open the decoder and start with an idle stabilizer
    pub fn open(config: &ScanConfig) -> ScanResult<Self> {
        config.validate()?;
        let detector = QrDetector::open(config)?;
        Ok(Self::with_detector(detector, config))
    }

    /// Use an already opened detector
    pub fn with_detector(detector: QrDetector, config: &ScanConfig) -> Self {
        Self {
            detector,
            stabilizer: DetectionStabilizer::new(config.throttle_interval(), config.hold_interval()),
        }
    }

    /// Process one camera frame
    ///
    /// Malformed frames fail before the throttle gate so integration bugs
    /// surface even on frames that would have been skipped.
    pub fn process(&mut self, frame: &CameraFrame) -> ScanResult<FrameOutcome> {
        frame.validate()?;

        let now = frame.captured_at;
        if !self.stabilizer.try_begin_analysis(now) {
            return Ok(FrameOutcome::Skipped);
        }

        let upright = preprocess(frame)?;
        let raw = self.detector.detect(&upright)?;
        Ok(FrameOutcome::Analyzed(self.stabilizer.observe(now, raw)))
    }

    /// Number of decode attempts made so far
    pub fn decode_attempts(&self) -> u64 {
        self.detector.attempts()
    }

    pub fn stabilizer(&self) -> &DetectionStabilizer {
        &self.stabilizer
    }

    /// Forget the held detection and throttle timestamp
    pub fn clear(&mut self) {
        self.stabilizer.clear();
    }

    /// End of session: release the decoder and clear stabilizer state
    pub fn close(&mut self) {
        self.detector.close();
        self.stabilizer.clear();
    }
}
