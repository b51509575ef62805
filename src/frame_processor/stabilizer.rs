// SPDX-License-Identifier: GPL-3.0-only

//! Detection stabilizer
//!
//! Decoding succeeds on some frames and misses on others even when the code
//! never leaves the view. The stabilizer hides short gaps by re-reporting the
//! last hit for a hold window, and throttles how often decoding runs at all.
//!
//! All timestamps are monotonic [`Instant`]s supplied by the caller.

use super::types::{DetectionResult, StabilizedDetection};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Whether a detection is currently being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilizerState {
    /// No recent detection
    Idle,
    /// A detection is reported (fresh or held)
    Locked,
}

/// Per-session hold and throttle state
#[derive(Debug, Clone)]
pub struct DetectionStabilizer {
    throttle_interval: Duration,
    hold_interval: Duration,
    state: StabilizedDetection,
}

impl DetectionStabilizer {
    pub fn new(throttle_interval: Duration, hold_interval: Duration) -> Self {
        Self {
            throttle_interval,
            hold_interval,
            state: StabilizedDetection::default(),
        }
    }

    /// Throttle gate
    ///
    /// Returns `false` when the previous attempt started less than the
    /// throttle interval ago; the caller must then drop the frame without
    /// decoding. Returns `true` and records `now` as the latest attempt
    /// otherwise.
    pub fn try_begin_analysis(&mut self, now: Instant) -> bool {
        if let Some(last) = self.state.last_analysis_at
            && now.saturating_duration_since(last) < self.throttle_interval
        {
            trace!("Throttled analysis attempt");
            return false;
        }
        self.state.last_analysis_at = Some(now);
        true
    }

    /// Feed the outcome of one analysis attempt and get what to report
    ///
    /// A hit is reported as is and refreshes the hold window. A miss reports
    /// the previous hit while `now - last hit <= hold interval`, and `None`
    /// once that window has passed.
    pub fn observe(
        &mut self,
        now: Instant,
        result: Option<DetectionResult>,
    ) -> Option<DetectionResult> {
        if let Some(detection) = result {
            if self.state.last_detection.is_none() {
                debug!(text_len = detection.text.len(), "Detection locked");
            }
            self.state.last_detection = Some(detection.clone());
            self.state.last_detection_at = Some(now);
            return Some(detection);
        }

        if self.within_hold(now) {
            return self.state.last_detection.clone();
        }

        if self.state.last_detection.take().is_some() {
            debug!("Detection released after hold window");
        }
        None
    }

    fn within_hold(&self, now: Instant) -> bool {
        match (&self.state.last_detection, self.state.last_detection_at) {
            (Some(_), Some(at)) => now.saturating_duration_since(at) <= self.hold_interval,
            _ => false,
        }
    }

    /// Current state as seen at `now`
    pub fn state(&self, now: Instant) -> StabilizerState {
        if self.within_hold(now) {
            StabilizerState::Locked
        } else {
            StabilizerState::Idle
        }
    }

    /// Copy of the rolling state
    pub fn snapshot(&self) -> StabilizedDetection {
        self.state.clone()
    }

    /// Reset to idle with no remembered detection or attempt
    pub fn clear(&mut self) {
        self.state = StabilizedDetection::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_processor::types::Point;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn detection(text: &str) -> DetectionResult {
        let corners = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        DetectionResult::new(text.to_string(), corners, 100, 100).unwrap()
    }

    fn stabilizer() -> DetectionStabilizer {
        DetectionStabilizer::new(ms(360), ms(360))
    }

    #[test]
    fn test_hold_bridges_short_misses() {
        let mut stab = stabilizer();
        let t0 = Instant::now();
        let first = detection("A");
        let second = detection("B");

        let out: Vec<_> = [
            (0, Some(first.clone())),
            (100, None),
            (200, None),
            (300, Some(second.clone())),
        ]
        .into_iter()
        .map(|(offset, result)| stab.observe(t0 + ms(offset), result))
        .collect();

        assert_eq!(
            out,
            vec![Some(first.clone()), Some(first.clone()), Some(first), Some(second)]
        );
    }

    #[test]
    fn test_gap_beyond_hold_reports_none() {
        let mut stab = stabilizer();
        let t0 = Instant::now();
        let hit = detection("A");

        assert_eq!(stab.observe(t0, Some(hit.clone())), Some(hit.clone()));
        assert_eq!(stab.observe(t0 + ms(400), None), None);
        assert_eq!(stab.observe(t0 + ms(450), None), None);
        assert_eq!(stab.state(t0 + ms(450)), StabilizerState::Idle);
        assert_eq!(stab.observe(t0 + ms(500), Some(hit.clone())), Some(hit));
        assert_eq!(stab.state(t0 + ms(500)), StabilizerState::Locked);
    }

    #[test]
    fn test_hold_boundary_is_inclusive() {
        let mut stab = stabilizer();
        let t0 = Instant::now();
        stab.observe(t0, Some(detection("A")));
        assert!(stab.observe(t0 + ms(360), None).is_some());
        assert!(stab.observe(t0 + ms(361), None).is_none());
    }

    #[test]
    fn test_held_report_does_not_extend_window() {
        let mut stab = stabilizer();
        let t0 = Instant::now();
        stab.observe(t0, Some(detection("A")));
        assert!(stab.observe(t0 + ms(300), None).is_some());
        assert!(stab.observe(t0 + ms(600), None).is_none());
    }

    #[test]
    fn test_throttle_gate() {
        let mut stab = stabilizer();
        let t0 = Instant::now();
        assert!(stab.try_begin_analysis(t0));
        assert!(!stab.try_begin_analysis(t0 + ms(100)));
        assert!(!stab.try_begin_analysis(t0 + ms(359)));
        assert!(stab.try_begin_analysis(t0 + ms(360)));
        assert_eq!(stab.snapshot().last_analysis_at, Some(t0 + ms(360)));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut stab = stabilizer();
        let t0 = Instant::now();
        stab.try_begin_analysis(t0);
        stab.observe(t0, Some(detection("A")));
        stab.clear();
        assert_eq!(stab.snapshot(), StabilizedDetection::default());
        assert_eq!(stab.state(t0), StabilizerState::Idle);
        assert!(stab.try_begin_analysis(t0));
    }

    #[test]
    fn test_text_only_hit_is_held() {
        let mut stab = stabilizer();
        let t0 = Instant::now();
        let text_only = DetectionResult::new("T".to_string(), Vec::new(), 100, 100).unwrap();

        assert_eq!(stab.observe(t0, Some(text_only.clone())), Some(text_only.clone()));
        assert_eq!(stab.state(t0 + ms(100)), StabilizerState::Locked);
        assert_eq!(stab.observe(t0 + ms(200), None), Some(text_only));
    }
}
