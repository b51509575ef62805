// SPDX-License-Identifier: MPL-2.0

//! Overlay corner animation
//!
//! Pure functions of time: nothing here owns a timer. The renderer samples
//! [`CornerAnimation`] once per tick with the current instant.

use super::Quad;
use crate::frame_processor::types::Point;
use std::time::{Duration, Instant};

/// Control points of the fast-out-slow-in cubic Bézier curve
const EASE_X1: f32 = 0.4;
const EASE_Y1: f32 = 0.0;
const EASE_X2: f32 = 0.2;
const EASE_Y2: f32 = 1.0;

fn cubic_bezier(p1: f32, p2: f32, s: f32) -> f32 {
    let inv = 1.0 - s;
    3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
}

/// Fast-out-slow-in easing for `t` in [0, 1]
///
/// Solves the curve's x(s) = t by bisection (x is monotonic for these
/// control points) and returns y(s).
pub fn fast_out_slow_in(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t == 0.0 || t == 1.0 {
        return t;
    }
    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    for _ in 0..32 {
        let mid = (lo + hi) / 2.0;
        if cubic_bezier(EASE_X1, EASE_X2, mid) < t {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    cubic_bezier(EASE_Y1, EASE_Y2, (lo + hi) / 2.0)
}

fn lerp(a: Point, b: Point, t: f32) -> Point {
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

/// Corners at `fraction` of the way from `previous` to `target`
///
/// `fraction` is elapsed time over duration; easing is applied here. Every
/// corner uses the same eased fraction so the shape never skews mid-glide.
pub fn interpolate(previous: &Quad, target: &Quad, fraction: f32) -> Quad {
    let eased = fast_out_slow_in(fraction);
    if eased >= 1.0 {
        return *target;
    }
    let mut corners = previous.corners;
    for (corner, goal) in corners.iter_mut().zip(target.corners) {
        *corner = lerp(*corner, goal, eased);
    }
    Quad::new(corners)
}

/// A glide from one quad to another over a fixed duration
#[derive(Debug, Clone, PartialEq)]
pub struct CornerAnimation {
    from: Quad,
    to: Quad,
    started_at: Instant,
    duration: Duration,
}

impl CornerAnimation {
    /// An animation at rest on `initial`
    pub fn new(initial: Quad, now: Instant, duration: Duration) -> Self {
        Self {
            from: initial,
            to: initial,
            started_at: now,
            duration,
        }
    }

    pub fn target(&self) -> &Quad {
        &self.to
    }

    fn fraction(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    /// Corners to draw at `now`
    pub fn sample(&self, now: Instant) -> Quad {
        interpolate(&self.from, &self.to, self.fraction(now))
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.fraction(now) >= 1.0
    }

    /// Start gliding towards `target` from wherever the corners are at `now`
    ///
    /// Retargeting to the current target is a no-op so repeated identical
    /// detections do not restart the glide.
    pub fn retarget(&mut self, now: Instant, target: Quad) {
        if target == self.to {
            return;
        }
        self.from = self.sample(now);
        self.to = target;
        self.started_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_easing_endpoints_and_shape() {
        assert_eq!(fast_out_slow_in(0.0), 0.0);
        assert_eq!(fast_out_slow_in(1.0), 1.0);
        // Fast start: ahead of linear at the midpoint
        assert!(fast_out_slow_in(0.5) > 0.5);
        let mut last = 0.0;
        for step in 1..=20 {
            let value = fast_out_slow_in(step as f32 / 20.0);
            assert!(value >= last);
            last = value;
        }
    }

    #[test]
    fn test_interpolate_endpoints() {
        let a = Quad::square(0.0, 0.0, 10.0);
        let b = Quad::square(100.0, 50.0, 30.0);
        assert_eq!(interpolate(&a, &b, 0.0), a);
        assert_eq!(interpolate(&a, &b, 1.0), b);
    }

    #[test]
    fn test_corners_move_in_lockstep() {
        let a = Quad::square(0.0, 0.0, 10.0);
        let b = Quad::square(100.0, 0.0, 10.0);
        let mid = interpolate(&a, &b, 0.3);
        let shift = mid.corners[0].x - a.corners[0].x;
        for (m, start) in mid.corners.iter().zip(a.corners) {
            assert!((m.x - start.x - shift).abs() < 1e-4);
        }
    }

    #[test]
    fn test_animation_completes_after_duration() {
        let t0 = Instant::now();
        let a = Quad::square(0.0, 0.0, 10.0);
        let b = Quad::square(50.0, 50.0, 10.0);
        let mut anim = CornerAnimation::new(a, t0, ms(260));
        anim.retarget(t0, b);
        assert_eq!(anim.sample(t0), a);
        assert!(!anim.is_finished(t0 + ms(100)));
        assert_eq!(anim.sample(t0 + ms(260)), b);
        assert!(anim.is_finished(t0 + ms(300)));
    }

    #[test]
    fn test_retarget_starts_from_current_position() {
        let t0 = Instant::now();
        let a = Quad::square(0.0, 0.0, 10.0);
        let b = Quad::square(100.0, 0.0, 10.0);
        let c = Quad::square(100.0, 100.0, 10.0);
        let mut anim = CornerAnimation::new(a, t0, ms(260));
        anim.retarget(t0, b);
        let midway = anim.sample(t0 + ms(130));
        anim.retarget(t0 + ms(130), c);
        assert_eq!(anim.sample(t0 + ms(130)), midway);
        assert_eq!(anim.target(), &c);
    }
}
