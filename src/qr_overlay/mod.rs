// SPDX-License-Identifier: MPL-2.0

//! QR code overlay geometry
//!
//! This module turns detections into the quadrilateral a preview overlay
//! should draw. It includes:
//!
//! - Mapping from image pixels to view pixels for a centre-cropped preview
//! - Canonical clockwise corner ordering
//! - The idle square shown while nothing is detected, and the grace period
//!   before returning to it
//! - Corner reticle segments
//!
//! # Coordinate System
//!
//! Detections are in pixels of the upright camera frame. The view is the
//! on-screen preview in physical pixels; `density` converts dp to pixels.
//! When the aspect ratios differ the preview fills the view and overflows on
//! one axis, so offsets can be negative.

pub mod animation;

use crate::config::OverlayConfig;
use crate::constants::{OverlayStyle, overlay};
use crate::errors::{FrameError, ScanResult};
use crate::frame_processor::types::{DetectionResult, Point, bounding_box};
use std::time::{Duration, Instant};
use tracing::trace;

/// On-screen preview size in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSize {
    pub width: f32,
    pub height: f32,
    /// Pixels per density-independent pixel
    pub density: f32,
}

impl ViewSize {
    pub fn new(width: f32, height: f32, density: f32) -> Result<Self, FrameError> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) || !valid(density) {
            return Err(FrameError::InvalidView { width, height });
        }
        Ok(Self {
            width,
            height,
            density,
        })
    }

    /// Convert density-independent pixels to pixels
    pub fn dp(&self, value: f32) -> f32 {
        value * self.density
    }

    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }
}

/// Uniform scale plus offset from image pixels to view pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl ViewTransform {
    pub fn map(&self, point: Point) -> Point {
        Point::new(
            self.offset_x + point.x * self.scale,
            self.offset_y + point.y * self.scale,
        )
    }
}

/// Calculate the image-to-view transform
///
/// Matching aspect ratios scale exactly onto the view. Otherwise the image is
/// scaled to cover the view and centred, cropping the overflow.
pub fn calculate_view_transform(
    image_width: u32,
    image_height: u32,
    view: &ViewSize,
) -> Result<ViewTransform, FrameError> {
    if image_width == 0 || image_height == 0 {
        return Err(FrameError::ZeroDimension {
            width: image_width,
            height: image_height,
        });
    }
    let (iw, ih) = (image_width as f32, image_height as f32);
    let image_aspect = iw / ih;
    let view_aspect = view.width / view.height;

    if (image_aspect - view_aspect).abs() < overlay::ASPECT_TOLERANCE {
        return Ok(ViewTransform {
            scale: view.width / iw,
            offset_x: 0.0,
            offset_y: 0.0,
        });
    }

    let scale = (view.width / iw).max(view.height / ih);
    Ok(ViewTransform {
        scale,
        offset_x: (view.width - iw * scale) / 2.0,
        offset_y: (view.height - ih * scale) / 2.0,
    })
}

/// Map image points into view space
pub fn map_points_to_view(
    points: &[Point],
    image_width: u32,
    image_height: u32,
    view: &ViewSize,
) -> Result<Vec<Point>, FrameError> {
    let transform = calculate_view_transform(image_width, image_height, view)?;
    Ok(points.iter().map(|&p| transform.map(p)).collect())
}

/// Order four corners clockwise on screen, starting nearest the top-left
///
/// Points are sorted by angle around their centroid, then rotated so the
/// point with the smallest `x + y` comes first. The result does not depend
/// on the input order for convex quadrilaterals.
pub fn order_corners_clockwise(points: [Point; 4]) -> [Point; 4] {
    let cx = points.iter().map(|p| p.x).sum::<f32>() / 4.0;
    let cy = points.iter().map(|p| p.y).sum::<f32>() / 4.0;

    let mut sorted = points;
    sorted.sort_by(|a, b| {
        let angle_a = (a.y - cy).atan2(a.x - cx);
        let angle_b = (b.y - cy).atan2(b.x - cx);
        angle_a.total_cmp(&angle_b)
    });

    let mut start = 0;
    for (i, p) in sorted.iter().enumerate() {
        if p.x + p.y < sorted[start].x + sorted[start].y {
            start = i;
        }
    }
    sorted.rotate_left(start);
    sorted
}

/// Four view-space corners the overlay should show
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub corners: [Point; 4],
}

impl Quad {
    pub fn new(corners: [Point; 4]) -> Self {
        Self { corners }
    }

    /// Axis-aligned square centred on (`cx`, `cy`)
    pub fn square(cx: f32, cy: f32, side: f32) -> Self {
        let half = side / 2.0;
        Self::new([
            Point::new(cx - half, cy - half),
            Point::new(cx + half, cy - half),
            Point::new(cx + half, cy + half),
            Point::new(cx - half, cy + half),
        ])
    }

    pub fn centroid(&self) -> Point {
        let sum = self
            .corners
            .iter()
            .fold(Point::default(), |acc, p| acc.translate(p.x, p.y));
        Point::new(sum.x / 4.0, sum.y / 4.0)
    }

    /// Bounding rectangle as (x, y, width, height)
    pub fn bounding_rect(&self) -> (f32, f32, f32, f32) {
        let (x0, y0, x1, y1) =
            bounding_box(&self.corners).unwrap_or((0.0, 0.0, 0.0, 0.0));
        (x0, y0, x1 - x0, y1 - y0)
    }
}

/// Centred idle square: `ratio * min(view)` clamped to [min, max] dp
pub fn idle_target(view: &ViewSize, config: &OverlayConfig) -> Quad {
    let lower = view.dp(config.idle_min_dp);
    let upper = view.dp(config.idle_max_dp).max(lower);
    let side = (config.idle_size_ratio * view.min_side()).clamp(lower, upper);
    Quad::square(view.width / 2.0, view.height / 2.0, side)
}

/// Axis-aligned square around a mapped quad, padded and kept inside the view
pub fn square_target(quad: &Quad, view: &ViewSize, padding_dp: f32) -> Quad {
    let (_, _, width, height) = quad.bounding_rect();
    let side = (width.max(height) + 2.0 * view.dp(padding_dp)).min(view.min_side());
    let half = side / 2.0;
    let center = quad.centroid();
    let cx = center.x.clamp(half, view.width - half);
    let cy = center.y.clamp(half, view.height - half);
    Quad::square(cx, cy, side)
}

/// View-space target for a detection
///
/// Returns `None` when there is no detection or it carries no geometry; the
/// caller then falls back to idle logic.
pub fn compute_target(
    view: &ViewSize,
    detection: Option<&DetectionResult>,
    config: &OverlayConfig,
) -> ScanResult<Option<Quad>> {
    let Some(detection) = detection else {
        return Ok(None);
    };
    let Ok(corners) = <[Point; 4]>::try_from(detection.corners.as_slice()) else {
        return Ok(None);
    };

    let transform =
        calculate_view_transform(detection.image_width, detection.image_height, view)?;
    let mapped = order_corners_clockwise(corners.map(|p| transform.map(p)));
    let quad = Quad::new(mapped);

    Ok(Some(match config.style {
        OverlayStyle::Quad => quad,
        OverlayStyle::Square => square_target(&quad, view, config.square_padding_dp),
    }))
}

/// Keeps the last target alive through short gaps before going idle
#[derive(Debug, Clone)]
pub struct OverlayTracker {
    config: OverlayConfig,
    reset_delay: Duration,
    last_target: Option<Quad>,
    last_detection_at: Option<Instant>,
}

impl OverlayTracker {
    pub fn new(config: OverlayConfig, reset_delay: Duration) -> Self {
        Self {
            config,
            reset_delay,
            last_target: None,
            last_detection_at: None,
        }
    }

    /// Target to display at `now`
    ///
    /// A usable detection becomes the new target. Without one, the previous
    /// target is kept until `reset_delay` has passed since the last usable
    /// detection, then the idle square takes over.
    pub fn update(
        &mut self,
        now: Instant,
        view: &ViewSize,
        detection: Option<&DetectionResult>,
    ) -> ScanResult<Quad> {
        if let Some(target) = compute_target(view, detection, &self.config)? {
            self.last_target = Some(target);
            self.last_detection_at = Some(now);
            return Ok(target);
        }

        if let (Some(target), Some(at)) = (self.last_target, self.last_detection_at)
            && now.saturating_duration_since(at) < self.reset_delay
        {
            return Ok(target);
        }

        if self.last_target.take().is_some() {
            trace!("Overlay returned to idle");
        }
        Ok(idle_target(view, &self.config))
    }

    /// Forget the last target (session ended)
    pub fn clear(&mut self) {
        self.last_target = None;
        self.last_detection_at = None;
    }
}

/// Short corner brackets along the edges of a quad
///
/// Two segments per corner, each running from the corner towards a
/// neighbour. Arm length is a fraction of the shorter adjacent edge, clamped
/// to [12 dp, 64 dp].
pub fn reticle_segments(quad: &Quad, density: f32) -> Vec<(Point, Point)> {
    let lower = overlay::RETICLE_MIN_DP * density;
    let upper = overlay::RETICLE_MAX_DP * density;
    let corners = &quad.corners;
    let mut segments = Vec::with_capacity(8);

    for i in 0..4 {
        let corner = corners[i];
        let next = corners[(i + 1) % 4];
        let prev = corners[(i + 3) % 4];
        let to_next = distance(corner, next);
        let to_prev = distance(corner, prev);
        let arm = (overlay::RETICLE_ARM_RATIO * to_next.min(to_prev)).clamp(lower, upper);

        for (neighbour, length) in [(next, to_next), (prev, to_prev)] {
            if length <= f32::EPSILON {
                continue;
            }
            let t = arm / length;
            let end = Point::new(
                corner.x + (neighbour.x - corner.x) * t,
                corner.y + (neighbour.y - corner.y) * t,
            );
            segments.push((corner, end));
        }
    }
    segments
}

fn distance(a: Point, b: Point) -> f32 {
    (b.x - a.x).hypot(b.y - a.y)
}
