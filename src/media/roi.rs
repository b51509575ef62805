// SPDX-License-Identifier: MPL-2.0

//! Centre crop region of interest
//!
//! QR codes are usually held near the middle of the preview. Cropping to a
//! centred sub-rectangle drops peripheral clutter while leaving room for the
//! quiet zone and slightly off-centre placement.

use super::luminance::LuminanceFrame;
use crate::errors::FrameError;

/// A centre crop and where it sits in the source frame
#[derive(Debug, Clone, PartialEq)]
pub struct CenterCrop {
    pub frame: LuminanceFrame,
    pub offset_x: u32,
    pub offset_y: u32,
}

/// Compute the crop rectangle `(offset_x, offset_y, crop_width, crop_height)`
///
/// Both crop sides are at least 1 pixel and never exceed the source sides.
pub fn center_crop_rect(width: u32, height: u32, scale: f32) -> (u32, u32, u32, u32) {
    let scale = if scale.is_finite() {
        scale.clamp(f32::MIN_POSITIVE, 1.0)
    } else {
        1.0
    };
    let crop_w = ((width as f32 * scale).round() as u32).clamp(1, width.max(1));
    let crop_h = ((height as f32 * scale).round() as u32).clamp(1, height.max(1));
    let offset_x = width.saturating_sub(crop_w) / 2;
    let offset_y = height.saturating_sub(crop_h) / 2;
    (offset_x, offset_y, crop_w, crop_h)
}

/// Crop `frame` to a centred sub-rectangle covering `scale` of each side
///
/// Detections found in the crop must be shifted by the returned offsets to
/// land back in full-frame coordinates; that is the caller's job.
pub fn select_center_crop(frame: &LuminanceFrame, scale: f32) -> Result<CenterCrop, FrameError> {
    let (offset_x, offset_y, crop_w, crop_h) = center_crop_rect(frame.width(), frame.height(), scale);
    let cropped = frame.crop(offset_x, offset_y, crop_w, crop_h)?;
    Ok(CenterCrop {
        frame: cropped,
        offset_x,
        offset_y,
    })
}
