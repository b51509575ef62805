// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera frame input

//! Shared types for camera frames handed to the scanner

use crate::errors::FrameError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Pixel layout of the first plane of a camera frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PixelFormat {
    /// NV12 - the first plane is the full-resolution Y plane
    #[default]
    NV12,
    /// I420 - the first plane is the full-resolution Y plane
    I420,
    /// Gray8 - 8-bit grayscale (single channel)
    Gray8,
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    RGBA,
}

impl PixelFormat {
    /// Bytes per pixel in the first plane
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::NV12 | PixelFormat::I420 | PixelFormat::Gray8 => 1,
            PixelFormat::RGBA => 4,
        }
    }

    /// Whether the first plane already holds luminance samples
    pub fn is_luma_plane(&self) -> bool {
        !matches!(self, PixelFormat::RGBA)
    }
}

/// Sensor rotation in degrees (clockwise)
///
/// Camera sensors may be physically mounted at various angles relative to the device.
/// This is common on mobile devices where sensors are rotated 90° or 270° relative
/// to the display orientation. Frames are rotated by this amount before decoding so
/// that decoded geometry lines up with what the user sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SensorRotation {
    /// No rotation (sensor is oriented correctly)
    #[default]
    None,
    /// 90 degrees clockwise
    Rotate90,
    /// 180 degrees (upside down)
    Rotate180,
    /// 270 degrees clockwise (90 degrees counter-clockwise)
    Rotate270,
}

impl SensorRotation {
    /// Create rotation from an integer degree value (normalised to 0-360).
    ///
    /// Values that are not a multiple of 90 after normalisation are rejected.
    pub fn from_degrees_int(degrees: i32) -> Result<Self, FrameError> {
        match degrees.rem_euclid(360) {
            0 => Ok(SensorRotation::None),
            90 => Ok(SensorRotation::Rotate90),
            180 => Ok(SensorRotation::Rotate180),
            270 => Ok(SensorRotation::Rotate270),
            _ => Err(FrameError::InvalidRotation(degrees)),
        }
    }

    /// Get the rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            SensorRotation::None => 0,
            SensorRotation::Rotate90 => 90,
            SensorRotation::Rotate180 => 180,
            SensorRotation::Rotate270 => 270,
        }
    }

    /// Rotation that undoes this one
    pub fn inverse(&self) -> Self {
        match self {
            SensorRotation::None => SensorRotation::None,
            SensorRotation::Rotate90 => SensorRotation::Rotate270,
            SensorRotation::Rotate180 => SensorRotation::Rotate180,
            SensorRotation::Rotate270 => SensorRotation::Rotate90,
        }
    }
}

impl std::fmt::Display for SensorRotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// A single frame delivered by the camera subsystem
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// First plane data: Y plane (NV12/I420/Gray8) or RGBA pixels
    pub data: Arc<[u8]>,
    /// Pixel format of the data
    pub format: PixelFormat,
    /// Row stride for the plane (bytes per row, may include padding)
    pub stride: u32,
    /// Clockwise rotation needed to match display orientation
    pub rotation: SensorRotation,
    /// Monotonic capture time, drives throttling and hold windows
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Create a frame from a luminance plane
    pub fn from_luma_plane(
        data: impl Into<Arc<[u8]>>,
        width: u32,
        height: u32,
        stride: u32,
        rotation: SensorRotation,
        captured_at: Instant,
    ) -> Self {
        Self {
            width,
            height,
            data: data.into(),
            format: PixelFormat::Gray8,
            stride,
            rotation,
            captured_at,
        }
    }

    /// Logical row width in bytes (without stride padding)
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel() as usize
    }

    /// Check that stride and buffer length can hold the declared dimensions
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::ZeroDimension {
                width: self.width,
                height: self.height,
            });
        }
        let row_bytes = self.row_bytes();
        if (self.stride as usize) < row_bytes {
            return Err(FrameError::StrideTooSmall {
                stride: self.stride,
                width: row_bytes as u32,
            });
        }
        // The last row does not need to carry trailing padding
        let expected = self.stride as usize * (self.height as usize - 1) + row_bytes;
        if self.data.len() < expected {
            return Err(FrameError::BufferTooSmall {
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }
}
