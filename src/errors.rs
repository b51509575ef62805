// SPDX-License-Identifier: MPL-2.0

//! Error types for the scanning pipeline
//!
//! "No QR code in this frame" is not an error anywhere in this crate; it is
//! reported as `Ok(None)`. The types here cover the failures that indicate a
//! caller or integration bug (malformed input) or a broken scanning session
//! (resource unavailable).

use std::fmt;

/// Result type alias using ScanError
pub type ScanResult<T> = Result<T, ScanError>;

/// Main pipeline error type
#[derive(Debug, Clone, PartialEq)]
pub enum ScanError {
    /// Frame or view dimensions inconsistent with the data handed in
    InvalidFrame(FrameError),
    /// Decoder could not be opened or was used after close
    Decoder(DecoderError),
    /// Configuration errors
    Config(String),
    /// Image file could not be read or written
    Image(String),
    /// Scanning session failures (worker lost, shutdown timed out)
    Session(String),
    /// Storage/filesystem errors
    Storage(String),
}

/// Malformed-input errors
#[derive(Debug, Clone, PartialEq)]
pub enum FrameError {
    /// Width or height is zero
    ZeroDimension { width: u32, height: u32 },
    /// Buffer holds fewer bytes than the dimensions require
    BufferTooSmall { expected: usize, actual: usize },
    /// Buffer length differs from width * height
    SizeMismatch { expected: usize, actual: usize },
    /// Row stride shorter than the logical row width
    StrideTooSmall { stride: u32, width: u32 },
    /// Rotation that is not a multiple of 90 degrees
    InvalidRotation(i32),
    /// Crop rectangle falls outside the frame
    CropOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    /// Overlay view with zero or negative size
    InvalidView { width: f32, height: f32 },
    /// Corner list that is neither empty nor exactly four points
    InvalidCornerCount(usize),
}

/// Decoder resource errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderError {
    /// Decoder failed to initialize
    ResourceUnavailable(String),
    /// Decoder used after `close()`
    Closed,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::InvalidFrame(e) => write!(f, "Invalid frame: {}", e),
            ScanError::Decoder(e) => write!(f, "Decoder error: {}", e),
            ScanError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ScanError::Image(msg) => write!(f, "Image error: {}", msg),
            ScanError::Session(msg) => write!(f, "Session error: {}", msg),
            ScanError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::ZeroDimension { width, height } => {
                write!(f, "zero-sized frame {}x{}", width, height)
            }
            FrameError::BufferTooSmall { expected, actual } => write!(
                f,
                "buffer too small: need {} bytes, got {}",
                expected, actual
            ),
            FrameError::SizeMismatch { expected, actual } => write!(
                f,
                "buffer size mismatch: expected {} bytes, got {}",
                expected, actual
            ),
            FrameError::StrideTooSmall { stride, width } => {
                write!(f, "row stride {} is smaller than width {}", stride, width)
            }
            FrameError::InvalidRotation(degrees) => {
                write!(f, "rotation {} is not a multiple of 90 degrees", degrees)
            }
            FrameError::CropOutOfBounds {
                x,
                y,
                width,
                height,
            } => write!(
                f,
                "crop {}x{} at ({}, {}) exceeds frame bounds",
                width, height, x, y
            ),
            FrameError::InvalidView { width, height } => {
                write!(f, "invalid view size {}x{}", width, height)
            }
            FrameError::InvalidCornerCount(count) => {
                write!(f, "expected 0 or 4 corner points, got {}", count)
            }
        }
    }
}

impl fmt::Display for DecoderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecoderError::ResourceUnavailable(msg) => write!(f, "Decoder unavailable: {}", msg),
            DecoderError::Closed => write!(f, "Decoder is closed"),
        }
    }
}

impl std::error::Error for ScanError {}
impl std::error::Error for FrameError {}
impl std::error::Error for DecoderError {}

impl ScanError {
    /// Whether this error means the caller handed in malformed data
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, ScanError::InvalidFrame(_))
    }
}

// Conversions from sub-errors to ScanError
impl From<FrameError> for ScanError {
    fn from(err: FrameError) -> Self {
        ScanError::InvalidFrame(err)
    }
}

impl From<DecoderError> for ScanError {
    fn from(err: DecoderError) -> Self {
        ScanError::Decoder(err)
    }
}

impl From<image::ImageError> for ScanError {
    fn from(err: image::ImageError) -> Self {
        ScanError::Image(err.to_string())
    }
}

impl From<serde_json::Error> for ScanError {
    fn from(err: serde_json::Error) -> Self {
        ScanError::Config(err.to_string())
    }
}

// Conversions for I/O errors
impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        ScanError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_error_is_malformed_input() {
        let err: ScanError = FrameError::StrideTooSmall {
            stride: 10,
            width: 12,
        }
        .into();
        assert!(err.is_malformed_input());
        assert_eq!(
            err.to_string(),
            "Invalid frame: row stride 10 is smaller than width 12"
        );
    }

    #[test]
    fn test_decoder_error_is_not_malformed_input() {
        let err: ScanError = DecoderError::Closed.into();
        assert!(!err.is_malformed_input());
        assert_eq!(err.to_string(), "Decoder error: Decoder is closed");
    }

    #[test]
    fn test_invalid_view_compares_by_value() {
        let err: ScanError = FrameError::InvalidView {
            width: 0.0,
            height: 480.0,
        }
        .into();
        assert!(err.is_malformed_input());
        assert_eq!(
            err,
            ScanError::InvalidFrame(FrameError::InvalidView {
                width: 0.0,
                height: 480.0
            })
        );
        assert_ne!(
            err,
            ScanError::InvalidFrame(FrameError::InvalidView {
                width: 1.0,
                height: 480.0
            })
        );
    }
}
