// SPDX-License-Identifier: MPL-2.0

//! Luminance frames and lossless frame preprocessing
//!
//! Camera planes usually carry row padding up to an alignment boundary, so the
//! first step is always to copy the logical `width` bytes of each row into a
//! contiguous buffer. The second step rotates the frame by a multiple of 90°
//! so decoded geometry matches display orientation. Both steps are exact pixel
//! permutations; nothing is interpolated.

use crate::backends::camera::types::{CameraFrame, SensorRotation};
use crate::errors::FrameError;
use image::GrayImage;
use std::sync::Arc;
use tracing::trace;

/// Row-major grid of 8-bit intensity samples without stride padding
///
/// Frames are immutable once built; every transform returns a new frame.
#[derive(Clone, PartialEq, Eq)]
pub struct LuminanceFrame {
    width: u32,
    height: u32,
    data: Arc<[u8]>,
}

impl std::fmt::Debug for LuminanceFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LuminanceFrame({}x{})", self.width, self.height)
    }
}

impl LuminanceFrame {
    /// Wrap a contiguous buffer of exactly `width * height` samples
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        check_dimensions(width, height)?;
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(FrameError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data: data.into(),
        })
    }

    /// Frame with every sample set to `value`
    pub fn filled(width: u32, height: u32, value: u8) -> Result<Self, FrameError> {
        Self::new(width, height, vec![value; width as usize * height as usize])
    }

    /// Copy `height` rows of `width` bytes out of a strided plane
    ///
    /// Row `i` starts at byte `i * row_stride`. Padding bytes are never read
    /// into the result.
    pub fn from_plane(
        plane: &[u8],
        row_stride: u32,
        width: u32,
        height: u32,
    ) -> Result<Self, FrameError> {
        check_dimensions(width, height)?;
        let (w, h, stride) = (width as usize, height as usize, row_stride as usize);
        check_plane(plane.len(), stride, w, h)?;

        if stride == w {
            return Self::new(width, height, plane[..w * h].to_vec());
        }

        let mut data = Vec::with_capacity(w * h);
        for row in 0..h {
            let start = row * stride;
            data.extend_from_slice(&plane[start..start + w]);
        }
        Self::new(width, height, data)
    }

    /// Convert a strided RGBA plane to luminance
    pub fn from_rgba_plane(
        plane: &[u8],
        row_stride: u32,
        width: u32,
        height: u32,
    ) -> Result<Self, FrameError> {
        check_dimensions(width, height)?;
        let (w, h, stride) = (width as usize, height as usize, row_stride as usize);
        check_plane(plane.len(), stride, w * 4, h)?;

        let mut data = Vec::with_capacity(w * h);
        for row in 0..h {
            let start = row * stride;
            for px in plane[start..start + w * 4].chunks_exact(4) {
                data.push(luma_bt601(px[0], px[1], px[2]));
            }
        }
        Self::new(width, height, data)
    }

    /// Convert packed RGB pixels (3 bytes per pixel) to luminance
    pub fn from_rgb(rgb: &[u8], width: u32, height: u32) -> Result<Self, FrameError> {
        check_dimensions(width, height)?;
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            return Err(FrameError::SizeMismatch {
                expected,
                actual: rgb.len(),
            });
        }
        let data = rgb
            .chunks_exact(3)
            .map(|px| luma_bt601(px[0], px[1], px[2]))
            .collect();
        Self::new(width, height, data)
    }

    /// Copy into an `image` grayscale buffer (for saving or debugging)
    pub fn to_gray_image(&self) -> GrayImage {
        // Dimensions always match the buffer, so this never falls back
        GrayImage::from_raw(self.width, self.height, self.data.to_vec())
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw samples, row-major
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Sample at (x, y); callers keep coordinates in range
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// One row of samples
    pub fn row(&self, y: u32) -> &[u8] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.data[start..start + w]
    }

    /// Rotate clockwise by a multiple of 90°
    ///
    /// `None` shares the buffer with `self`. 90° and 270° swap the dimensions.
    pub fn rotate(&self, rotation: SensorRotation) -> Self {
        let (w, h) = (self.width as usize, self.height as usize);
        let src = &self.data;

        let (data, width, height) = match rotation {
            SensorRotation::None => return self.clone(),
            SensorRotation::Rotate90 => {
                // (x, y) -> (h - 1 - y, x), destination row length is h
                let mut out = vec![0u8; w * h];
                for y in 0..h {
                    let src_row = y * w;
                    let nx = h - 1 - y;
                    for x in 0..w {
                        out[x * h + nx] = src[src_row + x];
                    }
                }
                (out, self.height, self.width)
            }
            SensorRotation::Rotate180 => {
                // (x, y) -> (w - 1 - x, h - 1 - y)
                let mut out = vec![0u8; w * h];
                for y in 0..h {
                    let src_row = y * w;
                    let dst_row = (h - 1 - y) * w;
                    for x in 0..w {
                        out[dst_row + (w - 1 - x)] = src[src_row + x];
                    }
                }
                (out, self.width, self.height)
            }
            SensorRotation::Rotate270 => {
                // (x, y) -> (y, w - 1 - x), destination row length is h
                let mut out = vec![0u8; w * h];
                for y in 0..h {
                    let src_row = y * w;
                    for x in 0..w {
                        out[(w - 1 - x) * h + y] = src[src_row + x];
                    }
                }
                (out, self.height, self.width)
            }
        };

        Self {
            width,
            height,
            data: data.into(),
        }
    }

    /// Copy out a sub-rectangle
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Result<Self, FrameError> {
        check_dimensions(width, height)?;
        let fits_x = x.checked_add(width).is_some_and(|r| r <= self.width);
        let fits_y = y.checked_add(height).is_some_and(|b| b <= self.height);
        if !fits_x || !fits_y {
            return Err(FrameError::CropOutOfBounds {
                x,
                y,
                width,
                height,
            });
        }
        if x == 0 && y == 0 && width == self.width && height == self.height {
            return Ok(self.clone());
        }

        let (x, w) = (x as usize, width as usize);
        let mut data = Vec::with_capacity(w * height as usize);
        for row in y..y + height {
            data.extend_from_slice(&self.row(row)[x..x + w]);
        }
        Self::new(width, height, data)
    }
}

/// Frame Preprocessor: de-stride a luminance plane, then rotate it
pub fn extract_and_rotate(
    plane: &[u8],
    row_stride: u32,
    width: u32,
    height: u32,
    rotation: SensorRotation,
) -> Result<LuminanceFrame, FrameError> {
    let contiguous = LuminanceFrame::from_plane(plane, row_stride, width, height)?;
    Ok(contiguous.rotate(rotation))
}

/// Turn a camera frame into an upright luminance frame
pub fn preprocess(frame: &CameraFrame) -> Result<LuminanceFrame, FrameError> {
    frame.validate()?;

    let upright = if frame.format.is_luma_plane() {
        extract_and_rotate(
            &frame.data,
            frame.stride,
            frame.width,
            frame.height,
            frame.rotation,
        )?
    } else {
        LuminanceFrame::from_rgba_plane(&frame.data, frame.stride, frame.width, frame.height)?
            .rotate(frame.rotation)
    };

    trace!(
        src_width = frame.width,
        src_height = frame.height,
        stride = frame.stride,
        rotation = frame.rotation.degrees(),
        width = upright.width(),
        height = upright.height(),
        "Preprocessed camera frame"
    );

    Ok(upright)
}

/// ITU-R BT.601 luminance: (77R + 150G + 29B) >> 8
pub fn luma_bt601(r: u8, g: u8, b: u8) -> u8 {
    ((77 * r as u32 + 150 * g as u32 + 29 * b as u32) >> 8) as u8
}

fn check_dimensions(width: u32, height: u32) -> Result<(), FrameError> {
    if width == 0 || height == 0 {
        return Err(FrameError::ZeroDimension { width, height });
    }
    Ok(())
}

fn check_plane(len: usize, stride: usize, row_bytes: usize, rows: usize) -> Result<(), FrameError> {
    if stride < row_bytes {
        return Err(FrameError::StrideTooSmall {
            stride: stride as u32,
            width: row_bytes as u32,
        });
    }
    let expected = stride * (rows - 1) + row_bytes;
    if len < expected {
        return Err(FrameError::BufferTooSmall {
            expected,
            actual: len,
        });
    }
    Ok(())
}
