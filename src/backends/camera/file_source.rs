// SPDX-License-Identifier: GPL-3.0-only

//! Frame source backed by image files
//!
//! Replays a directory of captured frames as if they came from a camera:
//! luminance planes padded to an aligned row stride, a fixed sensor rotation
//! and synthetic monotonic timestamps at a fixed frame rate.

use super::types::{CameraFrame, SensorRotation};
use crate::constants::file_formats;
use crate::errors::{ScanError, ScanResult};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Row alignment applied to generated planes
pub const STRIDE_ALIGNMENT: u32 = 64;

/// Round `width` up to a multiple of `alignment`
pub fn aligned_stride(width: u32, alignment: u32) -> u32 {
    width.div_ceil(alignment.max(1)) * alignment.max(1)
}

/// Load an image file as a padded Gray8 camera frame
pub fn load_image_as_frame(
    path: &Path,
    rotation: SensorRotation,
    captured_at: Instant,
) -> ScanResult<CameraFrame> {
    let img = image::open(path).map_err(|e| {
        ScanError::Image(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let gray = img.to_luma8();
    let (width, height) = gray.dimensions();
    let stride = aligned_stride(width, STRIDE_ALIGNMENT);

    let mut plane = vec![0u8; stride as usize * height as usize];
    for (y, row) in gray.as_raw().chunks_exact(width as usize).enumerate() {
        let start = y * stride as usize;
        plane[start..start + width as usize].copy_from_slice(row);
    }

    debug!(path = %path.display(), width, height, stride, "Loaded image frame");
    Ok(CameraFrame::from_luma_plane(
        plane,
        width,
        height,
        stride,
        rotation,
        captured_at,
    ))
}

/// Supported image files in `dir`, sorted by file name
pub fn list_image_files(dir: &Path) -> ScanResult<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(file_formats::is_image_extension)
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Iterator over the image files of a directory as camera frames
#[derive(Debug)]
pub struct FileFrameSource {
    files: Vec<PathBuf>,
    next: usize,
    rotation: SensorRotation,
    frame_interval: Duration,
    start: Instant,
}

impl FileFrameSource {
    /// Open `dir` and replay it at `fps` frames per second
    pub fn open(dir: &Path, fps: f32, rotation: SensorRotation) -> ScanResult<Self> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(ScanError::Config(format!(
                "frame rate must be positive, got {}",
                fps
            )));
        }
        let files = list_image_files(dir)?;
        info!(dir = %dir.display(), count = files.len(), fps, %rotation, "Opened file frame source");
        Ok(Self {
            files,
            next: 0,
            rotation,
            frame_interval: Duration::from_nanos((1e9 / fps as f64).round() as u64),
            start: Instant::now(),
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Path of the frame returned by the last call to `next`
    pub fn current_path(&self) -> Option<&Path> {
        self.next
            .checked_sub(1)
            .and_then(|i| self.files.get(i))
            .map(PathBuf::as_path)
    }

    /// Synthetic capture time of frame `index`
    pub fn timestamp(&self, index: usize) -> Instant {
        self.start + self.frame_interval * index as u32
    }
}

impl Iterator for FileFrameSource {
    type Item = ScanResult<CameraFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next;
        let path = self.files.get(index)?;
        self.next += 1;
        Some(load_image_as_frame(path, self.rotation, self.timestamp(index)))
    }
}
