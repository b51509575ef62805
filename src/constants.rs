// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};

/// Binarization strategy used before handing a frame to the symbol decoder
///
/// Strategies are tried in the configured order; the next one only runs when
/// the previous one found nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinarizerKind {
    /// Block-local threshold, robust to uneven lighting
    Hybrid,
    /// Single global threshold from the luminance histogram
    GlobalHistogram,
}

impl BinarizerKind {
    /// All strategies in their default priority order
    pub const ALL: [BinarizerKind; 2] = [BinarizerKind::Hybrid, BinarizerKind::GlobalHistogram];

    /// Get display name for the strategy
    pub fn display_name(&self) -> &'static str {
        match self {
            BinarizerKind::Hybrid => "Hybrid",
            BinarizerKind::GlobalHistogram => "Global histogram",
        }
    }
}

/// Shape the overlay draws around a detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverlayStyle {
    /// Perspective quadrilateral through the four symbol corners
    #[default]
    Quad,
    /// Axis-aligned square centred on the symbol
    Square,
}

/// Live scanning timing defaults
pub mod timing {
    /// Minimum time between two decode attempts
    pub const THROTTLE_INTERVAL_MS: u64 = 360;

    /// How long a lost detection keeps being reported
    pub const HOLD_INTERVAL_MS: u64 = 360;

    /// How long the overlay waits before returning to the idle square
    pub const RESET_DELAY_MS: u64 = 1000;

    /// Corner glide duration for the overlay
    pub const ANIMATION_DURATION_MS: u64 = 260;

    /// Upper bound for waiting on the decode worker at shutdown
    pub const SHUTDOWN_TIMEOUT_MS: u64 = 500;
}

/// Region-of-interest and decoding defaults
pub mod decoding {
    /// Fraction of each frame side kept by the centre crop
    pub const CROP_SCALE: f32 = 0.75;

    /// Still images are downsampled while both sides stay at or above this
    pub const STILL_IMAGE_MAX_DIMENSION: u32 = 1200;

    /// Hybrid binarizer block edge in pixels
    pub const BLOCK_SIZE: usize = 8;

    /// Below this local dynamic range a block is treated as flat
    pub const MIN_DYNAMIC_RANGE: u8 = 24;

    /// Frames smaller than this (either side) fall back to the global binarizer
    pub const MINIMUM_HYBRID_DIMENSION: u32 = 40;

    /// Histogram bucket count for the global binarizer (256 >> 3)
    pub const LUMINANCE_BUCKETS: usize = 32;
}

/// Overlay geometry defaults
pub mod overlay {
    /// Aspect ratios closer than this are treated as equal
    pub const ASPECT_TOLERANCE: f32 = 0.01;

    /// Idle square side as a fraction of the shorter view side
    pub const IDLE_SIZE_RATIO: f32 = 0.55;

    /// Idle square minimum side in density-independent pixels
    pub const IDLE_MIN_DP: f32 = 180.0;

    /// Idle square maximum side in density-independent pixels
    pub const IDLE_MAX_DP: f32 = 320.0;

    /// Padding around the symbol in square style
    pub const SQUARE_PADDING_DP: f32 = 8.0;

    /// Reticle arm length as a fraction of the shorter adjacent edge
    pub const RETICLE_ARM_RATIO: f32 = 0.24;

    /// Reticle arm length bounds in density-independent pixels
    pub const RETICLE_MIN_DP: f32 = 12.0;
    pub const RETICLE_MAX_DP: f32 = 64.0;
}

/// QR generation defaults
pub mod generation {
    /// Default output image side in pixels
    pub const DEFAULT_SIZE: u32 = 512;

    /// Quiet zone around generated symbols, in modules
    pub const MARGIN_MODULES: u32 = 1;
}

/// Supported image file formats
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "gif"];

    /// Check if an extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}
