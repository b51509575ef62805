// SPDX-License-Identifier: GPL-3.0-only

//! Scanner configuration
//!
//! Every field has a default, so a JSON file only needs the keys it changes.

use crate::constants::{BinarizerKind, OverlayStyle, decoding, overlay, timing};
use crate::errors::{ScanError, ScanResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Overlay appearance settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Quadrilateral or axis-aligned square
    pub style: OverlayStyle,
    /// Idle square side as a fraction of the shorter view side
    pub idle_size_ratio: f32,
    /// Idle square minimum side (dp)
    pub idle_min_dp: f32,
    /// Idle square maximum side (dp)
    pub idle_max_dp: f32,
    /// Padding around the symbol in square style (dp)
    pub square_padding_dp: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            style: OverlayStyle::default(),
            idle_size_ratio: overlay::IDLE_SIZE_RATIO,
            idle_min_dp: overlay::IDLE_MIN_DP,
            idle_max_dp: overlay::IDLE_MAX_DP,
            square_padding_dp: overlay::SQUARE_PADDING_DP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Minimum time between decode attempts (ms)
    pub throttle_interval_ms: u64,
    /// How long a lost detection keeps being reported (ms)
    pub hold_interval_ms: u64,
    /// Fraction of each side kept by the centre crop, in (0, 1]
    pub crop_scale: f32,
    /// Delay before the overlay returns to the idle square (ms)
    pub reset_delay_ms: u64,
    /// Overlay corner glide duration (ms)
    pub animation_duration_ms: u64,
    /// Binarization strategies, tried in order
    pub strategies: Vec<BinarizerKind>,
    /// Still images are downsampled towards this side length
    pub still_image_max_dimension: u32,
    /// Bounded wait for the decode worker when a session closes (ms)
    pub shutdown_timeout_ms: u64,
    /// Overlay appearance
    pub overlay: OverlayConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            throttle_interval_ms: timing::THROTTLE_INTERVAL_MS,
            hold_interval_ms: timing::HOLD_INTERVAL_MS,
            crop_scale: decoding::CROP_SCALE,
            reset_delay_ms: timing::RESET_DELAY_MS,
            animation_duration_ms: timing::ANIMATION_DURATION_MS,
            strategies: BinarizerKind::ALL.to_vec(),
            still_image_max_dimension: decoding::STILL_IMAGE_MAX_DIMENSION,
            shutdown_timeout_ms: timing::SHUTDOWN_TIMEOUT_MS,
            overlay: OverlayConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> ScanResult<Self> {
        let config: ScanConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: &Path) -> ScanResult<Self> {
        debug!(path = %path.display(), "Loading scan configuration");
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check value ranges
    pub fn validate(&self) -> ScanResult<()> {
        if !(self.crop_scale > 0.0 && self.crop_scale <= 1.0) {
            return Err(ScanError::Config(format!(
                "crop_scale must be in (0, 1], got {}",
                self.crop_scale
            )));
        }
        if self.strategies.is_empty() {
            return Err(ScanError::Config(
                "at least one binarization strategy is required".to_string(),
            ));
        }
        if self.still_image_max_dimension == 0 {
            return Err(ScanError::Config(
                "still_image_max_dimension must be positive".to_string(),
            ));
        }
        let overlay = &self.overlay;
        if !(overlay.idle_size_ratio > 0.0) || overlay.idle_min_dp > overlay.idle_max_dp {
            return Err(ScanError::Config(format!(
                "invalid idle square bounds: ratio {}, min {} dp, max {} dp",
                overlay.idle_size_ratio, overlay.idle_min_dp, overlay.idle_max_dp
            )));
        }
        Ok(())
    }

    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_interval_ms)
    }

    pub fn hold_interval(&self) -> Duration {
        Duration::from_millis(self.hold_interval_ms)
    }

    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }

    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}
