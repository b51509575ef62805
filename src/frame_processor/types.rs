// SPDX-License-Identifier: MPL-2.0

//! Core types for frame processing results
//!
//! These types represent the output of frame analysis and are used by the
//! stabilizer, the overlay mapper and the CLI output.

use crate::errors::FrameError;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// A point in image or view pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Shift by (`dx`, `dy`)
    pub fn translate(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// A rectangular region within a frame
///
/// Coordinates are normalized (0.0 to 1.0) relative to the frame dimensions.
/// This allows easy transformation to screen coordinates regardless of
/// the actual frame size or display scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRegion {
    /// Left edge (0.0 = left of frame, 1.0 = right of frame)
    pub x: f32,
    /// Top edge (0.0 = top of frame, 1.0 = bottom of frame)
    pub y: f32,
    /// Width as fraction of frame width
    pub width: f32,
    /// Height as fraction of frame height
    pub height: f32,
}

/// Axis-aligned bounding box of a point set as `(min_x, min_y, max_x, max_y)`
pub fn bounding_box(points: &[Point]) -> Option<(f32, f32, f32, f32)> {
    let first = points.first()?;
    let init = (first.x, first.y, first.x, first.y);
    Some(points.iter().fold(init, |(x0, y0, x1, y1), p| {
        (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y))
    }))
}

/// WiFi security type parsed from QR code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WifiSecurity {
    /// No security (open network)
    None,
    /// WEP security (legacy, insecure)
    Wep,
    /// WPA/WPA2 Personal
    #[default]
    Wpa,
}

impl WifiSecurity {
    /// Parse security type from a WiFi QR `T:` field
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "WEP" => Self::Wep,
            "NOPASS" | "" => Self::None,
            // WPA2, WPA3, SAE and unknown values all map to WPA
            _ => Self::Wpa,
        }
    }

    /// Value written into the `T:` field when encoding
    pub fn code(&self) -> &'static str {
        match self {
            Self::None => "nopass",
            Self::Wep => "WEP",
            Self::Wpa => "WPA",
        }
    }

    /// Get display name for the security type
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::None => "Open",
            Self::Wep => "WEP",
            Self::Wpa => "WPA/WPA2",
        }
    }
}

/// Action type derived from QR code content
///
/// QR codes can contain various types of data. This enum represents
/// the parsed action that should be available to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QrAction {
    /// URL that can be opened in a browser
    Url { url: String },

    /// WiFi network credentials
    Wifi {
        /// Network name (SSID)
        ssid: String,
        /// Network password (None for open networks)
        password: Option<String>,
        /// Security type
        security: WifiSecurity,
        /// Hidden network flag
        hidden: bool,
    },

    /// Plain text that can be copied to clipboard
    Text { text: String },
}

impl QrAction {
    /// Parse QR code content into an action
    ///
    /// Falls back to `Text` for unrecognized formats.
    pub fn parse(content: &str) -> Self {
        let trimmed = content.trim();

        // WIFI:S:<ssid>;T:<security>;P:<password>;;
        if trimmed.starts_with("WIFI:") {
            return Self::parse_wifi(trimmed);
        }

        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Self::Url {
                url: trimmed.to_string(),
            };
        }

        // Bare domain without a scheme
        if trimmed.contains('.')
            && !trimmed.contains(' ')
            && trimmed.len() < 256
            && (trimmed.starts_with("www.")
                || [".com", ".org", ".net", ".io"]
                    .iter()
                    .any(|tld| trimmed.ends_with(tld)))
        {
            return Self::Url {
                url: format!("https://{}", trimmed),
            };
        }

        Self::Text {
            text: trimmed.to_string(),
        }
    }

    /// Parse WiFi QR code format
    fn parse_wifi(content: &str) -> Self {
        let mut ssid = String::new();
        let mut password = None;
        let mut security = WifiSecurity::None;
        let mut hidden = false;

        let content = content.strip_prefix("WIFI:").unwrap_or(content);

        for part in split_unescaped(content) {
            if let Some((key, value)) = part.split_once(':') {
                let value = unescape_wifi(value);
                match key {
                    "S" => ssid = value,
                    "P" if !value.is_empty() => password = Some(value),
                    "T" => security = WifiSecurity::parse(&value),
                    "H" => hidden = value.eq_ignore_ascii_case("true"),
                    _ => {}
                }
            }
        }

        Self::Wifi {
            ssid,
            password,
            security,
            hidden,
        }
    }

    /// Payload string to put into a generated QR code
    pub fn encode(&self) -> String {
        match self {
            Self::Url { url } => url.clone(),
            Self::Text { text } => text.clone(),
            Self::Wifi {
                ssid,
                password,
                security,
                hidden,
            } => {
                let mut out = format!("WIFI:S:{};T:{};", escape_wifi(ssid), security.code());
                if let Some(password) = password {
                    out.push_str(&format!("P:{};", escape_wifi(password)));
                }
                if *hidden {
                    out.push_str("H:true;");
                }
                out.push(';');
                out
            }
        }
    }

    /// Get the primary action label for this QR code type
    pub fn action_label(&self) -> &'static str {
        match self {
            Self::Url { .. } => "Open Link",
            Self::Wifi { .. } => "Connect to WiFi",
            Self::Text { .. } => "Copy Text",
        }
    }
}

/// Split WiFi fields on `;` that are not backslash-escaped
fn split_unescaped(content: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ';' => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

fn unescape_wifi(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                result.push(next);
            }
        } else {
            result.push(c);
        }
    }
    result
}

fn escape_wifi(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | ';' | ',' | ':' | '"') {
            result.push('\\');
        }
        result.push(c);
    }
    result
}

/// Outcome of decoding one frame
///
/// Corners are either absent (text only) or exactly four points in the
/// coordinate space of the full rotated frame, `image_width` x `image_height`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Decoded payload, never empty
    pub text: String,
    /// Symbol corners in image pixels, 0 or 4 points
    pub corners: Vec<Point>,
    pub image_width: u32,
    pub image_height: u32,
}

impl DetectionResult {
    /// Create a detection, checking the corner and dimension invariants
    pub fn new(
        text: String,
        corners: Vec<Point>,
        image_width: u32,
        image_height: u32,
    ) -> Result<Self, FrameError> {
        if !(corners.is_empty() || corners.len() == 4) {
            return Err(FrameError::InvalidCornerCount(corners.len()));
        }
        if image_width == 0 || image_height == 0 {
            return Err(FrameError::ZeroDimension {
                width: image_width,
                height: image_height,
            });
        }
        Ok(Self {
            text,
            corners,
            image_width,
            image_height,
        })
    }

    /// Whether symbol geometry is known
    pub fn has_geometry(&self) -> bool {
        self.corners.len() == 4
    }

    /// Parsed action for the payload
    pub fn action(&self) -> QrAction {
        QrAction::parse(&self.text)
    }

    /// Normalized bounding region of the corners
    pub fn bounds(&self) -> Option<FrameRegion> {
        let (x0, y0, x1, y1) = bounding_box(&self.corners)?;
        let (w, h) = (self.image_width as f32, self.image_height as f32);
        Some(FrameRegion {
            x: x0 / w,
            y: y0 / h,
            width: (x1 - x0) / w,
            height: (y1 - y0) / h,
        })
    }
}

/// Rolling stabilizer state, published as an immutable snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StabilizedDetection {
    /// Last successful detection (kept while the hold window is open)
    pub last_detection: Option<DetectionResult>,
    /// Time of the last successful decode
    pub last_detection_at: Option<Instant>,
    /// Time of the last analysis attempt, hit or miss
    pub last_analysis_at: Option<Instant>,
}
