// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection task
//!
//! This module implements QR code detection using the rqrr crate. Each
//! binarization strategy is wrapped in an [`RqrrDecoder`]; the [`QrDetector`]
//! crops the frame to its centre, tries the decoders in priority order and
//! maps the returned corners back into full-frame coordinates.

use super::{RawSymbol, SymbolDecoder};
use crate::config::ScanConfig;
use crate::errors::{DecoderError, ScanError, ScanResult};
use crate::frame_processor::types::{DetectionResult, Point, bounding_box};
use crate::media::binarize::{Binarizer, HybridBinarizer, binarizer_for};
use crate::media::{LuminanceFrame, select_center_crop};
use image::DynamicImage;
use image::imageops::FilterType;
use rqrr::PreparedImage;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, trace};

/// Symbol decoder backed by rqrr with a fixed binarization strategy
pub struct RqrrDecoder {
    binarizer: Box<dyn Binarizer>,
}

impl RqrrDecoder {
    pub fn new(binarizer: Box<dyn Binarizer>) -> Self {
        Self { binarizer }
    }
}

impl SymbolDecoder for RqrrDecoder {
    fn name(&self) -> &'static str {
        self.binarizer.kind().display_name()
    }

    fn decode(&mut self, frame: &LuminanceFrame) -> Option<RawSymbol> {
        let bits = self.binarizer.binarize(frame)?;
        let mut prepared =
            PreparedImage::prepare_from_bitmap(bits.width(), bits.height(), |x, y| {
                bits.is_dark(x, y)
            });

        for grid in prepared.detect_grids() {
            let Ok((_meta, text)) = grid.decode() else {
                continue;
            };
            if text.is_empty() {
                continue;
            }
            let points = grid
                .bounds
                .iter()
                .map(|p| Point::new(p.x as f32, p.y as f32))
                .collect();
            return Some(RawSymbol { text, points });
        }
        None
    }
}

/// QR code detector
///
/// Owns the decoder resources of one scanning session. Not meant to be shared
/// between threads; a single worker drives it from `open` to `close`.
pub struct QrDetector {
    decoders: Vec<Box<dyn SymbolDecoder>>,
    crop_scale: f32,
    still_image_max_dimension: u32,
    attempts: u64,
    closed: bool,
}

impl std::fmt::Debug for QrDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.decoders.iter().map(|d| d.name()).collect();
        f.debug_struct("QrDetector")
            .field("decoders", &names)
            .field("crop_scale", &self.crop_scale)
            .field("attempts", &self.attempts)
            .field("closed", &self.closed)
            .finish()
    }
}

impl QrDetector {
    /// Build one rqrr decoder per configured binarization strategy
    pub fn open(config: &ScanConfig) -> ScanResult<Self> {
        let decoders = config
            .strategies
            .iter()
            .map(|&kind| Box::new(RqrrDecoder::new(binarizer_for(kind))) as Box<dyn SymbolDecoder>)
            .collect();
        Self::with_decoders(
            decoders,
            config.crop_scale,
            config.still_image_max_dimension,
        )
    }

    /// Build a detector around an explicit, ordered decoder list
    pub fn with_decoders(
        decoders: Vec<Box<dyn SymbolDecoder>>,
        crop_scale: f32,
        still_image_max_dimension: u32,
    ) -> ScanResult<Self> {
        if decoders.is_empty() {
            return Err(DecoderError::ResourceUnavailable(
                "no symbol decoders configured".to_string(),
            )
            .into());
        }
        debug!(
            decoders = ?decoders.iter().map(|d| d.name()).collect::<Vec<_>>(),
            crop_scale,
            "Opened QR detector"
        );
        Ok(Self {
            decoders,
            crop_scale,
            still_image_max_dimension: still_image_max_dimension.max(1),
            attempts: 0,
            closed: false,
        })
    }

    /// Number of frames handed to the decoders so far
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Release the decoders; later calls fail with [`DecoderError::Closed`]
    pub fn close(&mut self) {
        if !self.closed {
            self.decoders.clear();
            self.closed = true;
            debug!(attempts = self.attempts, "Closed QR detector");
        }
    }

    fn ensure_open(&self) -> ScanResult<()> {
        if self.closed {
            return Err(DecoderError::Closed.into());
        }
        Ok(())
    }

    /// Decode an upright luminance frame
    ///
    /// Returns `Ok(None)` when no symbol is found. Corners are in the
    /// coordinates of `frame`, with the crop offset already added back.
    pub fn detect(&mut self, frame: &LuminanceFrame) -> ScanResult<Option<DetectionResult>> {
        self.ensure_open()?;
        self.attempts += 1;
        let start = Instant::now();

        let crop = select_center_crop(frame, self.crop_scale)?;
        let (crop_w, crop_h) = (crop.frame.width() as f32, crop.frame.height() as f32);

        for decoder in &mut self.decoders {
            decoder.reset();
            let Some(symbol) = decoder.decode(&crop.frame) else {
                trace!(strategy = decoder.name(), "No symbol");
                continue;
            };

            let corners = normalize_corners(&symbol.points)
                .into_iter()
                .map(|p| {
                    Point::new(p.x.clamp(0.0, crop_w), p.y.clamp(0.0, crop_h))
                        .translate(crop.offset_x as f32, crop.offset_y as f32)
                })
                .collect();
            let detection =
                DetectionResult::new(symbol.text, corners, frame.width(), frame.height())?;

            debug!(
                strategy = decoder.name(),
                text_len = detection.text.len(),
                has_geometry = detection.has_geometry(),
                elapsed_ms = start.elapsed().as_millis(),
                "Detected QR code"
            );
            return Ok(Some(detection));
        }

        Ok(None)
    }

    /// Decode a full-resolution RGB still image (3 bytes per pixel)
    ///
    /// Single hybrid binarization pass over the whole image.
    pub fn decode_still_image(
        &mut self,
        rgb: &[u8],
        width: u32,
        height: u32,
    ) -> ScanResult<Option<String>> {
        self.ensure_open()?;
        let frame = LuminanceFrame::from_rgb(rgb, width, height)?;
        let mut decoder = RqrrDecoder::new(Box::new(HybridBinarizer));
        let text = decoder.decode(&frame).map(|symbol| symbol.text);
        debug!(width, height, found = text.is_some(), "Decoded still image");
        Ok(text)
    }

    /// Decode an encoded image (PNG, JPEG, ...) held in memory
    pub fn decode_image_bytes(&mut self, bytes: &[u8]) -> ScanResult<Option<String>> {
        self.ensure_open()?;
        let image = image::load_from_memory(bytes)?;
        self.decode_dynamic_image(image)
    }

    /// Decode an image file
    pub fn decode_image_file(&mut self, path: &Path) -> ScanResult<Option<String>> {
        self.ensure_open()?;
        let image = image::open(path)
            .map_err(|e| ScanError::Image(format!("{}: {}", path.display(), e)))?;
        self.decode_dynamic_image(image)
    }

    fn decode_dynamic_image(&mut self, image: DynamicImage) -> ScanResult<Option<String>> {
        let factor = sample_factor(image.width(), image.height(), self.still_image_max_dimension);
        let image = if factor > 1 {
            let (w, h) = (image.width() / factor, image.height() / factor);
            trace!(factor, width = w, height = h, "Downsampling still image");
            image.resize_exact(w, h, FilterType::Triangle)
        } else {
            image
        };
        let rgb = image.to_rgb8();
        self.decode_still_image(rgb.as_raw(), rgb.width(), rgb.height())
    }
}

/// Largest power of two that keeps both halved sides at or above `max_dimension`
pub fn sample_factor(width: u32, height: u32, max_dimension: u32) -> u32 {
    let max_dimension = max_dimension.max(1);
    let mut factor = 1u32;
    if width > max_dimension || height > max_dimension {
        let (half_w, half_h) = (width / 2, height / 2);
        while half_w / factor >= max_dimension && half_h / factor >= max_dimension {
            factor *= 2;
        }
    }
    factor
}

/// Turn decoder points into 0 or 4 corners
///
/// Four points pass through. Any other non-empty set is replaced by the
/// corners of its bounding box, or dropped when that box has no area.
pub fn normalize_corners(points: &[Point]) -> Vec<Point> {
    if points.len() == 4 {
        return points.to_vec();
    }
    match bounding_box(points) {
        Some((x0, y0, x1, y1)) if x1 > x0 && y1 > y0 => vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::qr_render::{place_on_canvas, render_symbol};

    struct TextOnlyDecoder;

    impl SymbolDecoder for TextOnlyDecoder {
        fn name(&self) -> &'static str {
            "text-only"
        }

        fn decode(&mut self, _frame: &LuminanceFrame) -> Option<RawSymbol> {
            Some(RawSymbol {
                text: "payload".to_string(),
                points: vec![Point::new(3.0, 4.0)],
            })
        }
    }

    fn symbol_frame(text: &str, width: u32, height: u32) -> LuminanceFrame {
        let symbol = render_symbol(text, 5, 4).unwrap();
        let x = (width - symbol.width()) / 2;
        let y = (height - symbol.height()) / 2;
        place_on_canvas(&symbol, width, height, x, y, 255).unwrap()
    }

    #[test]
    fn test_open_without_strategies_is_unavailable() {
        let config = ScanConfig {
            strategies: Vec::new(),
            ..ScanConfig::default()
        };
        let err = QrDetector::open(&config).unwrap_err();
        assert!(matches!(
            err,
            ScanError::Decoder(DecoderError::ResourceUnavailable(_))
        ));
    }

    #[test]
    fn test_blank_frame_is_a_miss() {
        let mut detector = QrDetector::open(&ScanConfig::default()).unwrap();
        let frame = LuminanceFrame::filled(200, 200, 255).unwrap();
        assert_eq!(detector.detect(&frame).unwrap(), None);
        assert_eq!(detector.attempts(), 1);
    }

    #[test]
    fn test_detects_centered_symbol() {
        let mut detector = QrDetector::open(&ScanConfig::default()).unwrap();
        let frame = symbol_frame("HELLO", 320, 240);
        let detection = detector.detect(&frame).unwrap().unwrap();
        assert_eq!(detection.text, "HELLO");
        assert_eq!(detection.corners.len(), 4);
        assert_eq!((detection.image_width, detection.image_height), (320, 240));
        for corner in &detection.corners {
            assert!(corner.x >= 0.0 && corner.x <= 320.0);
            assert!(corner.y >= 0.0 && corner.y <= 240.0);
        }
    }

    #[test]
    fn test_global_histogram_only_detects_symbol() {
        let config = ScanConfig {
            strategies: vec![crate::constants::BinarizerKind::GlobalHistogram],
            ..ScanConfig::default()
        };
        let mut detector = QrDetector::open(&config).unwrap();
        let frame = symbol_frame("HELLO", 320, 240);
        let detection = detector.detect(&frame).unwrap().unwrap();
        assert_eq!(detection.text, "HELLO");
    }

    #[test]
    fn test_closed_detector_rejects_frames() {
        let mut detector = QrDetector::open(&ScanConfig::default()).unwrap();
        detector.close();
        assert!(detector.is_closed());
        let frame = LuminanceFrame::filled(50, 50, 255).unwrap();
        assert_eq!(
            detector.detect(&frame).unwrap_err(),
            ScanError::Decoder(DecoderError::Closed)
        );
    }

    #[test]
    fn test_single_point_decoder_yields_text_only() {
        let mut detector =
            QrDetector::with_decoders(vec![Box::new(TextOnlyDecoder)], 0.75, 1200).unwrap();
        let frame = LuminanceFrame::filled(100, 100, 128).unwrap();
        let detection = detector.detect(&frame).unwrap().unwrap();
        assert_eq!(detection.text, "payload");
        assert!(detection.corners.is_empty());
    }

    #[test]
    fn test_normalize_corners() {
        let three = [
            Point::new(10.0, 10.0),
            Point::new(30.0, 12.0),
            Point::new(12.0, 40.0),
        ];
        let corners = normalize_corners(&three);
        assert_eq!(corners.len(), 4);
        assert_eq!(corners[0], Point::new(10.0, 10.0));
        assert_eq!(corners[2], Point::new(30.0, 40.0));

        let collinear = [Point::new(0.0, 5.0), Point::new(10.0, 5.0)];
        assert!(normalize_corners(&collinear).is_empty());
        assert!(normalize_corners(&[]).is_empty());
    }

    #[test]
    fn test_sample_factor() {
        assert_eq!(sample_factor(800, 600, 1200), 1);
        assert_eq!(sample_factor(4000, 3000, 1200), 2);
        assert_eq!(sample_factor(5000, 5000, 1200), 4);
        assert_eq!(sample_factor(10000, 10000, 1200), 8);
        // Both sides must stay large enough
        assert_eq!(sample_factor(10000, 2000, 1200), 1);
    }

    #[test]
    fn test_decode_still_image_rgb() {
        let frame = symbol_frame("STILL", 200, 200);
        let rgb: Vec<u8> = frame.as_bytes().iter().flat_map(|&v| [v, v, v]).collect();
        let mut detector = QrDetector::open(&ScanConfig::default()).unwrap();
        let text = detector.decode_still_image(&rgb, 200, 200).unwrap();
        assert_eq!(text.as_deref(), Some("STILL"));
    }

    #[test]
    fn test_decode_image_bytes_png() {
        let frame = symbol_frame("PNG", 200, 200);
        let mut bytes = Vec::new();
        frame
            .to_gray_image()
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let mut detector = QrDetector::open(&ScanConfig::default()).unwrap();
        assert_eq!(
            detector.decode_image_bytes(&bytes).unwrap().as_deref(),
            Some("PNG")
        );
    }
}
