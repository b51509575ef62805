// SPDX-License-Identifier: MPL-2.0

//! QR symbol rendering
//!
//! Symbols are encoded with medium error correction and rendered as crisp
//! black modules on white. Rendering produces a [`LuminanceFrame`] so the same
//! buffers can be fed straight back into the decoder or written to disk.

use super::luminance::LuminanceFrame;
use crate::constants::generation;
use crate::errors::{FrameError, ScanError, ScanResult};
use qrcode::{Color, EcLevel, QrCode};
use std::path::Path;
use tracing::{debug, info};

const DARK: u8 = 0;
const LIGHT: u8 = 255;

/// Render `payload` with `module_px` pixels per module and a quiet zone of
/// `quiet_zone_modules` modules on every side
pub fn render_symbol(
    payload: &str,
    module_px: u32,
    quiet_zone_modules: u32,
) -> ScanResult<LuminanceFrame> {
    if module_px == 0 {
        return Err(ScanError::Image("module size must be at least 1 pixel".into()));
    }

    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)
        .map_err(|e| ScanError::Image(format!("cannot encode payload: {}", e)))?;
    let modules = code.width() as u32;
    let colors = code.to_colors();

    let side_modules = modules + 2 * quiet_zone_modules;
    let side = side_modules * module_px;
    let mut data = vec![LIGHT; side as usize * side as usize];

    for my in 0..modules {
        for mx in 0..modules {
            if colors[(my * modules + mx) as usize] != Color::Dark {
                continue;
            }
            let x0 = (mx + quiet_zone_modules) * module_px;
            let y0 = (my + quiet_zone_modules) * module_px;
            for y in y0..y0 + module_px {
                let row = y as usize * side as usize;
                data[row + x0 as usize..row + (x0 + module_px) as usize].fill(DARK);
            }
        }
    }

    debug!(
        modules,
        module_px,
        side,
        payload_len = payload.len(),
        "Rendered QR symbol"
    );
    Ok(LuminanceFrame::new(side, side, data)?)
}

/// Paste `symbol` onto a `canvas_width` x `canvas_height` background with its
/// top-left corner at (`x`, `y`)
pub fn place_on_canvas(
    symbol: &LuminanceFrame,
    canvas_width: u32,
    canvas_height: u32,
    x: u32,
    y: u32,
    background: u8,
) -> Result<LuminanceFrame, FrameError> {
    let fits_x = x
        .checked_add(symbol.width())
        .is_some_and(|r| r <= canvas_width);
    let fits_y = y
        .checked_add(symbol.height())
        .is_some_and(|b| b <= canvas_height);
    if !fits_x || !fits_y {
        return Err(FrameError::CropOutOfBounds {
            x,
            y,
            width: symbol.width(),
            height: symbol.height(),
        });
    }

    let mut data = vec![background; canvas_width as usize * canvas_height as usize];
    let (x, w) = (x as usize, symbol.width() as usize);
    for row in 0..symbol.height() {
        let start = (y + row) as usize * canvas_width as usize + x;
        data[start..start + w].copy_from_slice(symbol.row(row));
    }
    LuminanceFrame::new(canvas_width, canvas_height, data)
}

/// Render `payload` into a square image of `size` pixels
///
/// Modules are whole pixels; leftover space is spread evenly as extra margin.
/// Payloads too dense for `size` come out at one pixel per module instead.
pub fn generate(payload: &str, size: u32) -> ScanResult<LuminanceFrame> {
    let margin = generation::MARGIN_MODULES;
    let unit_symbol = render_symbol(payload, 1, margin)?;
    let module_px = (size / unit_symbol.width()).max(1);
    let symbol = render_symbol(payload, module_px, margin)?;

    if symbol.width() >= size {
        return Ok(symbol);
    }
    let offset = (size - symbol.width()) / 2;
    Ok(place_on_canvas(&symbol, size, size, offset, offset, LIGHT)?)
}

/// Write a frame to disk as a grayscale PNG
pub fn save_png(frame: &LuminanceFrame, path: &Path) -> ScanResult<()> {
    frame
        .to_gray_image()
        .save_with_format(path, image::ImageFormat::Png)?;
    info!(path = %path.display(), width = frame.width(), "Saved QR image");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_version1_geometry() {
        // "HELLO" fits version 1 (21 modules)
        let frame = render_symbol("HELLO", 3, 4).unwrap();
        assert_eq!(frame.width(), (21 + 8) * 3);
        assert_eq!(frame.height(), frame.width());
        // Quiet zone is light, finder pattern corner is dark
        assert_eq!(frame.get(0, 0), LIGHT);
        assert_eq!(frame.get(4 * 3, 4 * 3), DARK);
    }

    #[test]
    fn test_render_rejects_zero_module_size() {
        assert!(render_symbol("x", 0, 1).is_err());
    }

    #[test]
    fn test_place_on_canvas() {
        let symbol = LuminanceFrame::filled(2, 2, 0).unwrap();
        let canvas = place_on_canvas(&symbol, 4, 3, 1, 1, 200).unwrap();
        assert_eq!(
            canvas.as_bytes(),
            &[200, 200, 200, 200, 200, 0, 0, 200, 200, 0, 0, 200]
        );
        assert!(place_on_canvas(&symbol, 2, 2, 1, 0, 200).is_err());
    }

    #[test]
    fn test_generate_fills_requested_size() {
        let frame = generate("https://example.com", 512).unwrap();
        assert_eq!((frame.width(), frame.height()), (512, 512));
        assert_eq!(frame.get(0, 0), LIGHT);
    }

    #[test]
    fn test_save_png_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code.png");
        let frame = generate("HELLO", 128).unwrap();
        save_png(&frame, &path).unwrap();
        let loaded = image::open(&path).unwrap().to_luma8();
        assert_eq!(loaded.width(), 128);
    }
}
