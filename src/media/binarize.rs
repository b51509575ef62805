// SPDX-License-Identifier: MPL-2.0

//! Luminance binarization strategies
//!
//! The symbol decoder works on a black/white grid. Two strategies are provided:
//!
//! - [`HybridBinarizer`]: per-block thresholds smoothed over a 5x5 block
//!   neighbourhood. Handles shadows and uneven lighting well.
//! - [`GlobalHistogramBinarizer`]: one threshold picked from the valley between
//!   the two dominant histogram peaks. Better on very uniform, low-contrast
//!   images where local statistics are noisy.

use super::luminance::LuminanceFrame;
use crate::constants::{BinarizerKind, decoding};

/// Black/white grid produced by a binarizer (`true` = dark module)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl BitMatrix {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.bits[y * self.width + x]
    }

    /// Number of dark cells
    pub fn dark_count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    fn set(&mut self, x: usize, y: usize) {
        self.bits[y * self.width + x] = true;
    }
}

/// A thresholding strategy
///
/// `None` means the frame does not have enough contrast for this strategy to
/// produce a meaningful grid; it is a miss, not an error.
pub trait Binarizer: Send + Sync {
    fn kind(&self) -> BinarizerKind;

    fn binarize(&self, frame: &LuminanceFrame) -> Option<BitMatrix>;
}

/// Build the binarizer for a configured strategy
pub fn binarizer_for(kind: BinarizerKind) -> Box<dyn Binarizer> {
    match kind {
        BinarizerKind::Hybrid => Box::new(HybridBinarizer),
        BinarizerKind::GlobalHistogram => Box::new(GlobalHistogramBinarizer),
    }
}

/// Block-local thresholding
#[derive(Debug, Clone, Copy, Default)]
pub struct HybridBinarizer;

impl Binarizer for HybridBinarizer {
    fn kind(&self) -> BinarizerKind {
        BinarizerKind::Hybrid
    }

    fn binarize(&self, frame: &LuminanceFrame) -> Option<BitMatrix> {
        let min_side = decoding::MINIMUM_HYBRID_DIMENSION;
        if frame.width() < min_side || frame.height() < min_side {
            // Too few blocks for a 5x5 neighbourhood
            return GlobalHistogramBinarizer.binarize(frame);
        }

        let width = frame.width() as usize;
        let height = frame.height() as usize;
        let block = decoding::BLOCK_SIZE;
        let sub_width = width.div_ceil(block);
        let sub_height = height.div_ceil(block);

        let black_points = block_black_points(frame, sub_width, sub_height);
        let mut matrix = BitMatrix::new(width, height);

        for by in 0..sub_height {
            let y_offset = (by * block).min(height - block);
            let top = by.clamp(2, sub_height - 3);
            for bx in 0..sub_width {
                let x_offset = (bx * block).min(width - block);
                let left = bx.clamp(2, sub_width - 3);

                let mut sum = 0u32;
                for ny in top - 2..=top + 2 {
                    let row = &black_points[ny * sub_width..(ny + 1) * sub_width];
                    sum += row[left - 2..=left + 2].iter().sum::<u32>();
                }
                let threshold = sum / 25;

                for y in y_offset..y_offset + block {
                    let samples = frame.row(y as u32);
                    for x in x_offset..x_offset + block {
                        if samples[x] as u32 <= threshold {
                            matrix.set(x, y);
                        }
                    }
                }
            }
        }

        Some(matrix)
    }
}

/// Per-block threshold estimate
///
/// Flat blocks are assumed to be background (half their minimum) unless the
/// already visited neighbours say the block sits inside a dark region.
fn block_black_points(frame: &LuminanceFrame, sub_width: usize, sub_height: usize) -> Vec<u32> {
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let block = decoding::BLOCK_SIZE;
    let min_range = decoding::MIN_DYNAMIC_RANGE;
    let mut points = vec![0u32; sub_width * sub_height];

    for by in 0..sub_height {
        let y_offset = (by * block).min(height - block);
        for bx in 0..sub_width {
            let x_offset = (bx * block).min(width - block);

            let mut sum = 0u32;
            let mut min = u8::MAX;
            let mut max = u8::MIN;
            for y in y_offset..y_offset + block {
                for &pixel in &frame.row(y as u32)[x_offset..x_offset + block] {
                    sum += pixel as u32;
                    min = min.min(pixel);
                    max = max.max(pixel);
                }
            }

            let mut average = sum / (block * block) as u32;
            if max - min <= min_range {
                average = min as u32 / 2;
                if by > 0 && bx > 0 {
                    let above = points[(by - 1) * sub_width + bx];
                    let left = points[by * sub_width + bx - 1];
                    let diagonal = points[(by - 1) * sub_width + bx - 1];
                    let neighbour_average = (above + 2 * left + diagonal) / 4;
                    if (min as u32) < neighbour_average {
                        average = neighbour_average;
                    }
                }
            }
            points[by * sub_width + bx] = average;
        }
    }

    points
}

/// Single threshold from the luminance histogram
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalHistogramBinarizer;

impl Binarizer for GlobalHistogramBinarizer {
    fn kind(&self) -> BinarizerKind {
        BinarizerKind::GlobalHistogram
    }

    fn binarize(&self, frame: &LuminanceFrame) -> Option<BitMatrix> {
        let threshold = histogram_threshold(frame.as_bytes())?;
        let width = frame.width() as usize;
        let height = frame.height() as usize;

        let mut matrix = BitMatrix::new(width, height);
        for y in 0..height {
            for (x, &pixel) in frame.row(y as u32).iter().enumerate() {
                if pixel < threshold {
                    matrix.set(x, y);
                }
            }
        }
        Some(matrix)
    }
}

/// Pick the deepest valley between the two dominant histogram peaks
///
/// Returns `None` when the histogram is effectively unimodal.
pub fn histogram_threshold(samples: &[u8]) -> Option<u8> {
    let buckets_len = decoding::LUMINANCE_BUCKETS;
    let shift = 8 - buckets_len.trailing_zeros();
    let mut buckets = vec![0u64; buckets_len];
    for &sample in samples {
        buckets[(sample >> shift) as usize] += 1;
    }

    if buckets.iter().filter(|&&count| count > 0).count() < 2 {
        return None;
    }

    let mut first_peak = 0usize;
    let mut max_count = 0u64;
    for (index, &count) in buckets.iter().enumerate() {
        if count > max_count {
            first_peak = index;
            max_count = count;
        }
    }

    // Second peak favours buckets far away from the first one
    let mut second_peak = 0usize;
    let mut second_score = 0u64;
    for (index, &count) in buckets.iter().enumerate() {
        let distance = index.abs_diff(first_peak) as u64;
        let score = count * distance * distance;
        if score > second_score {
            second_peak = index;
            second_score = score;
        }
    }

    let (low, high) = if first_peak > second_peak {
        (second_peak, first_peak)
    } else {
        (first_peak, second_peak)
    };
    if high - low <= buckets_len / 16 {
        return None;
    }

    let mut best_valley = high - 1;
    let mut best_score: i64 = -1;
    for index in (low + 1..high).rev() {
        let from_low = (index - low) as i64;
        let score =
            from_low * from_low * (high - index) as i64 * (max_count - buckets[index]) as i64;
        if score > best_score {
            best_valley = index;
            best_score = score;
        }
    }

    Some((best_valley << shift) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Left half black, right half white
    fn split_frame(width: u32, height: u32, dark: u8, light: u8) -> LuminanceFrame {
        let mut data = Vec::with_capacity((width * height) as usize);
        for _ in 0..height {
            for x in 0..width {
                data.push(if x < width / 2 { dark } else { light });
            }
        }
        LuminanceFrame::new(width, height, data).unwrap()
    }

    #[test]
    fn test_histogram_threshold_bimodal() {
        let mut samples = vec![20u8; 500];
        samples.extend(vec![220u8; 500]);
        let threshold = histogram_threshold(&samples).unwrap();
        assert!(threshold > 20 && threshold <= 220, "threshold {}", threshold);
    }

    #[test]
    fn test_histogram_threshold_uniform_is_none() {
        assert_eq!(histogram_threshold(&[255u8; 1000]), None);
    }

    #[test]
    fn test_global_splits_halves() {
        let frame = split_frame(64, 48, 10, 240);
        let matrix = GlobalHistogramBinarizer.binarize(&frame).unwrap();
        assert!(matrix.is_dark(0, 0));
        assert!(matrix.is_dark(31, 47));
        assert!(!matrix.is_dark(32, 0));
        assert_eq!(matrix.dark_count(), 32 * 48);
    }

    #[test]
    fn test_hybrid_finds_dark_stripe() {
        // Vertical dark stripe straddling a block boundary
        let (width, height) = (80u32, 64u32);
        let mut data = Vec::new();
        for _ in 0..height {
            for x in 0..width {
                data.push(if (36..44).contains(&x) { 10 } else { 240 });
            }
        }
        let frame = LuminanceFrame::new(width, height, data).unwrap();
        let matrix = HybridBinarizer.binarize(&frame).unwrap();
        assert!(matrix.is_dark(38, 30));
        assert!(matrix.is_dark(41, 2));
        assert!(!matrix.is_dark(5, 30));
        assert!(!matrix.is_dark(70, 30));
    }

    #[test]
    fn test_hybrid_blank_frame_has_no_dark_cells() {
        let frame = LuminanceFrame::filled(200, 200, 255).unwrap();
        let matrix = HybridBinarizer.binarize(&frame).unwrap();
        assert_eq!(matrix.dark_count(), 0);
    }

    #[test]
    fn test_hybrid_handles_gradient_lighting() {
        // Dark stripe on a background that brightens left to right
        let (width, height) = (96u32, 64u32);
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let background = 120 + (x * 120 / width) as u8;
                let in_stripe = (28..36).contains(&y);
                data.push(if in_stripe { background / 4 } else { background });
            }
        }
        let frame = LuminanceFrame::new(width, height, data).unwrap();
        let matrix = HybridBinarizer.binarize(&frame).unwrap();
        assert!(matrix.is_dark(10, 30));
        assert!(matrix.is_dark(90, 30));
        assert!(!matrix.is_dark(90, 5));
    }

    #[test]
    fn test_small_frame_uses_global_fallback() {
        let frame = split_frame(20, 20, 0, 255);
        let matrix = HybridBinarizer.binarize(&frame).unwrap();
        assert!(matrix.is_dark(0, 0));
        assert!(!matrix.is_dark(19, 19));
    }
}
