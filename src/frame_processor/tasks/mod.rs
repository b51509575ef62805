// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing tasks
//!
//! This module contains the decoder abstraction and its implementations.
//! A [`SymbolDecoder`] is one black-box way of turning a luminance grid into
//! a payload; the [`QrDetector`] tries an ordered list of them.

pub mod qr_detector;

pub use qr_detector::{QrDetector, RqrrDecoder};

use crate::frame_processor::types::Point;
use crate::media::LuminanceFrame;

/// Decoder output before it is mapped back into full-frame coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct RawSymbol {
    pub text: String,
    /// Corner or anchor points in the coordinates of the decoded frame
    pub points: Vec<Point>,
}

/// A QR symbol decoding capability
///
/// Implementations may keep internal state between calls; the detector calls
/// [`reset`](SymbolDecoder::reset) before every attempt so one failed frame
/// cannot affect the next.
pub trait SymbolDecoder: Send {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Decode one frame; `None` is an ordinary miss
    fn decode(&mut self, frame: &LuminanceFrame) -> Option<RawSymbol>;

    /// Drop any state left over from the previous attempt
    fn reset(&mut self) {}
}
