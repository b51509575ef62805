// SPDX-License-Identifier: MPL-2.0

//! Pixel-level processing for the scanner
//!
//! Everything in this module is synchronous and allocation-only; no I/O
//! happens here except [`qr_render::save_png`].
//!
//! # Frame preparation
//!
//! Camera planes are de-strided and rotated upright by [`luminance`], then
//! narrowed to a centred region of interest by [`roi`].
//!
//! # Thresholding
//!
//! The [`binarize`] module turns luminance into a black/white grid for the
//! symbol decoder, with a block-local and a histogram strategy.
//!
//! # Modules
//!
//! - [`luminance`]: Luminance frames, stride removal and rotation
//! - [`roi`]: Centre crop selection
//! - [`binarize`]: Hybrid and global histogram binarizers
//! - [`qr_render`]: QR symbol rendering and PNG output

pub mod binarize;
pub mod luminance;
pub mod qr_render;
pub mod roi;

// Re-export commonly used types
pub use binarize::{Binarizer, BitMatrix, GlobalHistogramBinarizer, HybridBinarizer};
pub use luminance::{LuminanceFrame, extract_and_rotate, preprocess};
pub use roi::{CenterCrop, select_center_crop};
