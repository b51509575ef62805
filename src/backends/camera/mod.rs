// SPDX-License-Identifier: MPL-2.0

//! Camera frame input
//!
//! ```text
//! ┌─────────────────────┐
//! │ Camera / file source│  ← delivers CameraFrame (plane, stride, rotation, time)
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ ScanSession/Pipeline│  ← preprocess, decode, stabilize
//! └─────────────────────┘
//! ```

pub mod file_source;
pub mod types;

pub use file_source::FileFrameSource;
pub use types::*;
