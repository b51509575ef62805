// SPDX-License-Identifier: MPL-2.0

//! Frame input layer
//!
//! The scanner never talks to camera hardware itself. Whatever captures
//! frames hands them over as [`camera::CameraFrame`]s; this module defines
//! that type and a file-backed source for replaying recorded frames.
//!
//! # Modules
//!
//! - [`camera`]: Camera frame types and the file frame source

pub mod camera;
