// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use qrscan::constants::{BinarizerKind, decoding, overlay, timing};

#[test]
fn test_binarizer_values() {
    // Adaptive first, histogram fallback second
    assert_eq!(BinarizerKind::ALL.len(), 2);
    assert_eq!(BinarizerKind::ALL[0], BinarizerKind::Hybrid);
}

#[test]
fn test_binarizer_display_names() {
    for kind in BinarizerKind::ALL {
        assert!(!kind.display_name().is_empty());
    }
}

#[test]
fn test_timing_defaults_in_range() {
    for value in [timing::THROTTLE_INTERVAL_MS, timing::HOLD_INTERVAL_MS] {
        assert!((200..=360).contains(&value));
    }
    assert!(timing::RESET_DELAY_MS > timing::HOLD_INTERVAL_MS);
}

#[test]
fn test_crop_scale_in_unit_interval() {
    assert!(decoding::CROP_SCALE > 0.0 && decoding::CROP_SCALE <= 1.0);
}

#[test]
fn test_overlay_bounds_ordered() {
    assert!(overlay::IDLE_MIN_DP < overlay::IDLE_MAX_DP);
    assert!(overlay::RETICLE_MIN_DP < overlay::RETICLE_MAX_DP);
}
