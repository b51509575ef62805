// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use qrscan::ScanConfig;
use qrscan::constants::{BinarizerKind, OverlayStyle};
use std::time::Duration;

#[test]
fn test_config_default() {
    let config = ScanConfig::default();

    // Check sensible defaults
    assert_eq!(config.throttle_interval(), Duration::from_millis(360));
    assert_eq!(config.hold_interval(), Duration::from_millis(360));
    assert_eq!(config.crop_scale, 0.75);
    assert_eq!(config.reset_delay(), Duration::from_millis(1000));
    assert_eq!(config.animation_duration(), Duration::from_millis(260));
    assert_eq!(config.overlay.style, OverlayStyle::Quad);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_round_trips_through_json() {
    let mut config = ScanConfig::default();
    config.strategies = vec![BinarizerKind::GlobalHistogram];
    config.overlay.style = OverlayStyle::Square;

    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(ScanConfig::from_json(&json).unwrap(), config);
}

#[test]
fn test_config_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.json");
    std::fs::write(
        &path,
        r#"{ "hold_interval_ms": 200, "overlay": { "style": "Square" } }"#,
    )
    .unwrap();

    let config = ScanConfig::load(&path).unwrap();
    assert_eq!(config.hold_interval_ms, 200);
    assert_eq!(config.overlay.style, OverlayStyle::Square);
    // Untouched nested fields keep their defaults
    assert_eq!(config.overlay.idle_max_dp, 320.0);
}

#[test]
fn test_config_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ScanConfig::load(&dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, qrscan::ScanError::Storage(_)));
}

#[test]
fn test_config_rejects_inverted_idle_bounds() {
    let json = r#"{ "overlay": { "idle_min_dp": 400, "idle_max_dp": 100 } }"#;
    assert!(ScanConfig::from_json(json).is_err());
}
