use std::collections::HashMap;

use super::*;

#[test]
fn defaults_are_valid_portrait_settings() {
    let cfg = ClipnovaConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.canvas(), Canvas::PORTRAIT);
    assert_eq!(cfg.fps().as_f64(), 30.0);
    assert_eq!(cfg.safety_cap(), Duration::from_secs(30));
    assert_eq!(cfg.generation_timeout(), Duration::from_secs(300));
}

#[test]
fn partial_json_keeps_defaults() {
    let cfg = ClipnovaConfig::from_json_str(
        r#"{ "fps": 24, "capture_backend": "gif", "phase_mode": "instant" }"#,
    )
    .unwrap();
    assert_eq!(cfg.fps, 24);
    assert_eq!(cfg.capture_backend, RecorderKind::Gif);
    assert_eq!(cfg.phase_mode, PhaseMode::Instant);
    assert_eq!(cfg.width, 720);
}

#[test]
fn unknown_keys_are_rejected() {
    assert!(ClipnovaConfig::from_json_str(r#"{ "fsp": 24 }"#).is_err());
}

#[test]
fn env_overrides_apply() {
    let env: HashMap<&str, &str> = [
        (ENV_STORE_DIR, "/tmp/store"),
        (ENV_CAPTURE_BACKEND, "GIF"),
        (ENV_PHASE_MODE, "instant"),
        (ENV_FONT, "  "),
    ]
    .into_iter()
    .collect();
    let mut cfg = ClipnovaConfig::default();
    cfg.apply_env_from(|k| env.get(k).map(|v| v.to_string()))
        .unwrap();
    assert_eq!(cfg.store_dir, PathBuf::from("/tmp/store"));
    assert_eq!(cfg.capture_backend, RecorderKind::Gif);
    assert_eq!(cfg.phase_mode, PhaseMode::Instant);
    assert_eq!(cfg.font_path, None);
}

#[test]
fn bad_env_values_are_errors() {
    let mut cfg = ClipnovaConfig::default();
    let err = cfg
        .apply_env_from(|k| (k == ENV_CAPTURE_BACKEND).then(|| "webm".to_string()))
        .unwrap_err();
    assert!(matches!(err, ClipError::Validation(_)));
}

#[test]
fn validation_rejects_degenerate_values() {
    let bad = [
        ClipnovaConfig {
            fps: 0,
            ..ClipnovaConfig::default()
        },
        ClipnovaConfig {
            width: 721,
            ..ClipnovaConfig::default()
        },
        ClipnovaConfig {
            height: 0,
            ..ClipnovaConfig::default()
        },
        ClipnovaConfig {
            capture_safety_cap_secs: 0,
            ..ClipnovaConfig::default()
        },
        ClipnovaConfig {
            default_duration_secs: 61,
            ..ClipnovaConfig::default()
        },
    ];
    for cfg in bad {
        assert!(cfg.validate().is_err(), "{cfg:?}");
    }
}

#[test]
fn loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clipnova.json");
    std::fs::write(&path, r#"{ "cloud_name": "acme" }"#).unwrap();
    let cfg = ClipnovaConfig::from_path(&path).unwrap();
    assert_eq!(cfg.cloud_name, "acme");
    assert!(ClipnovaConfig::from_path(dir.path().join("missing.json")).is_err());
}
