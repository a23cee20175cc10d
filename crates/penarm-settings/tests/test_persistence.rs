use penarm_core::{CalibrationState, CalibrationStore, CornerName, Position};
use penarm_settings::{CalibrationFile, Config, SettingsError};
use tempfile::tempdir;

#[test]
fn test_missing_calibration_is_empty() {
    let dir = tempdir().unwrap();
    let file = CalibrationFile::new(dir.path().join("calibration.json"));
    let state = file.read().unwrap();
    assert_eq!(state, CalibrationState::default());
    assert!(!state.is_calibrated());
}

#[test]
fn test_calibration_round_trip_through_store() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("calibration.json");
    let mut store = CalibrationFile::new(&path);

    let mut state = CalibrationState {
        port: Some("/dev/ttyACM0".to_string()),
        ..Default::default()
    };
    state.set_corner(CornerName::Corner1, Position::new(150.0, -60.0, -40.5));
    state.set_corner(CornerName::Corner2, Position::new(250.0, 60.0, -40.0));
    store.save(&state).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded, state);
    assert!(loaded.is_calibrated());

    let raw = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["port"], "/dev/ttyACM0");
    assert_eq!(value["corners"]["corner1"]["z"], -40.5);
    assert!(raw.contains("\n  \"corners\""), "expected two-space indent");
}

#[test]
fn test_reset_keeps_resting_position_on_disk() {
    let dir = tempdir().unwrap();
    let file = CalibrationFile::new(dir.path().join("calibration.json"));

    let mut state = CalibrationState::default();
    state.set_corner(CornerName::Corner1, Position::new(1.0, 2.0, 3.0));
    state.resting_position = Some(Position::new(180.0, 10.0, 40.0));
    file.write(&state).unwrap();

    state.reset_corners();
    file.write(&state).unwrap();

    let loaded = file.read().unwrap();
    assert_eq!(loaded.corners.corner1, None);
    assert_eq!(loaded.resting_position, Some(Position::new(180.0, 10.0, 40.0)));
}

#[test]
fn test_corrupted_calibration_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("calibration.json");
    std::fs::write(&path, "{ not json").unwrap();
    let file = CalibrationFile::new(&path);
    assert!(matches!(file.read(), Err(SettingsError::Corrupted { .. })));
}

#[test]
fn test_config_round_trip_toml_and_json() {
    let dir = tempdir().unwrap();
    let mut config = Config::default();
    config.connection.port = "/dev/ttyUSB1".to_string();
    config.drawing.preset = "thick".to_string();
    config.drawing.pen_lift_height = 12.0;

    for name in ["config.toml", "config.json"] {
        let path = dir.path().join(name);
        config.save_to_file(&path).unwrap();
        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}

#[test]
fn test_config_rejects_unknown_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    assert!(matches!(
        Config::default().save_to_file(&path),
        Err(SettingsError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_load_or_default_without_file() {
    let dir = tempdir().unwrap();
    let config = Config::load_or_default(&dir.path().join("missing.toml")).unwrap();
    assert_eq!(config, Config::default());
}
