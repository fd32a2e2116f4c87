use crabgate::{GateConfig, VerifyError};

#[test]
fn config_round_trips_through_toml_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("crabgate.toml");

    let mut config = GateConfig::default();
    config.verification.min_age = 16;
    config.verification.max_age = 21;
    config.capture.jpeg_quality = 75;
    config.services.classifier_url = "https://classifier.example/predict".to_string();

    config.save_to_file(&path).expect("save");
    let loaded = GateConfig::load_from_file(&path).expect("load");
    assert_eq!(loaded, config);
    assert!(loaded.verification.accepts(21));
    assert!(!loaded.verification.accepts(15));
}

#[test]
fn malformed_config_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("crabgate.toml");
    std::fs::write(&path, "[verification\nmin_age = ").expect("write");

    let result = GateConfig::load_from_file(&path);
    assert!(matches!(result, Err(VerifyError::Config(_))));
}

#[test]
fn invalid_values_are_rejected_on_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("crabgate.toml");
    std::fs::write(&path, "[verification]\nmin_age = 30\nmax_age = 18\n").expect("write");

    let result = GateConfig::load_from_file(&path);
    match result {
        Err(VerifyError::Config(msg)) => assert!(msg.contains("min_age")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn default_path_is_crate_named() {
    assert_eq!(
        GateConfig::default_path(),
        std::path::PathBuf::from("crabgate.toml")
    );
}
