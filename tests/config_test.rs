//! Integration tests for Settings config loading with layered precedence.
//!
//! These tests read config files from temp directories only; the global
//! config location of the machine running them is never touched.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use icd_codex::application::ApplicationError;
use icd_codex::config::Settings;
use icd_codex::domain::Revision;

#[test]
fn given_no_config_file_when_load_then_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::load_from(Some(&dir.path().join("icd.toml"))).expect("load defaults");

    assert_eq!(settings.language, "en");
    assert!(settings.data_dir.to_string_lossy().contains("icd"));
}

#[test]
fn given_config_file_when_load_then_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("icd.toml");
    fs::write(
        &path,
        r#"
revision = "11"
release = "2023-01"
progress = true
"#,
    )
    .unwrap();

    let settings = Settings::load_from(Some(&path)).expect("load settings");

    assert_eq!(settings.default_revision().unwrap(), Revision::Rev11);
    assert_eq!(settings.release_for(Revision::Rev11), "2023-01");
    assert!(settings.progress);
    // unspecified fields keep their defaults
    assert_eq!(settings.language, "en");
}

#[test]
fn given_tilde_data_dir_when_load_then_path_is_expanded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("icd.toml");
    fs::write(&path, "data_dir = \"~/icd-data\"\n").unwrap();

    let settings = Settings::load_from(Some(&path)).expect("load settings");

    let home = std::env::var("HOME").expect("HOME should be set");
    assert_eq!(settings.data_dir, PathBuf::from(home).join("icd-data"));
}

#[test]
fn given_invalid_toml_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("icd.toml");
    fs::write(&path, "revision = [unclosed").unwrap();

    let err = Settings::load_from(Some(&path)).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
}

#[test]
fn given_unknown_revision_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("icd.toml");
    fs::write(&path, "revision = \"9\"\n").unwrap();

    let err = Settings::load_from(Some(&path)).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
}

#[test]
fn given_settings_when_to_toml_then_round_trips() {
    let settings = Settings {
        data_dir: PathBuf::from("/srv/icd"),
        revision: "10".to_string(),
        release: Some("2019".to_string()),
        language: "de".to_string(),
        progress: false,
    };

    let rendered = settings.to_toml().unwrap();
    let parsed: Settings = toml::from_str(&rendered).unwrap();

    assert_eq!(parsed, settings);
}
