//! ICD_* environment overrides of the config file.
//!
//! Lives in its own test binary: the variables set here would otherwise leak
//! into the default-value assertions of `config_test.rs`.

use std::env;
use std::fs;

use tempfile::TempDir;

use icd_codex::config::Settings;
use icd_codex::domain::Revision;

#[test]
fn given_env_vars_when_load_then_they_override_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("icd.toml");
    fs::write(
        &path,
        r#"
revision = "10"
language = "en"
release = "2019"
"#,
    )
    .unwrap();

    env::set_var("ICD_REVISION", "11");
    env::set_var("ICD_LANGUAGE", "fr");
    let result = Settings::load_from(Some(&path));
    env::remove_var("ICD_REVISION");
    env::remove_var("ICD_LANGUAGE");

    let settings = result.expect("load settings");
    assert_eq!(settings.default_revision().unwrap(), Revision::Rev11);
    assert_eq!(settings.language, "fr");
    // untouched by the environment
    assert_eq!(settings.release.as_deref(), Some("2019"));
}
