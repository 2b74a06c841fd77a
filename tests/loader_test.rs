//! Integration tests for source discovery and revision dispatch.

use std::fs;
use std::path::Path;

use rstest::rstest;
use tempfile::TempDir;

use icd_codex::application::{discover_sources, load_codex, ApplicationError, CodexSource};
use icd_codex::config::Settings;
use icd_codex::domain::Revision;
use icd_codex::util::testing;

/// Data dir laid out like a real installation, filled with the fixtures.
fn data_dir() -> TempDir {
    testing::init_test_setup();
    let dir = TempDir::new().unwrap();
    let resources = testing::resources_dir();
    let copy = |from: &str, to: &str| {
        let target = dir.path().join(to);
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::copy(resources.join(from), target).unwrap();
    };
    copy("icd10_claml_excerpt.xml", "icd-10/icd102019en.xml");
    copy("icd10cm_tabular_excerpt.xml", "icd-10-cm/icd10cm_tabular_2022.xml");
    copy("simpletabulation_excerpt.csv", "icd-11/simpletabulation_2022-02.csv");
    fs::write(dir.path().join("icd-10-cm/README.txt"), "not a source").unwrap();
    dir
}

#[test]
fn given_data_dir_when_discovering_then_all_sources_are_listed() {
    let dir = data_dir();

    let sources = discover_sources(dir.path());

    let found: Vec<(Revision, &str)> = sources
        .iter()
        .map(|s| (s.revision, s.release.as_str()))
        .collect();
    assert_eq!(
        found,
        vec![
            (Revision::Rev10, "2019"),
            (Revision::Rev10Cm, "2022"),
            (Revision::Rev11, "2022-02"),
        ]
    );
}

#[test]
fn given_missing_data_dir_when_discovering_then_nothing_is_found() {
    assert!(discover_sources(Path::new("/nonexistent/icd")).is_empty());
}

#[rstest]
#[case(Revision::Rev10, 13)]
#[case(Revision::Rev10Cm, 14)]
#[case(Revision::Rev11, 14)]
fn given_layout_when_locating_then_codex_loads(#[case] revision: Revision, #[case] entries: usize) {
    let dir = data_dir();
    let settings = Settings {
        data_dir: dir.path().to_path_buf(),
        ..Default::default()
    };

    let source = CodexSource::locate(&settings, revision, None);
    let codex = load_codex(&source, false).expect("load codex");

    assert_eq!(codex.revision(), Some(revision));
    assert_eq!(codex.release(), revision.default_release());
    assert_eq!(codex.len(codex.root()), entries);
}

#[test]
fn given_unknown_release_when_loading_then_source_not_found() {
    let dir = data_dir();
    let settings = Settings {
        data_dir: dir.path().to_path_buf(),
        ..Default::default()
    };

    let source = CodexSource::locate(&settings, Revision::Rev10Cm, Some("1999"));
    let err = load_codex(&source, false).unwrap_err();

    assert!(matches!(err, ApplicationError::SourceNotFound(_)));
}
