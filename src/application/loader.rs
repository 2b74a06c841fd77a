//! Locating source files and dispatching them to the revision adapters

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, instrument};
use walkdir::WalkDir;

use crate::application::{rev10, rev10cm, rev11, ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::{Codex, Revision};

/// A source file together with the revision and release it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodexSource {
    pub revision: Revision,
    pub release: String,
    pub path: PathBuf,
}

/// Directory below the data dir holding a revision's files.
pub fn revision_dir(revision: Revision) -> &'static str {
    match revision {
        Revision::Rev10 => "icd-10",
        Revision::Rev10Cm => "icd-10-cm",
        Revision::Rev11 => "icd-11",
    }
}

/// File name of a release's source file.
pub fn source_file_name(revision: Revision, release: &str) -> String {
    match revision {
        Revision::Rev10 => format!("icd10{}en.xml", release),
        Revision::Rev10Cm => format!("icd10cm_tabular_{}.xml", release),
        Revision::Rev11 => format!("simpletabulation_{}.csv", release),
    }
}

fn source_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(?:icd10(?P<r10>\d{4})en\.xml|icd10cm_tabular_(?P<r10cm>\d{4})\.xml|simpletabulation_(?P<r11>\d{4}(?:-\d{2})?)\.(?:csv|txt))$",
        )
        .expect("source file pattern is valid")
    })
}

impl CodexSource {
    /// Conventional location of `revision`/`release` below the data dir.
    pub fn locate(settings: &Settings, revision: Revision, release: Option<&str>) -> Self {
        let release = release
            .map(str::to_string)
            .unwrap_or_else(|| settings.release_for(revision));
        let path = settings
            .data_dir
            .join(revision_dir(revision))
            .join(source_file_name(revision, &release));
        Self {
            revision,
            release,
            path,
        }
    }

    /// Source at an explicit path.
    pub fn at(revision: Revision, release: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            revision,
            release: release.into(),
            path: path.into(),
        }
    }

    /// Recognise a source file by its name.
    pub fn from_file_name(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let caps = source_pattern().captures(name)?;
        let (revision, release) = if let Some(m) = caps.name("r10") {
            (Revision::Rev10, m.as_str())
        } else if let Some(m) = caps.name("r10cm") {
            (Revision::Rev10Cm, m.as_str())
        } else {
            (Revision::Rev11, caps.name("r11")?.as_str())
        };
        Some(Self::at(revision, release, path))
    }
}

/// Read and build the codex a source describes.
#[instrument(level = "debug", skip(source), fields(path = %source.path.display()))]
pub fn load_codex(source: &CodexSource, progress: bool) -> ApplicationResult<Codex> {
    if !source.path.is_file() {
        return Err(ApplicationError::SourceNotFound(source.path.clone()));
    }
    debug!("loading ICD-{} release {}", source.revision, source.release);
    match source.revision {
        Revision::Rev10 => rev10::load(&source.path, progress),
        Revision::Rev10Cm => rev10cm::load(&source.path, progress),
        Revision::Rev11 => rev11::load(&source.path, Some(&source.release), progress),
    }
}

/// Every recognised source file below `data_dir`, sorted by revision and
/// release. A missing data dir yields nothing.
pub fn discover_sources(data_dir: &Path) -> Vec<CodexSource> {
    let mut sources: Vec<CodexSource> = WalkDir::new(data_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| CodexSource::from_file_name(entry.path()))
        .collect();
    sources.sort_by(|a, b| {
        (a.revision, &a.release, &a.path).cmp(&(b.revision, &b.release, &b.path))
    });
    sources
}
