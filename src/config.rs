//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/icd/icd.toml`
//! 3. Environment variables: `ICD_*` prefix
//! 4. Command line flags (applied by the CLI)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::Revision;

/// Unified configuration for icd.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the source data (default: `<XDG data dir>/icd`)
    pub data_dir: PathBuf,
    /// Revision used when none is given on the command line
    pub revision: String,
    /// Release used when none is given; unset means the revision's default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    /// Language tag sent with API requests
    pub language: String,
    /// Show progress bars while loading a codex
    pub progress: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            revision: Revision::Rev10Cm.as_str().to_string(),
            release: None,
            language: "en".to_string(),
            progress: false,
        }
    }
}

/// Raw settings for layered merging; `None` means "not specified".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    data_dir: Option<PathBuf>,
    revision: Option<String>,
    release: Option<String>,
    language: Option<String>,
    progress: Option<bool>,
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "icd")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.local/share/icd"))
}

/// Get the XDG config directory for icd.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "icd").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("icd.toml"))
}

/// Expand `~`, `$VAR` and `${VAR}` in a path string; unknown variables are
/// left untouched.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand shell variables and tilde in `data_dir`.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.data_dir.to_string_lossy().as_ref());
        self.data_dir = PathBuf::from(expanded);
    }

    /// Overlay every field the raw settings specify.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_dir: overlay
                .data_dir
                .clone()
                .unwrap_or_else(|| self.data_dir.clone()),
            revision: overlay
                .revision
                .clone()
                .unwrap_or_else(|| self.revision.clone()),
            release: overlay.release.clone().or_else(|| self.release.clone()),
            language: overlay
                .language
                .clone()
                .unwrap_or_else(|| self.language.clone()),
            progress: overlay.progress.unwrap_or(self.progress),
        }
    }

    /// Load settings with layered precedence from the global config location.
    pub fn load() -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref())
    }

    /// Load settings with layered precedence, reading the config file at
    /// `config_path` when it exists.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(path) = config_path {
            if path.exists() {
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();
        current.validate()?;
        Ok(current)
    }

    /// Apply ICD_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("ICD").try_parsing(true))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("data_dir") {
            settings.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("revision") {
            settings.revision = val;
        }
        if let Ok(val) = config.get_string("release") {
            settings.release = Some(val);
        }
        if let Ok(val) = config.get_string("language") {
            settings.language = val;
        }
        if let Ok(val) = config.get_bool("progress") {
            settings.progress = val;
        }

        Ok(settings)
    }

    /// Reject settings naming an unknown revision.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        self.default_revision().map(|_| ())
    }

    /// The configured default revision.
    pub fn default_revision(&self) -> Result<Revision, ApplicationError> {
        self.revision.parse::<Revision>().map_err(|e| ApplicationError::Config {
            message: e.to_string(),
        })
    }

    /// Release to load for `revision`: the configured one, else the
    /// revision's default.
    pub fn release_for(&self, revision: Revision) -> String {
        self.release
            .clone()
            .unwrap_or_else(|| revision.default_release().to_string())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# icd configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/icd/icd.toml
#   Env:    ICD_* environment variables (e.g. ICD_REVISION=11)
#   Flags:  --revision, --release, --file, --progress

# Directory with the source data, laid out as
#   icd-10/icd10{release}en.xml
#   icd-10-cm/icd10cm_tabular_{release}.xml
#   icd-11/simpletabulation_{release}.csv
# data_dir = "~/.local/share/icd"

# Revision to load: "10", "10-CM" or "11"
# revision = "10-CM"

# Release to load (defaults: 10 -> 2019, 10-CM -> 2022, 11 -> 2022-02)
# release = "2022"

# Language tag for API requests
# language = "en"

# Show progress bars while loading
# progress = false
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
