//! ICD codex: the International Classification of Diseases as a searchable tree
//!
//! Source files of ICD-10 (ClaML), ICD-10-CM (tabular XML) and ICD-11 (simple
//! tabulation) are loaded into an arena-backed [`domain::Codex`], which can
//! be searched by code and rendered as text.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod util;
