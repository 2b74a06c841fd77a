//! ICD-11 adapter: builds a codex from the WHO's simple tabulation
//!
//! The tabulation is a flat table in depth-first order. Nesting is encoded
//! by `- ` markers in front of every title, so rows are assembled top-down
//! with a stack of open entries keyed by their marker count.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::application::error_ext::IoResultExt;
use crate::application::progress::phase_bar;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{Codex, Entry, EntryId, EntryKind, GroupingRules, Linearization, Revision};

pub const ROOT_TITLE: &str =
    "International Statistical Classification of Diseases and Related Health Problems, 11th Revision";

/// One row of the simple tabulation; unknown columns are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TabulationRow {
    #[serde(rename = "Foundation URI")]
    pub foundation_uri: String,
    #[serde(rename = "Linearization (release) URI")]
    pub linearization_uri: String,
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "BlockId")]
    pub block_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "ClassKind")]
    pub class_kind: String,
    #[serde(rename = "DepthInKind")]
    pub depth_in_kind: String,
    #[serde(rename = "ChapterNo")]
    pub chapter_no: String,
    #[serde(rename = "Grouping1")]
    pub grouping1: String,
    #[serde(rename = "Grouping2")]
    pub grouping2: String,
    #[serde(rename = "Grouping3")]
    pub grouping3: String,
    #[serde(rename = "Grouping4")]
    pub grouping4: String,
    #[serde(rename = "Grouping5")]
    pub grouping5: String,
}

impl TabulationRow {
    /// Non-empty `Grouping<N>` values, outermost first.
    pub fn groupings(&self) -> Vec<String> {
        [
            &self.grouping1,
            &self.grouping2,
            &self.grouping3,
            &self.grouping4,
            &self.grouping5,
        ]
        .into_iter()
        .map(|g| g.trim())
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
    }

    fn non_empty(value: &str) -> Option<String> {
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    /// Entry for this row together with its title depth.
    fn to_entry(&self, origin: &Path) -> ApplicationResult<(usize, Entry)> {
        let kind = self.class_kind.trim().parse::<EntryKind>()?;
        let (title_depth, title) = GroupingRules::split_title(&self.title);
        let code = match kind {
            EntryKind::Chapter => self.chapter_no.trim(),
            EntryKind::Block => self.block_id.trim(),
            _ => self.code.trim(),
        };
        if code.is_empty() {
            return Err(ApplicationError::source_format(
                origin,
                format!("{} row without code: {}", kind, title),
            ));
        }
        let linearization = Linearization {
            foundation_uri: Self::non_empty(&self.foundation_uri),
            linearization_uri: Self::non_empty(&self.linearization_uri),
            block_id: Self::non_empty(&self.block_id),
            groupings: self.groupings(),
            title_depth,
        };
        let entry = Entry::new(code, title, kind).with_linearization(linearization);
        Ok((title_depth, entry))
    }
}

/// Load an ICD-11 codex from a simple-tabulation file.
///
/// Both the comma separated export and the tab separated `.txt` the WHO
/// ships are accepted; the delimiter is taken from the header line.
#[instrument(level = "debug")]
pub fn load(path: &Path, release: Option<&str>, progress: bool) -> ApplicationResult<Codex> {
    let content = fs::read_to_string(path).with_path_context("read simple tabulation", path)?;
    from_csv_str(&content, path, release, progress)
}

/// Build an ICD-11 codex from tabulation content; `origin` only labels errors.
pub fn from_csv_str(
    content: &str,
    origin: &Path,
    release: Option<&str>,
    progress: bool,
) -> ApplicationResult<Codex> {
    let rows = read_rows(content, origin)?;
    info!("read {} ICD-11 tabulation rows", rows.len());
    build_codex(&rows, origin, release, progress)
}

/// Deserialize all rows of a tabulation.
pub fn read_rows(content: &str, origin: &Path) -> ApplicationResult<Vec<TabulationRow>> {
    // WHO exports may start with a byte order mark
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let header = content.lines().next().unwrap_or_default();
    let delimiter = if header.contains('\t') { b'\t' } else { b',' };
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content.as_bytes());

    reader
        .deserialize::<TabulationRow>()
        .map(|row| {
            row.map_err(|source| ApplicationError::Csv {
                path: origin.to_path_buf(),
                source,
            })
        })
        .collect()
}

/// Assemble rows in document order below a fresh ICD-11 root.
pub fn build_codex(
    rows: &[TabulationRow],
    origin: &Path,
    release: Option<&str>,
    progress: bool,
) -> ApplicationResult<Codex> {
    let release = release.unwrap_or(Revision::Rev11.default_release());
    let mut codex = Codex::with_revision(Revision::Rev11, ROOT_TITLE, release);
    let root = codex.root();
    // open entries, keyed by the number of `- ` markers of their title
    let mut stack: Vec<(usize, EntryId)> = Vec::new();

    let pb = phase_bar(rows.len() as u64, "Append entries to tree", progress);
    for row in rows {
        let (title_depth, entry) = row.to_entry(origin)?;
        if entry.kind == EntryKind::Chapter {
            stack.clear();
            let id = codex.insert_under(entry, root)?;
            stack.push((title_depth, id));
            pb.inc(1);
            continue;
        }

        while stack.last().is_some_and(|&(open, _)| open >= title_depth) {
            stack.pop();
        }
        let &(_, parent) = stack.last().ok_or_else(|| {
            ApplicationError::source_format(
                origin,
                format!("{} {} appears outside of any chapter", entry.kind, entry.code),
            )
        })?;
        let id = codex.insert_under(entry, parent)?;
        stack.push((title_depth, id));
        pb.inc(1);
    }
    pb.finish_and_clear();

    debug!("built ICD-11 codex release {} with {} entries", release, codex.len(root));
    Ok(codex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groupings_skip_empty_columns() {
        let row = TabulationRow {
            grouping1: "BlockL1-1A0".to_string(),
            grouping2: " BlockL2-1A0 ".to_string(),
            ..Default::default()
        };
        assert_eq!(row.groupings(), vec!["BlockL1-1A0", "BlockL2-1A0"]);
    }

    #[test]
    fn test_block_uses_block_id_as_code() {
        let row = TabulationRow {
            block_id: "BlockL1-1A0".to_string(),
            title: "- Intestinal infectious diseases".to_string(),
            class_kind: "block".to_string(),
            ..Default::default()
        };
        let (depth, entry) = row.to_entry(Path::new("t.csv")).unwrap();
        assert_eq!(depth, 1);
        assert_eq!(entry.code, "BlockL1-1A0");
        assert_eq!(entry.title, "Intestinal infectious diseases");
        assert_eq!(entry.kind, EntryKind::Block);
    }

    #[test]
    fn test_byte_order_mark_does_not_hide_first_column() {
        let content = "\u{feff}Foundation URI,ClassKind,ChapterNo,Title\n\
                       http://id.who.int/icd/entity/1435254666,chapter,01,Certain infectious or parasitic diseases\n";

        let rows = read_rows(content, Path::new("t.csv")).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].foundation_uri, "http://id.who.int/icd/entity/1435254666");
        assert_eq!(rows[0].class_kind, "chapter");
    }

    #[test]
    fn test_category_without_code_is_rejected() {
        let row = TabulationRow {
            title: "- - Orphan".to_string(),
            class_kind: "category".to_string(),
            ..Default::default()
        };
        let err = row.to_entry(Path::new("t.csv")).unwrap_err();
        assert!(matches!(err, ApplicationError::SourceFormat { .. }));
    }
}
