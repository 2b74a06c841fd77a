//! Revision-specific rules: block containment, title formatting, code validation

use std::fmt;
use std::str::FromStr;

use crate::domain::entry::{BlockRange, Entry, EntryKind};
use crate::domain::error::{DomainError, DomainResult};

/// Supported ICD revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Revision {
    Rev10,
    Rev10Cm,
    Rev11,
}

impl Revision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Revision::Rev10 => "10",
            Revision::Rev10Cm => "10-CM",
            Revision::Rev11 => "11",
        }
    }

    /// Code given to the root entry of a codex of this revision.
    pub fn root_code(&self) -> &'static str {
        match self {
            Revision::Rev10 => "ICD-10 root",
            Revision::Rev10Cm => "ICD-10-CM root",
            Revision::Rev11 => "ICD-11 root",
        }
    }

    /// Release used when none is configured.
    pub fn default_release(&self) -> &'static str {
        match self {
            Revision::Rev10 => "2019",
            Revision::Rev10Cm => "2022",
            Revision::Rev11 => "2022-02",
        }
    }

    pub fn rules(&self) -> &'static dyn RevisionRules {
        match self {
            Revision::Rev10 | Revision::Rev10Cm => &RangeRules,
            Revision::Rev11 => &GroupingRules,
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Revision {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "10" | "ICD-10" => Ok(Revision::Rev10),
            "10-CM" | "10CM" | "ICD-10-CM" => Ok(Revision::Rev10Cm),
            "11" | "ICD-11" => Ok(Revision::Rev11),
            _ => Err(DomainError::InvalidRevision(s.to_string())),
        }
    }
}

/// Behaviour that differs between revisions.
pub trait RevisionRules: Send + Sync {
    /// Whether block `container` should hold block `candidate` as a descendant.
    fn should_contain(&self, container: &Entry, candidate: &Entry) -> bool;

    /// Clean a title as found in the source data.
    fn format_title(&self, raw: &str) -> String {
        raw.trim().to_string()
    }

    /// Reject entries that cannot take part in this revision's tree.
    fn validate(&self, _entry: &Entry) -> DomainResult<()> {
        Ok(())
    }

    /// Whether `code` can lie below `block` at all; `true` when unknown.
    fn may_hold(&self, _block: &Entry, _code: &str) -> bool {
        true
    }
}

/// Rules of a codex without revision: blocks never nest automatically.
#[derive(Debug, Default)]
pub struct BaseRules;

impl RevisionRules for BaseRules {
    fn should_contain(&self, _container: &Entry, _candidate: &Entry) -> bool {
        false
    }
}

/// ICD-10 and ICD-10-CM: blocks span lexicographic `start-end` code ranges.
#[derive(Debug, Default)]
pub struct RangeRules;

impl RevisionRules for RangeRules {
    fn should_contain(&self, container: &Entry, candidate: &Entry) -> bool {
        if std::ptr::eq(container, candidate)
            || container.kind != EntryKind::Block
            || candidate.kind != EntryKind::Block
        {
            return false;
        }
        match (BlockRange::parse(&container.code), BlockRange::parse(&candidate.code)) {
            (Ok(outer), Ok(inner)) => outer.contains_range(&inner),
            _ => false,
        }
    }

    fn validate(&self, entry: &Entry) -> DomainResult<()> {
        if entry.kind == EntryKind::Block {
            BlockRange::parse(&entry.code)?;
        }
        Ok(())
    }

    fn may_hold(&self, block: &Entry, code: &str) -> bool {
        match BlockRange::parse(&block.code) {
            Ok(range) => range.covers(code),
            Err(_) => true,
        }
    }
}

/// ICD-11: blocks list their ancestor blocks in `Grouping<N>` columns and
/// encode nesting depth as `- ` prefixes in their titles.
#[derive(Debug, Default)]
pub struct GroupingRules;

impl GroupingRules {
    /// Split a raw title into its dash depth and the clean title.
    pub fn split_title(raw: &str) -> (usize, String) {
        let mut rest = raw.trim_start();
        let mut depth = 0;
        while let Some(stripped) = rest.strip_prefix('-') {
            depth += 1;
            rest = stripped.trim_start();
        }
        (depth, rest.trim_end().to_string())
    }
}

impl RevisionRules for GroupingRules {
    fn should_contain(&self, container: &Entry, candidate: &Entry) -> bool {
        if container.kind != EntryKind::Block || candidate.kind != EntryKind::Block {
            return false;
        }
        let (Some(outer), Some(inner)) = (&container.linearization, &candidate.linearization) else {
            return false;
        };
        let Some(block_id) = outer.block_id.as_deref().filter(|id| !id.is_empty()) else {
            return false;
        };
        inner.title_depth > outer.title_depth && inner.groupings.iter().any(|g| g == block_id)
    }

    fn format_title(&self, raw: &str) -> String {
        Self::split_title(raw).1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entry::Linearization;
    use rstest::rstest;

    fn block(code: &str) -> Entry {
        Entry::new(code, "", EntryKind::Block)
    }

    fn rev11_block(block_id: &str, groupings: &[&str], title_depth: usize) -> Entry {
        Entry::new(block_id, "", EntryKind::Block).with_linearization(Linearization {
            block_id: Some(block_id.to_string()),
            groupings: groupings.iter().map(|g| g.to_string()).collect(),
            title_depth,
            ..Default::default()
        })
    }

    #[rstest]
    #[case("10", Revision::Rev10)]
    #[case("10-CM", Revision::Rev10Cm)]
    #[case("10-cm", Revision::Rev10Cm)]
    #[case("ICD-11", Revision::Rev11)]
    fn test_revision_from_str(#[case] raw: &str, #[case] expected: Revision) {
        assert_eq!(raw.parse::<Revision>().unwrap(), expected);
    }

    #[test]
    fn test_invalid_revision() {
        assert_eq!(
            "9".parse::<Revision>().unwrap_err(),
            DomainError::InvalidRevision("9".into())
        );
    }

    #[test]
    fn test_base_rules_never_contain() {
        assert!(!BaseRules.should_contain(&block("A00-A19"), &block("A00-A09")));
    }

    #[rstest]
    #[case("A00-A19", "A00-A09", true)]
    #[case("A00-A19", "A10-A19", true)]
    #[case("A00-A19", "A05", true)]
    #[case("A00-A09", "A00-A19", false)]
    #[case("A00-A09", "A00-A09", true)]
    #[case("A00-A09", "B00-B09", false)]
    fn test_range_rules(#[case] outer: &str, #[case] inner: &str, #[case] expected: bool) {
        assert_eq!(RangeRules.should_contain(&block(outer), &block(inner)), expected);
    }

    #[test]
    fn test_range_rules_never_contain_the_receiver() {
        let entry = block("A00-A09");
        assert!(!RangeRules.should_contain(&entry, &entry));
        // an equal range on a distinct entry still nests
        assert!(RangeRules.should_contain(&entry, &block("A00-A09")));
    }

    #[test]
    fn test_range_rules_ignore_categories() {
        let category = Entry::new("A01", "", EntryKind::Category);
        assert!(!RangeRules.should_contain(&block("A00-A09"), &category));
    }

    #[test]
    fn test_range_rules_validate_block_code() {
        assert!(RangeRules.validate(&block("A00-A09")).is_ok());
        assert!(matches!(
            RangeRules.validate(&block("A00-A05-A09")),
            Err(DomainError::MalformedRange(_))
        ));
        // only blocks carry ranges
        let category = Entry::new("A00-A05-A09", "", EntryKind::Category);
        assert!(RangeRules.validate(&category).is_ok());
    }

    #[test]
    fn test_grouping_rules() {
        let l1 = rev11_block("BlockL1-1A0", &[], 1);
        let l2 = rev11_block("BlockL2-1A0", &["BlockL1-1A0"], 2);
        let other = rev11_block("BlockL2-1B1", &["BlockL1-1B1"], 2);

        assert!(GroupingRules.should_contain(&l1, &l2));
        assert!(!GroupingRules.should_contain(&l2, &l1));
        assert!(!GroupingRules.should_contain(&l1, &other));
        // a block never lists itself among its groupings
        assert!(!GroupingRules.should_contain(&l1, &l1));
    }

    #[rstest]
    #[case("Cholera", 0, "Cholera")]
    #[case("- Intestinal infectious diseases", 1, "Intestinal infectious diseases")]
    #[case("- - Cholera", 2, "Cholera")]
    #[case("- - - Non-typhoidal Salmonella", 3, "Non-typhoidal Salmonella")]
    fn test_split_title(#[case] raw: &str, #[case] depth: usize, #[case] title: &str) {
        assert_eq!(GroupingRules::split_title(raw), (depth, title.to_string()));
    }
}
