//! Codex entries: the payload stored at every node of the tree

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use generational_arena::Index;
use regex::Regex;

use crate::domain::error::{DomainError, DomainResult};

/// Arena handle of an entry inside its [`Codex`](crate::domain::Codex).
pub type EntryId = Index;

/// Kind of a codex entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryKind {
    Root,
    Chapter,
    Block,
    Category,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Root => "root",
            EntryKind::Chapter => "chapter",
            EntryKind::Block => "block",
            EntryKind::Category => "category",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "root" => Ok(EntryKind::Root),
            "chapter" => Ok(EntryKind::Chapter),
            "block" => Ok(EntryKind::Block),
            "category" => Ok(EntryKind::Category),
            other => Err(DomainError::InvalidKind(other.to_string())),
        }
    }
}

/// ICD-11 linearization detail carried by entries of that revision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Linearization {
    /// Stable foundation URI; not every linearization entity has one
    pub foundation_uri: Option<String>,
    /// URI of the entity in this linearization release
    pub linearization_uri: Option<String>,
    /// Block identifier, e.g. `BlockL1-1A0`
    pub block_id: Option<String>,
    /// Ancestor block identifiers (`Grouping1..5`), outermost first
    pub groupings: Vec<String>,
    /// Number of `- ` nesting markers the source title carried
    pub title_depth: usize,
}

/// One node of the codex: a root, chapter, block or category.
///
/// Links are managed by the owning codex; an entry built with [`Entry::new`]
/// is detached until it is inserted.
#[derive(Debug, Clone)]
pub struct Entry {
    pub code: String,
    pub title: String,
    pub kind: EntryKind,
    pub linearization: Option<Linearization>,
    pub(crate) parent: Option<EntryId>,
    pub(crate) children: Vec<EntryId>,
}

impl Entry {
    pub fn new(code: impl Into<String>, title: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
            kind,
            linearization: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Build an entry from an untyped kind tag, as found in source data.
    pub fn parse(code: impl Into<String>, title: impl Into<String>, kind: &str) -> DomainResult<Self> {
        let kind = kind.parse::<EntryKind>()?;
        Ok(Self::new(code, title, kind))
    }

    /// Chapter entry; arabic chapter numbers are converted to roman numerals.
    pub fn chapter(code: &str, title: impl Into<String>) -> Self {
        Self::new(chapter_code(code), title, EntryKind::Chapter)
    }

    pub fn with_linearization(mut self, linearization: Linearization) -> Self {
        self.linearization = Some(linearization);
        self
    }

    pub fn parent(&self) -> Option<EntryId> {
        self.parent
    }

    pub fn children(&self) -> &[EntryId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// True if `code` is a substring of this entry's code, with or without its dots.
    pub fn code_matches(&self, code: &str) -> bool {
        if self.code.contains(code) {
            return true;
        }
        self.code.replace('.', "").contains(code)
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.kind, self.code, self.title)
    }
}

/// Normalize a chapter code: numeric codes become roman numerals, anything
/// else is kept as is.
pub fn chapter_code(code: &str) -> String {
    let code = code.trim();
    match code.parse::<u32>() {
        Ok(number) => romanize(number),
        Err(_) => code.to_string(),
    }
}

/// Romanize an integer, e.g. `45` → `XLV`.
pub fn romanize(number: u32) -> String {
    const UNITS: [&str; 10] = ["", "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX"];
    const TENS: [&str; 10] = ["", "X", "XX", "XXX", "XL", "L", "LX", "LXX", "LXXX", "XC"];
    const HUNDREDS: [&str; 10] = ["", "C", "CC", "CCC", "CD", "D", "DC", "DCC", "DCCC", "CM"];

    let mut roman = "M".repeat((number / 1000) as usize);
    let number = number % 1000;
    roman.push_str(HUNDREDS[(number / 100) as usize]);
    let number = number % 100;
    roman.push_str(TENS[(number / 10) as usize]);
    roman.push_str(UNITS[(number % 10) as usize]);
    roman
}

/// Inclusive code range spanned by a block, e.g. `A00-A09`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRange {
    pub start: String,
    pub end: String,
}

impl BlockRange {
    /// Parse `<start>-<end>` or a single `<code>` (start and end coincide).
    pub fn parse(code: &str) -> DomainResult<Self> {
        let parts: Vec<&str> = code.split('-').collect();
        match parts.as_slice() {
            [single] if !single.is_empty() => Ok(Self {
                start: single.to_string(),
                end: single.to_string(),
            }),
            [start, end] if !start.is_empty() && !end.is_empty() => Ok(Self {
                start: start.to_string(),
                end: end.to_string(),
            }),
            _ => Err(DomainError::MalformedRange(code.to_string())),
        }
    }

    /// Range lies completely within `self`, bounds included.
    pub fn contains_range(&self, other: &BlockRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Whether a code query can match a category within this range.
    ///
    /// Only a query shaped like a full category code (`A01`, `A01.1`,
    /// `A011`) is anchored at the start of a code; it is truncated to the
    /// width of each bound before comparing, so `A01.1` lies within
    /// `A00-A09`. Partial queries like `A0` or `01.1` may match anywhere.
    pub fn covers(&self, code: &str) -> bool {
        if !category_pattern().is_match(code) {
            return true;
        }
        truncate(code, self.start.chars().count()) >= self.start.as_str()
            && truncate(code, self.end.chars().count()) <= self.end.as_str()
    }
}

fn category_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Z][0-9][0-9A-Z]\.?[0-9A-Z]*$").expect("category pattern is valid")
    })
}

fn truncate(code: &str, width: usize) -> &str {
    match code.char_indices().nth(width) {
        Some((pos, _)) => &code[..pos],
        None => code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, "I")]
    #[case(4, "IV")]
    #[case(9, "IX")]
    #[case(14, "XIV")]
    #[case(22, "XXII")]
    #[case(45, "XLV")]
    #[case(2821, "MMDCCCXXI")]
    #[case(3999, "MMMCMXCIX")]
    fn test_romanize(#[case] number: u32, #[case] expected: &str) {
        assert_eq!(romanize(number), expected);
    }

    #[test]
    fn test_romanize_zero_is_empty() {
        assert_eq!(romanize(0), "");
    }

    #[rstest]
    #[case("2", "II")]
    #[case("21", "XXI")]
    #[case("IV", "IV")]
    #[case("V", "V")]
    fn test_chapter_code(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(chapter_code(raw), expected);
    }

    #[rstest]
    #[case("root", EntryKind::Root)]
    #[case("chapter", EntryKind::Chapter)]
    #[case("block", EntryKind::Block)]
    #[case("category", EntryKind::Category)]
    fn test_kind_from_str(#[case] raw: &str, #[case] expected: EntryKind) {
        assert_eq!(raw.parse::<EntryKind>().unwrap(), expected);
        assert_eq!(expected.to_string(), raw);
    }

    #[test]
    fn test_invalid_kind_is_validation_error() {
        let err = Entry::parse("A00", "Cholera", "subcategory").unwrap_err();
        assert_eq!(err, DomainError::InvalidKind("subcategory".into()));
    }

    #[test]
    fn test_display() {
        let entry = Entry::new("A00.0", "Cholera due to Vibrio cholerae 01, biovar cholerae", EntryKind::Category);
        assert_eq!(
            entry.to_string(),
            "category A00.0: Cholera due to Vibrio cholerae 01, biovar cholerae"
        );
    }

    #[rstest]
    #[case("A01.1", "A01.1", true)]
    #[case("A01.1", "A011", true)]
    #[case("A01.1", "A01", true)]
    #[case("A01.1", "01.", true)]
    #[case("A01.1", "A012", false)]
    #[case("A00-A09", "A00-A09", true)]
    #[case("A00-A09", "B00", false)]
    fn test_code_matches(#[case] code: &str, #[case] query: &str, #[case] expected: bool) {
        let entry = Entry::new(code, "", EntryKind::Category);
        assert_eq!(entry.code_matches(query), expected);
    }

    #[test]
    fn test_block_range_parse() {
        assert_eq!(
            BlockRange::parse("A00-A09").unwrap(),
            BlockRange { start: "A00".into(), end: "A09".into() }
        );
        assert_eq!(
            BlockRange::parse("C43").unwrap(),
            BlockRange { start: "C43".into(), end: "C43".into() }
        );
        assert!(matches!(
            BlockRange::parse("A00-A05-A09"),
            Err(DomainError::MalformedRange(_))
        ));
        assert!(matches!(BlockRange::parse(""), Err(DomainError::MalformedRange(_))));
        assert!(matches!(BlockRange::parse("A00-"), Err(DomainError::MalformedRange(_))));
    }

    #[test]
    fn test_block_range_containment() {
        let outer = BlockRange::parse("A00-A19").unwrap();
        assert!(outer.contains_range(&BlockRange::parse("A00-A09").unwrap()));
        assert!(outer.contains_range(&BlockRange::parse("A10-A19").unwrap()));
        assert!(outer.contains_range(&outer));
        assert!(!outer.contains_range(&BlockRange::parse("A15-A20").unwrap()));
    }

    #[rstest]
    #[case("A00-A09", "A01.1", true)]
    #[case("A00-A09", "A09", true)]
    #[case("A00-A09", "A099", true)]
    #[case("A00-A09", "A10", false)]
    #[case("A00-A09", "B01.1", false)]
    #[case("A00-A09", "A0", true)]
    #[case("A00-A09", "01.1", true)]
    #[case("A00-A09", "1", true)]
    #[case("C43", "C43.5", true)]
    #[case("C43", "C44", false)]
    fn test_block_range_covers(#[case] range: &str, #[case] code: &str, #[case] expected: bool) {
        assert_eq!(BlockRange::parse(range).unwrap().covers(code), expected);
    }
}
