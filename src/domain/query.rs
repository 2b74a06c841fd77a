//! Code lookup over a codex subtree
//!
//! All lookups walk the subtree in pre-order. `maxdepth` bounds the walk:
//! an entry whose depth is at least `maxdepth` is neither tested nor
//! descended into. Misses are values (`None`, empty, `false`), never errors.

use tracing::instrument;

use crate::domain::codex::Codex;
use crate::domain::entry::{EntryId, EntryKind};

impl Codex {
    /// True if `code` matches the code of `id`, with or without dots.
    pub fn code_matches(&self, id: EntryId, code: &str) -> bool {
        self.get_entry(id).is_some_and(|e| e.code_matches(code))
    }

    /// All entries below (and including) `id` whose code matches `code`.
    #[instrument(level = "debug", skip(self))]
    pub fn search(&self, id: EntryId, code: &str, maxdepth: Option<usize>) -> Vec<EntryId> {
        self.bounded(id, maxdepth)
            .filter(|&e| self.code_matches(e, code))
            .collect()
    }

    /// Whether any entry below (and including) `id` matches `code`.
    #[instrument(level = "debug", skip(self))]
    pub fn exists(&self, id: EntryId, code: &str, maxdepth: Option<usize>) -> bool {
        self.bounded(id, maxdepth).any(|e| self.code_matches(e, code))
    }

    /// First entry of `kind` below (and including) `id` matching `code`.
    #[instrument(level = "debug", skip(self))]
    pub fn get(
        &self,
        id: EntryId,
        code: &str,
        maxdepth: Option<usize>,
        kind: EntryKind,
    ) -> Option<EntryId> {
        self.bounded(id, maxdepth).find(|&e| {
            self.get_entry(e)
                .is_some_and(|entry| entry.kind == kind && entry.code_matches(code))
        })
    }

    /// Shorthand for an unbounded category lookup.
    pub fn get_category(&self, id: EntryId, code: &str) -> Option<EntryId> {
        self.get(id, code, None, EntryKind::Category)
    }

    /// Category lookup that gives up early when `code` cannot lie in `block`.
    ///
    /// Only revisions with range semantics can rule a code out; otherwise
    /// this is a plain [`get`](Self::get) for a category.
    pub fn find_in_block(&self, block: EntryId, code: &str, maxdepth: Option<usize>) -> Option<EntryId> {
        let entry = self.get_entry(block)?;
        if entry.kind == EntryKind::Block && !self.rules().may_hold(entry, code) {
            return None;
        }
        self.get(block, code, maxdepth, EntryKind::Category)
    }

    fn bounded(&self, id: EntryId, maxdepth: Option<usize>) -> Bounded<'_> {
        let mut stack = Vec::new();
        if self.get_entry(id).is_some() {
            stack.push((id, self.depth(id)));
        }
        Bounded {
            codex: self,
            stack,
            maxdepth,
        }
    }
}

/// Pre-order walk that prunes everything at or beyond `maxdepth`.
struct Bounded<'a> {
    codex: &'a Codex,
    stack: Vec<(EntryId, usize)>,
    maxdepth: Option<usize>,
}

impl Iterator for Bounded<'_> {
    type Item = EntryId;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, depth)) = self.stack.pop() {
            if self.maxdepth.is_some_and(|max| max <= depth) {
                continue;
            }
            if let Some(entry) = self.codex.get_entry(current) {
                self.stack
                    .extend(entry.children().iter().rev().map(|&c| (c, depth + 1)));
                return Some(current);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entry::Entry;
    use crate::domain::revision::Revision;

    fn sample() -> (Codex, EntryId, EntryId) {
        let mut codex = Codex::with_revision(Revision::Rev10, "ICD-10", "2019");
        let chapter = codex.insert_under(Entry::chapter("1", "Infections"), codex.root()).unwrap();
        let block = codex
            .insert_under(Entry::new("A00-A09", "Intestinal", EntryKind::Block), chapter)
            .unwrap();
        codex
            .insert_under(Entry::new("A00", "Cholera", EntryKind::Category), block)
            .unwrap();
        (codex, chapter, block)
    }

    #[test]
    fn test_get_respects_kind_at_every_level() {
        let (codex, _, block) = sample();
        assert_eq!(codex.get(codex.root(), "A00-A09", None, EntryKind::Block), Some(block));
        assert_eq!(codex.get(codex.root(), "A00-A09", None, EntryKind::Category), None);
    }

    #[test]
    fn test_find_in_block_stops_early() {
        let (codex, _, block) = sample();
        assert!(codex.find_in_block(block, "A00", None).is_some());
        assert!(codex.find_in_block(block, "B00", None).is_none());
    }

    #[test]
    fn test_maxdepth_zero_finds_nothing() {
        let (codex, _, _) = sample();
        assert!(codex.search(codex.root(), "", Some(0)).is_empty());
        assert!(!codex.exists(codex.root(), "", Some(1)));
        assert_eq!(codex.search(codex.root(), "", Some(2)), vec![codex.root()]);
    }

    #[test]
    fn test_empty_code_matches_everything() {
        let (codex, _, _) = sample();
        assert_eq!(codex.search(codex.root(), "", None).len(), codex.len(codex.root()));
    }
}
