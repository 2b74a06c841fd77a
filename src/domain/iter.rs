use crate::domain::codex::Codex;
use crate::domain::entry::{Entry, EntryId};

impl Codex {
    /// Pre-order walk over `id` and all of its descendants.
    ///
    /// Every call starts a fresh traversal.
    pub fn entries(&self, id: EntryId) -> Entries<'_> {
        Entries::new(self, id)
    }

    /// Depth-first walk over the entries below `id` that have no children.
    pub fn leaves(&self, id: EntryId) -> Leaves<'_> {
        Leaves {
            inner: Entries::new(self, id),
        }
    }

    /// Size of the subtree rooted at `id`, the entry included.
    pub fn len(&self, id: EntryId) -> usize {
        self.entries(id).count()
    }
}

pub struct Entries<'a> {
    codex: &'a Codex,
    stack: Vec<EntryId>,
}

impl<'a> Entries<'a> {
    fn new(codex: &'a Codex, start: EntryId) -> Self {
        let mut stack = Vec::new();
        if codex.get_entry(start).is_some() {
            stack.push(start);
        }
        Self { codex, stack }
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = (EntryId, &'a Entry);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Some(entry) = self.codex.get_entry(current) {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(entry.children.iter().rev());
                return Some((current, entry));
            }
        }
        None
    }
}

pub struct Leaves<'a> {
    inner: Entries<'a>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = (EntryId, &'a Entry);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.by_ref().find(|(_, entry)| entry.is_leaf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entry::EntryKind;

    //  root
    //  ├── I
    //  │   ├── A00
    //  │   └── A01
    //  └── II
    fn sample() -> Codex {
        let mut codex = Codex::new("root", "", "");
        let root = codex.root();
        let first = codex.insert_under(Entry::new("I", "", EntryKind::Chapter), root).unwrap();
        codex.insert_under(Entry::new("A00", "", EntryKind::Category), first).unwrap();
        codex.insert_under(Entry::new("A01", "", EntryKind::Category), first).unwrap();
        codex.insert_under(Entry::new("II", "", EntryKind::Chapter), root).unwrap();
        codex
    }

    fn codes<'a>(it: impl Iterator<Item = (EntryId, &'a Entry)>) -> Vec<&'a str> {
        it.map(|(_, e)| e.code.as_str()).collect()
    }

    #[test]
    fn test_entries_preorder() {
        let codex = sample();
        assert_eq!(codes(codex.entries(codex.root())), ["root", "I", "A00", "A01", "II"]);
    }

    #[test]
    fn test_leaves_in_depth_first_order() {
        let codex = sample();
        assert_eq!(codes(codex.leaves(codex.root())), ["A00", "A01", "II"]);
    }

    #[test]
    fn test_iterators_are_restartable() {
        let codex = sample();
        let first: Vec<_> = codes(codex.entries(codex.root()));
        let second: Vec<_> = codes(codex.entries(codex.root()));
        assert_eq!(first, second);
        assert_eq!(codex.leaves(codex.root()).count(), codex.leaves(codex.root()).count());
    }

    #[test]
    fn test_len() {
        let codex = sample();
        assert_eq!(codex.len(codex.root()), 5);
        let first = codex.chapters()["I"];
        assert_eq!(codex.len(first), 3);
    }

    #[test]
    fn test_single_entry_is_its_own_leaf() {
        let codex = Codex::new("root", "", "");
        assert_eq!(codes(codex.leaves(codex.root())), ["root"]);
    }
}
