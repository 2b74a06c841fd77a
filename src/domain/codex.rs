use std::collections::BTreeMap;

use generational_arena::Arena;
use tracing::{instrument, warn};

use crate::domain::entry::{Entry, EntryId, EntryKind};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::revision::{BaseRules, Revision, RevisionRules};

/// Arena-based codex tree.
///
/// Owns every entry of one ICD revision/release. Entries reference their
/// parent and children by arena index, so moving an entry between parents is
/// a plain index update. Entries are never removed from the arena: a codex is
/// built once and then only read.
#[derive(Debug)]
pub struct Codex {
    arena: Arena<Entry>,
    root: EntryId,
    revision: Option<Revision>,
    release: String,
}

impl Codex {
    /// Empty codex without revision semantics: blocks never nest on their own.
    pub fn new(code: impl Into<String>, title: impl Into<String>, release: impl Into<String>) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(Entry::new(code, title, EntryKind::Root));
        Self {
            arena,
            root,
            revision: None,
            release: release.into(),
        }
    }

    /// Empty codex following the containment rules of `revision`.
    pub fn with_revision(revision: Revision, title: impl Into<String>, release: impl Into<String>) -> Self {
        let mut codex = Self::new(revision.root_code(), title, release);
        codex.revision = Some(revision);
        codex
    }

    pub fn root(&self) -> EntryId {
        self.root
    }

    pub fn revision(&self) -> Option<Revision> {
        self.revision
    }

    pub fn rules(&self) -> &'static dyn RevisionRules {
        match self.revision {
            Some(revision) => revision.rules(),
            None => &BaseRules,
        }
    }

    /// Number of entries held by the arena, attached or not.
    pub fn entry_count(&self) -> usize {
        self.arena.len()
    }

    pub fn get_entry(&self, id: EntryId) -> Option<&Entry> {
        self.arena.get(id)
    }

    pub(crate) fn entry(&self, id: EntryId) -> DomainResult<&Entry> {
        self.arena.get(id).ok_or(DomainError::NotAnEntry(id))
    }

    fn entry_mut(&mut self, id: EntryId) -> DomainResult<&mut Entry> {
        self.arena.get_mut(id).ok_or(DomainError::NotAnEntry(id))
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Store a detached entry after validating it against the revision rules.
    #[instrument(level = "trace", skip(self, entry), fields(code = %entry.code))]
    pub fn insert(&mut self, mut entry: Entry) -> DomainResult<EntryId> {
        self.rules().validate(&entry)?;
        entry.parent = None;
        entry.children.clear();
        Ok(self.arena.insert(entry))
    }

    /// Store an entry and attach it below `parent`.
    ///
    /// `parent` and the entry are both validated before anything is linked.
    #[instrument(level = "trace", skip(self, entry), fields(code = %entry.code))]
    pub fn insert_under(&mut self, entry: Entry, parent: EntryId) -> DomainResult<EntryId> {
        self.entry(parent)?;
        let id = self.insert(entry)?;
        self.add_child(parent, id)?;
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Attach `new_child` below `parent`, re-homing blocks where necessary.
    ///
    /// Adding an existing child or a root entry does nothing. When `parent`
    /// only holds blocks and `new_child` is a block, the child sinks into the
    /// first sibling that should contain it, and absorbs every sibling it
    /// should contain itself.
    #[instrument(level = "trace", skip(self))]
    pub fn add_child(&mut self, parent: EntryId, new_child: EntryId) -> DomainResult<()> {
        let child = self.entry(new_child)?;
        let child_kind = child.kind;
        let siblings = self.entry(parent)?.children.clone();

        if siblings.contains(&new_child) {
            return Ok(());
        }
        if child_kind == EntryKind::Root {
            warn!("ignoring root entry {:?} added as child of {:?}", new_child, parent);
            return Ok(());
        }
        if self.is_ancestor_or_self(new_child, parent) {
            return Err(DomainError::CycleDetected {
                parent,
                child: new_child,
            });
        }
        self.check_nesting(parent, new_child)?;

        if self.nests_blocks(parent, new_child) {
            let rules = self.rules();
            for sibling in siblings {
                if sibling == new_child {
                    continue;
                }
                let (sibling_entry, child_entry) = (self.entry(sibling)?, self.entry(new_child)?);
                if rules.should_contain(sibling_entry, child_entry) {
                    return self.add_child(sibling, new_child);
                }
                if rules.should_contain(child_entry, sibling_entry) {
                    self.remove_child(parent, sibling)?;
                    self.add_child(new_child, sibling)?;
                }
            }
        }

        if let Some(old_parent) = self.entry(new_child)?.parent {
            self.remove_child(old_parent, new_child)?;
        }
        self.entry_mut(new_child)?.parent = Some(parent);
        self.entry_mut(parent)?.children.push(new_child);
        Ok(())
    }

    /// Whether adding `new_child` below `parent` runs the nesting correction.
    fn nests_blocks(&self, parent: EntryId, new_child: EntryId) -> bool {
        let is_block = |id: EntryId| self.arena.get(id).is_some_and(|e| e.kind == EntryKind::Block);
        is_block(new_child) && self.arena.get(parent).is_some_and(|p| p.children.iter().all(|&s| is_block(s)))
    }

    /// Walk the nesting correction `add_child` would run and fail before any
    /// link changes if it would move an ancestor of `new_child` below it.
    fn check_nesting(&self, parent: EntryId, new_child: EntryId) -> DomainResult<()> {
        if !self.nests_blocks(parent, new_child) {
            return Ok(());
        }
        let rules = self.rules();
        let child_entry = self.entry(new_child)?;
        for &sibling in &self.entry(parent)?.children {
            if sibling == new_child {
                continue;
            }
            let sibling_entry = self.entry(sibling)?;
            if rules.should_contain(sibling_entry, child_entry) {
                if sibling_entry.children.contains(&new_child) {
                    return Ok(());
                }
                return self.check_nesting(sibling, new_child);
            }
            if rules.should_contain(child_entry, sibling_entry) && self.is_ancestor_or_self(sibling, new_child) {
                return Err(DomainError::CycleDetected {
                    parent: new_child,
                    child: sibling,
                });
            }
        }
        Ok(())
    }

    /// Detach `child` from `parent`.
    ///
    /// The child's parent link is only cleared if it still points at
    /// `parent`; removing a non-child is a no-op.
    #[instrument(level = "trace", skip(self))]
    pub fn remove_child(&mut self, parent: EntryId, child: EntryId) -> DomainResult<()> {
        self.entry(child)?;
        let children = &mut self.entry_mut(parent)?.children;
        let Some(pos) = children.iter().position(|&c| c == child) else {
            return Ok(());
        };
        children.remove(pos);

        let child = self.entry_mut(child)?;
        if child.parent == Some(parent) {
            child.parent = None;
        }
        Ok(())
    }

    /// Set the release; only legal on the root entry.
    pub fn set_release(&mut self, id: EntryId, release: impl Into<String>) -> DomainResult<()> {
        if self.entry(id)?.kind != EntryKind::Root || id != self.root {
            return Err(DomainError::IllegalOperation(
                "can only set the release on the codex root".to_string(),
            ));
        }
        self.release = release.into();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Upward navigation
    // ------------------------------------------------------------------

    pub fn release(&self) -> &str {
        &self.release
    }

    /// Release of the codex an entry belongs to.
    ///
    /// Detached subtrees have no root to inherit from and yield `None`.
    pub fn release_of(&self, id: EntryId) -> Option<&str> {
        (self.root_of(id) == Some(self.root)).then_some(self.release.as_str())
    }

    pub fn parent_of(&self, id: EntryId) -> Option<EntryId> {
        self.arena.get(id).and_then(|e| e.parent)
    }

    pub fn is_root(&self, id: EntryId) -> bool {
        self.arena.get(id).is_some_and(|e| e.parent.is_none())
    }

    /// Topmost ancestor of `id` (the entry itself when detached).
    pub fn root_of(&self, id: EntryId) -> Option<EntryId> {
        self.ancestors(id).last()
    }

    /// Depth in the tree; the root has depth 1.
    pub fn depth(&self, id: EntryId) -> usize {
        self.ancestors(id).count()
    }

    /// Number of consecutive ancestors (including `id`) sharing its kind.
    pub fn depth_in_kind(&self, id: EntryId) -> usize {
        let Some(kind) = self.arena.get(id).map(|e| e.kind) else {
            return 0;
        };
        self.ancestors(id)
            .take_while(|&a| self.arena.get(a).is_some_and(|e| e.kind == kind))
            .count()
    }

    /// Closest chapter at or above `id`.
    pub fn chapter_of(&self, id: EntryId) -> DomainResult<EntryId> {
        match self.entry(id)?.kind {
            EntryKind::Root => Err(DomainError::IllegalOperation(
                "root is not part of any chapter".to_string(),
            )),
            _ => self.closest_of_kind(id, EntryKind::Chapter).ok_or_else(|| {
                DomainError::IllegalOperation(format!("{:?} is not part of any chapter", id))
            }),
        }
    }

    /// Closest block at or above `id`.
    pub fn block_of(&self, id: EntryId) -> DomainResult<EntryId> {
        match self.entry(id)?.kind {
            EntryKind::Root | EntryKind::Chapter => Err(DomainError::IllegalOperation(
                "roots and chapters are not part of any block".to_string(),
            )),
            _ => self.closest_of_kind(id, EntryKind::Block).ok_or_else(|| {
                DomainError::IllegalOperation(format!("{:?} is not part of any block", id))
            }),
        }
    }

    fn closest_of_kind(&self, id: EntryId, kind: EntryKind) -> Option<EntryId> {
        self.ancestors(id)
            .find(|&a| self.arena.get(a).is_some_and(|e| e.kind == kind))
    }

    fn is_ancestor_or_self(&self, candidate: EntryId, id: EntryId) -> bool {
        self.ancestors(id).any(|a| a == candidate)
    }

    /// `id` followed by its parent, grandparent, ... up to the topmost entry.
    pub fn ancestors(&self, id: EntryId) -> Ancestors<'_> {
        Ancestors {
            codex: self,
            next: self.arena.get(id).map(|_| id),
        }
    }

    // ------------------------------------------------------------------
    // Children lookup
    // ------------------------------------------------------------------

    /// Direct children of `kind`, keyed by code.
    pub fn children_of_kind(&self, id: EntryId, kind: EntryKind) -> BTreeMap<&str, EntryId> {
        self.arena
            .get(id)
            .map(|e| {
                e.children
                    .iter()
                    .filter_map(|&c| self.arena.get(c).map(|child| (c, child)))
                    .filter(|(_, child)| child.kind == kind)
                    .map(|(c, child)| (child.code.as_str(), c))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Chapters of the codex keyed by roman numeral, e.g. `chapters()["II"]`.
    pub fn chapters(&self) -> BTreeMap<&str, EntryId> {
        self.children_of_kind(self.root, EntryKind::Chapter)
    }

    pub fn blocks(&self, id: EntryId) -> BTreeMap<&str, EntryId> {
        self.children_of_kind(id, EntryKind::Block)
    }

    pub fn categories(&self, id: EntryId) -> BTreeMap<&str, EntryId> {
        self.children_of_kind(id, EntryKind::Category)
    }
}

/// Upward walk along parent links, bounded by the tree depth.
pub struct Ancestors<'a> {
    codex: &'a Codex,
    next: Option<EntryId>,
}

impl Iterator for Ancestors<'_> {
    type Item = EntryId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.codex.parent_of(current);
        Some(current)
    }
}
