//! Domain layer: the codex tree engine
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod codex;
pub mod entry;
pub mod error;
pub mod iter;
pub mod query;
pub mod render;
pub mod revision;

pub use codex::{Ancestors, Codex};
pub use entry::{chapter_code, romanize, BlockRange, Entry, EntryId, EntryKind, Linearization};
pub use error::{DomainError, DomainResult};
pub use iter::{Entries, Leaves};
pub use render::TreeLines;
pub use revision::{BaseRules, GroupingRules, RangeRules, Revision, RevisionRules};
