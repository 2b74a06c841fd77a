//! Domain-level errors (no external dependencies)

use generational_arena::Index;
use thiserror::Error;

/// Domain errors represent violations of the codex tree model.
/// These are independent of source formats and I/O.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid entry kind '{0}': must be one of 'root', 'chapter', 'block' or 'category'")]
    InvalidKind(String),

    #[error("invalid revision '{0}': must be one of '10', '10-CM' or '11'")]
    InvalidRevision(String),

    #[error("block code must be <start_code>-<end_code> or only <code>, not '{0}'")]
    MalformedRange(String),

    #[error("illegal operation: {0}")]
    IllegalOperation(String),

    #[error("not an entry of this codex: {0:?}")]
    NotAnEntry(Index),

    #[error("cycle detected: {child:?} is an ancestor of {parent:?}")]
    CycleDetected { parent: Index, child: Index },
}

/// Result type for codex tree operations.
pub type DomainResult<T> = Result<T, DomainError>;
