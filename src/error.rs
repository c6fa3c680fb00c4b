// src/error.rs

use crate::model::{NodeId, RowIndex};

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Unknown commit, or a commit that is not currently visible
    #[error("commit not found in the visible graph")]
    NotFound,

    #[error("node id {0} is out of range")]
    InvalidId(NodeId),

    #[error("row {row} is outside the visible range 0..{count}")]
    InvalidRow { row: RowIndex, count: usize },

    /// The handle was issued for another graph version or points past the row
    #[error("print element handle is stale or unknown")]
    InvalidElement,

    #[error("commit at position {0} is listed twice")]
    DuplicateCommit(usize),

    #[error("commit at position {child} names parent at earlier position {parent}")]
    NotTopological { child: usize, parent: usize },
}
