//! Error taxonomy for board and reference operations.
//!
//! Every variant carries the identifiers involved so callers can report the
//! failure without extra lookups. Nothing is retried or rolled back here.

use std::path::PathBuf;

use kanban_types::ItemType;
use thiserror::Error;

use crate::config::ConfigError;

/// Kanban store result type alias
pub type Result<T> = std::result::Result<T, KanbanError>;

#[derive(Debug, Error)]
pub enum KanbanError {
    #[error("board already exists: {board_id}")]
    AlreadyExists { board_id: String },

    #[error("board not found: {board_id}")]
    BoardNotFound { board_id: String },

    #[error("column not found: {board_id}/{column_id}")]
    ColumnNotFound { board_id: String, column_id: String },

    #[error("column already exists: {board_id}/{column_id}")]
    DuplicateColumn { board_id: String, column_id: String },

    #[error("reference not found: {item_id} on board {board_id}")]
    ReferenceNotFound {
        item_type: Option<ItemType>,
        item_id: String,
        board_id: String,
        column_id: Option<String>,
    },

    #[error("duplicate reference: {item_type} {item_id} already in {board_id}/{column_id}")]
    DuplicateReference {
        item_type: ItemType,
        item_id: String,
        board_id: String,
        column_id: String,
    },

    #[error("invalid {what} {value:?}: {reason}")]
    InvalidId {
        what: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("document corrupted at {path}: {reason}")]
    Corrupted { path: PathBuf, reason: String },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Coarse classification of [`KanbanError`] for callers that only branch on
/// the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    ColumnNotFound,
    DuplicateReference,
    InvalidId,
    Storage,
    Config,
}

impl KanbanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            KanbanError::AlreadyExists { .. } | KanbanError::DuplicateColumn { .. } => {
                ErrorKind::AlreadyExists
            }
            KanbanError::BoardNotFound { .. } | KanbanError::ReferenceNotFound { .. } => {
                ErrorKind::NotFound
            }
            KanbanError::ColumnNotFound { .. } => ErrorKind::ColumnNotFound,
            KanbanError::DuplicateReference { .. } => ErrorKind::DuplicateReference,
            KanbanError::InvalidId { .. } => ErrorKind::InvalidId,
            KanbanError::Io { .. } | KanbanError::Corrupted { .. } | KanbanError::Serialize(_) => {
                ErrorKind::Storage
            }
            KanbanError::Config(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        KanbanError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn board_not_found(board_id: &str) -> Self {
        KanbanError::BoardNotFound {
            board_id: board_id.to_string(),
        }
    }

    pub(crate) fn column_not_found(board_id: &str, column_id: &str) -> Self {
        KanbanError::ColumnNotFound {
            board_id: board_id.to_string(),
            column_id: column_id.to_string(),
        }
    }
}
