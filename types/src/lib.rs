//! `kanban-types` — data model for the board/reference store.
//!
//! Boards hold ordered columns, columns hold ordered [`ItemReference`]s, and
//! the per-type [`ReferenceIndexDoc`] maps an item id back to every
//! board/column that currently holds it. Referenced items are opaque
//! `(type, id)` pairs; nothing here reads their content.
//!
//! This crate performs no I/O. Persistence lives in `kanban-store`.

pub mod board;
pub mod defaults;
pub mod index;
pub mod item;

pub use board::Board;
pub use board::BoardReference;
pub use board::BoardType;
pub use board::Column;
pub use defaults::default_columns;
pub use defaults::default_columns_for;
pub use index::IndexEntry;
pub use index::ReferenceIndexDoc;
pub use item::ItemReference;
pub use item::ItemType;
pub use item::Priority;
pub use item::ReferenceMetadata;

/// Attribution recorded on references added without an explicit `addedBy`.
pub const DEFAULT_ADDED_BY: &str = "system";

/// Status recorded on references added without an explicit `status`.
pub const DEFAULT_STATUS: &str = "pending";

/// Error returned when parsing one of the closed enumerations from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}
