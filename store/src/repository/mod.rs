//! Storage abstraction for board and index documents.
//!
//! The Board Store and Reference Index only talk to these traits, which
//! keeps directory scanning in one place and lets tests swap in
//! [`MemoryStorage`].

use kanban_types::Board;
use kanban_types::ItemType;
use kanban_types::ReferenceIndexDoc;

use crate::error::Result;

mod fs;
mod memory;

pub use fs::BOARDS_DIR;
pub use fs::FsStorage;
pub use fs::REFERENCES_DIR;
pub use memory::MemoryStorage;

/// Persistence for whole board documents, keyed by board id.
pub trait BoardRepository: Send + Sync {
    /// Every stored board id, sorted.
    fn list_ids(&self) -> Result<Vec<String>>;

    fn load(&self, board_id: &str) -> Result<Option<Board>>;

    /// Overwrite the document for `board.board_id`.
    fn save(&self, board: &Board) -> Result<()>;

    /// Returns `false` if there was nothing to delete.
    fn delete(&self, board_id: &str) -> Result<bool>;

    fn exists(&self, board_id: &str) -> Result<bool> {
        Ok(self.list_ids()?.iter().any(|id| id == board_id))
    }
}

/// Persistence for the per-type reverse index documents.
pub trait IndexRepository: Send + Sync {
    /// The index for `item_type`; empty when none has been written yet.
    fn load(&self, item_type: ItemType) -> Result<ReferenceIndexDoc>;

    fn save(&self, item_type: ItemType, doc: &ReferenceIndexDoc) -> Result<()>;
}
