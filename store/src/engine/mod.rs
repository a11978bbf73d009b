//! Reference Engine: the caller-facing API.
//!
//! Every mutation writes the board first and the index second. The board is
//! the source of truth; if the index write fails the error is returned and
//! the board write stands. [`ReferenceEngine::rebuild_index`] repairs the
//! index afterwards.
//!
//! Column uniqueness (no two references with the same `(type, id)` in one
//! column) is enforced here and nowhere else.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use kanban_types::Board;
use kanban_types::BoardReference;
use kanban_types::BoardType;
use kanban_types::Column;
use kanban_types::IndexEntry;
use kanban_types::ItemReference;
use kanban_types::ItemType;
use kanban_types::ReferenceMetadata;
use serde_json::Map;
use serde_json::Value;

use crate::board_store::BoardStore;
use crate::board_store::CreateBoardOptions;
use crate::config::KanbanConfig;
use crate::error::KanbanError;
use crate::error::Result;
use crate::ids::validate_column_id;
use crate::ids::validate_item_id;
use crate::reference_index::ReferenceIndex;
use crate::repository::BoardRepository;
use crate::repository::FsStorage;
use crate::repository::IndexRepository;

mod repair;

pub use repair::CleanupReport;
pub use repair::DriftEntry;
pub use repair::IndexDrift;
pub use repair::IssueKind;
pub use repair::ReferenceIssue;
pub use repair::RemovedEntry;

#[derive(Clone)]
pub struct ReferenceEngine {
    boards: BoardStore,
    index: ReferenceIndex,
    default_added_by: String,
}

impl ReferenceEngine {
    /// Engine over a single backend that stores both boards and indexes.
    pub fn new<S>(storage: Arc<S>) -> Self
    where
        S: BoardRepository + IndexRepository + 'static,
    {
        let boards: Arc<dyn BoardRepository> = storage.clone();
        let index: Arc<dyn IndexRepository> = storage;
        Self::with_repositories(boards, index)
    }

    pub fn with_repositories(
        boards: Arc<dyn BoardRepository>,
        index: Arc<dyn IndexRepository>,
    ) -> Self {
        Self {
            boards: BoardStore::new(boards),
            index: ReferenceIndex::new(index),
            default_added_by: kanban_types::DEFAULT_ADDED_BY.to_string(),
        }
    }

    /// Open the file-backed store for `project_dir`, honouring `kanban.toml`
    /// and `KANBAN_*` overrides.
    pub fn open(project_dir: &Path) -> Result<Self> {
        let config = KanbanConfig::discover(project_dir)?;
        Self::open_with_config(project_dir, &config)
    }

    pub fn open_with_config(project_dir: &Path, config: &KanbanConfig) -> Result<Self> {
        let storage = Arc::new(FsStorage::from_config(project_dir, config)?);
        tracing::debug!(root = %storage.root().display(), "opened kanban store");
        Ok(Self::new(storage).with_default_added_by(config.default_added_by.clone()))
    }

    /// Attribution used when a reference is added without `addedBy`.
    pub fn with_default_added_by(mut self, added_by: impl Into<String>) -> Self {
        self.default_added_by = added_by.into();
        self
    }

    pub fn board_store(&self) -> &BoardStore {
        &self.boards
    }

    pub fn reference_index(&self) -> &ReferenceIndex {
        &self.index
    }

    // ── Boards ──────────────────────────────────────────────────────────

    pub fn create_board(
        &self,
        board_id: &str,
        name: &str,
        board_type: BoardType,
        options: CreateBoardOptions,
    ) -> Result<Board> {
        self.boards.create_board(board_id, name, board_type, options)
    }

    /// Create a board from a textual type such as `"sprint"`. Unknown types
    /// get the `project` preset.
    pub fn create_board_lossy(
        &self,
        board_id: &str,
        name: &str,
        board_type: &str,
        options: CreateBoardOptions,
    ) -> Result<Board> {
        let parsed = match board_type.parse::<BoardType>() {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!(board_id, board_type, "unknown board type, using project preset");
                BoardType::Project
            }
        };
        self.create_board(board_id, name, parsed, options)
    }

    pub fn get_board(&self, board_id: &str) -> Result<Board> {
        self.boards.get_board(board_id)
    }

    pub fn get_all_boards(&self) -> Result<Vec<Board>> {
        self.boards.get_all_boards()
    }

    pub fn list_board_ids(&self) -> Result<Vec<String>> {
        self.boards.list_ids()
    }

    pub fn rename_board(&self, board_id: &str, name: &str) -> Result<Board> {
        self.boards.rename_board(board_id, name)
    }

    pub fn update_board_metadata(
        &self,
        board_id: &str,
        metadata: Map<String, Value>,
    ) -> Result<Board> {
        self.boards.update_board_metadata(board_id, metadata)
    }

    pub fn add_column(
        &self,
        board_id: &str,
        column_id: &str,
        name: &str,
        position: Option<usize>,
    ) -> Result<Board> {
        self.boards.add_column(board_id, column_id, name, position)
    }

    /// Remove a column and clear its items from the index.
    pub fn remove_column(&self, board_id: &str, column_id: &str) -> Result<Column> {
        let mut board = self.boards.get_board(board_id)?;
        let position = board
            .columns
            .iter()
            .position(|c| c.id == column_id)
            .ok_or_else(|| KanbanError::column_not_found(board_id, column_id))?;
        let column = board.columns.remove(position);
        board.touch();
        self.boards.save_board(&board)?;

        for item in &column.items {
            self.index
                .clear_reference(item.item_type, &item.id, board_id, Some(column_id))?;
        }
        tracing::debug!(
            board_id,
            column_id,
            items = column.items.len(),
            "column removed"
        );
        Ok(column)
    }

    /// Delete a board and every index entry pointing at it.
    ///
    /// Index entries are cleared before the board document is removed. A
    /// crash in between leaves a board whose items are partly unindexed,
    /// which [`ReferenceEngine::rebuild_index`] repairs.
    pub fn delete_board(&self, board_id: &str) -> Result<Board> {
        let board = self.boards.get_board(board_id)?;

        let keys: BTreeSet<(ItemType, String)> = board
            .items()
            .map(|(_, item)| (item.item_type, item.id.clone()))
            .collect();
        for (item_type, item_id) in &keys {
            self.index
                .clear_reference(*item_type, item_id, board_id, None)?;
        }

        self.boards.delete_board(board_id)?;
        tracing::info!(board_id, references = keys.len(), "board deleted");
        Ok(board)
    }

    // ── References ──────────────────────────────────────────────────────

    pub fn add_reference(
        &self,
        item_type: ItemType,
        item_id: &str,
        board_id: &str,
        column_id: &str,
        metadata: ReferenceMetadata,
    ) -> Result<ItemReference> {
        validate_item_id(item_id)?;
        validate_column_id(column_id)?;
        let mut board = self.boards.get_board(board_id)?;
        let column = board
            .column_mut(column_id)
            .ok_or_else(|| KanbanError::column_not_found(board_id, column_id))?;
        if column.contains(item_type, item_id) {
            return Err(KanbanError::DuplicateReference {
                item_type,
                item_id: item_id.to_string(),
                board_id: board_id.to_string(),
                column_id: column_id.to_string(),
            });
        }

        let item = ItemReference::new(item_type, item_id, metadata, &self.default_added_by);
        column.items.push(item.clone());
        board.touch();
        self.boards.save_board(&board)?;

        self.index
            .record_reference(item_type, item_id, board_id, column_id)?;
        tracing::debug!(%item_type, item_id, board_id, column_id, "reference added");
        Ok(item)
    }

    /// Remove `(item_type, item_id)` from `column_id`, or from every column of
    /// the board when `column_id` is `None`. Returns the removed references.
    pub fn remove_reference(
        &self,
        item_type: ItemType,
        item_id: &str,
        board_id: &str,
        column_id: Option<&str>,
    ) -> Result<Vec<ItemReference>> {
        let mut board = self.boards.get_board(board_id)?;
        if let Some(column_id) = column_id
            && !board.has_column(column_id)
        {
            return Err(KanbanError::column_not_found(board_id, column_id));
        }

        let mut removed = Vec::new();
        for column in board
            .columns
            .iter_mut()
            .filter(|c| column_id.is_none_or(|id| c.id == id))
        {
            if let Some(pos) = column.position_of(item_type, item_id) {
                removed.push(column.items.remove(pos));
            }
        }
        if removed.is_empty() {
            return Err(KanbanError::ReferenceNotFound {
                item_type: Some(item_type),
                item_id: item_id.to_string(),
                board_id: board_id.to_string(),
                column_id: column_id.map(str::to_string),
            });
        }

        board.touch();
        self.boards.save_board(&board)?;
        self.index
            .clear_reference(item_type, item_id, board_id, column_id)?;
        tracing::debug!(
            %item_type,
            item_id,
            board_id,
            column_id = column_id.unwrap_or("*"),
            removed = removed.len(),
            "reference removed"
        );
        Ok(removed)
    }

    /// Move the reference with `item_id` from one column of a board to the end
    /// of another, resetting its `added_to_column` timestamp.
    pub fn move_reference(
        &self,
        item_id: &str,
        board_id: &str,
        from_column_id: &str,
        to_column_id: &str,
    ) -> Result<ItemReference> {
        let mut board = self.boards.get_board(board_id)?;

        let from = board
            .column(from_column_id)
            .ok_or_else(|| KanbanError::column_not_found(board_id, from_column_id))?;
        let Some(position) = from.items.iter().position(|i| i.id == item_id) else {
            return Err(KanbanError::ReferenceNotFound {
                item_type: None,
                item_id: item_id.to_string(),
                board_id: board_id.to_string(),
                column_id: Some(from_column_id.to_string()),
            });
        };
        let item_type = from.items[position].item_type;

        let to = board
            .column(to_column_id)
            .ok_or_else(|| KanbanError::column_not_found(board_id, to_column_id))?;
        if to_column_id != from_column_id && to.contains(item_type, item_id) {
            return Err(KanbanError::DuplicateReference {
                item_type,
                item_id: item_id.to_string(),
                board_id: board_id.to_string(),
                column_id: to_column_id.to_string(),
            });
        }

        let mut item = match board.column_mut(from_column_id) {
            Some(column) => column.items.remove(position),
            None => return Err(KanbanError::column_not_found(board_id, from_column_id)),
        };
        item.added_to_column = Utc::now();
        match board.column_mut(to_column_id) {
            Some(column) => column.items.push(item.clone()),
            None => return Err(KanbanError::column_not_found(board_id, to_column_id)),
        }
        board.touch();
        self.boards.save_board(&board)?;

        let retargeted =
            self.index
                .retarget(item_type, item_id, board_id, from_column_id, to_column_id)?;
        if !retargeted {
            tracing::warn!(
                %item_type,
                item_id,
                board_id,
                from_column_id,
                "index had no entry for moved reference; recording a new one"
            );
            let mut entry = IndexEntry::new(board_id, to_column_id);
            entry.updated_at = Some(item.added_to_column);
            self.index.record_entry(item_type, item_id, entry)?;
        }
        tracing::debug!(
            %item_type,
            item_id,
            board_id,
            from_column_id,
            to_column_id,
            "reference moved"
        );
        Ok(item)
    }

    /// Every board/column currently holding `(item_type, item_id)`.
    pub fn get_referencing_boards(
        &self,
        item_type: ItemType,
        item_id: &str,
    ) -> Result<Vec<IndexEntry>> {
        self.index.lookup(item_type, item_id)
    }

    /// All references on a board, in column order, each tagged with its column.
    pub fn get_board_references(&self, board_id: &str) -> Result<Vec<BoardReference>> {
        let board = self.boards.get_board(board_id)?;
        Ok(board
            .items()
            .map(|(column, item)| BoardReference {
                item: item.clone(),
                column: column.id.clone(),
                column_name: column.name.clone(),
            })
            .collect())
    }
}
