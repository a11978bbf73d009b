//! Board Store: whole-document CRUD for boards.
//!
//! Does not touch the reference index. Callers that remove items (including
//! by deleting a board) are responsible for clearing the index, which is what
//! [`crate::engine::ReferenceEngine`] does.

use std::collections::HashSet;
use std::sync::Arc;

use kanban_types::Board;
use kanban_types::BoardType;
use kanban_types::Column;
use kanban_types::default_columns;
use serde_json::Map;
use serde_json::Value;

use crate::error::KanbanError;
use crate::error::Result;
use crate::ids::validate_board_id;
use crate::ids::validate_column_id;
use crate::repository::BoardRepository;

/// Options for [`BoardStore::create_board`].
#[derive(Debug, Clone, Default)]
pub struct CreateBoardOptions {
    /// Explicit columns; the board type's preset is used when absent.
    pub columns: Option<Vec<Column>>,
    pub metadata: Option<Map<String, Value>>,
}

impl CreateBoardOptions {
    pub fn with_columns(columns: Vec<Column>) -> Self {
        Self {
            columns: Some(columns),
            metadata: None,
        }
    }
}

#[derive(Clone)]
pub struct BoardStore {
    repo: Arc<dyn BoardRepository>,
}

impl BoardStore {
    pub fn new(repo: Arc<dyn BoardRepository>) -> Self {
        Self { repo }
    }

    pub fn create_board(
        &self,
        board_id: &str,
        name: &str,
        board_type: BoardType,
        options: CreateBoardOptions,
    ) -> Result<Board> {
        validate_board_id(board_id)?;
        if self.repo.exists(board_id)? {
            return Err(KanbanError::AlreadyExists {
                board_id: board_id.to_string(),
            });
        }

        let columns = match options.columns {
            Some(columns) => {
                check_columns(board_id, &columns)?;
                columns
            }
            None => default_columns(board_type),
        };
        let mut board = Board::new(board_id, name, board_type, columns);
        if let Some(metadata) = options.metadata {
            board.metadata = metadata;
        }

        self.repo.save(&board)?;
        tracing::info!(
            board_id,
            board_type = %board_type,
            columns = board.columns.len(),
            "board created"
        );
        Ok(board)
    }

    pub fn get_board(&self, board_id: &str) -> Result<Board> {
        validate_board_id(board_id)?;
        self.repo
            .load(board_id)?
            .ok_or_else(|| KanbanError::board_not_found(board_id))
    }

    /// Every board, ordered by board id.
    pub fn get_all_boards(&self) -> Result<Vec<Board>> {
        let mut boards = Vec::new();
        for id in self.repo.list_ids()? {
            // A board deleted between listing and loading is skipped.
            if let Some(board) = self.repo.load(&id)? {
                boards.push(board);
            }
        }
        Ok(boards)
    }

    pub fn list_ids(&self) -> Result<Vec<String>> {
        self.repo.list_ids()
    }

    pub fn exists(&self, board_id: &str) -> Result<bool> {
        self.repo.exists(board_id)
    }

    /// Persist `board` as-is. The caller must already have called
    /// [`Board::touch`].
    pub fn save_board(&self, board: &Board) -> Result<()> {
        validate_board_id(&board.board_id)?;
        self.repo.save(board)
    }

    pub fn delete_board(&self, board_id: &str) -> Result<()> {
        validate_board_id(board_id)?;
        if !self.repo.delete(board_id)? {
            return Err(KanbanError::board_not_found(board_id));
        }
        Ok(())
    }

    pub fn rename_board(&self, board_id: &str, name: &str) -> Result<Board> {
        let mut board = self.get_board(board_id)?;
        board.name = name.to_string();
        board.touch();
        self.repo.save(&board)?;
        tracing::debug!(board_id, name, "board renamed");
        Ok(board)
    }

    /// Merge `metadata` into the board's metadata; a `null` value removes the
    /// key.
    pub fn update_board_metadata(
        &self,
        board_id: &str,
        metadata: Map<String, Value>,
    ) -> Result<Board> {
        let mut board = self.get_board(board_id)?;
        let keys = metadata.len();
        for (key, value) in metadata {
            if value.is_null() {
                board.metadata.remove(&key);
            } else {
                board.metadata.insert(key, value);
            }
        }
        board.touch();
        self.repo.save(&board)?;
        tracing::debug!(board_id, keys, "board metadata updated");
        Ok(board)
    }

    /// Insert an empty column at `position` (clamped), or append it.
    pub fn add_column(
        &self,
        board_id: &str,
        column_id: &str,
        name: &str,
        position: Option<usize>,
    ) -> Result<Board> {
        validate_column_id(column_id)?;
        let mut board = self.get_board(board_id)?;
        if board.has_column(column_id) {
            return Err(KanbanError::DuplicateColumn {
                board_id: board_id.to_string(),
                column_id: column_id.to_string(),
            });
        }
        let at = position.unwrap_or(board.columns.len()).min(board.columns.len());
        board.columns.insert(at, Column::new(column_id, name));
        board.touch();
        self.repo.save(&board)?;
        tracing::debug!(board_id, column_id, position = at, "column added");
        Ok(board)
    }
}

fn check_columns(board_id: &str, columns: &[Column]) -> Result<()> {
    let mut seen = HashSet::new();
    for column in columns {
        validate_column_id(&column.id)?;
        if !seen.insert(column.id.as_str()) {
            return Err(KanbanError::DuplicateColumn {
                board_id: board_id.to_string(),
                column_id: column.id.clone(),
            });
        }
    }
    Ok(())
}
