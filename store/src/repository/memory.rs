//! In-memory repository for tests and embedding.
//!
//! Supports injected write failures so the board-written/index-not-written
//! window can be exercised deterministically.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use kanban_types::Board;
use kanban_types::ItemType;
use kanban_types::ReferenceIndexDoc;

use super::BoardRepository;
use super::IndexRepository;
use crate::error::KanbanError;
use crate::error::Result;

#[derive(Debug, Default)]
struct Inner {
    boards: BTreeMap<String, Board>,
    indexes: HashMap<ItemType, ReferenceIndexDoc>,
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
    fail_board_writes: AtomicBool,
    fail_index_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent board save/delete fail until reset.
    pub fn fail_board_writes(&self, fail: bool) {
        self.fail_board_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent index save fail until reset.
    pub fn fail_index_writes(&self, fail: bool) {
        self.fail_index_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw access to a stored index document, bypassing fault injection.
    pub fn index_snapshot(&self, item_type: ItemType) -> ReferenceIndexDoc {
        self.lock()
            .indexes
            .get(&item_type)
            .cloned()
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(flag: &AtomicBool, what: String) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(KanbanError::io(
                PathBuf::from(format!("memory://{what}")),
                std::io::Error::other("injected write failure"),
            ));
        }
        Ok(())
    }
}

impl BoardRepository for MemoryStorage {
    fn list_ids(&self) -> Result<Vec<String>> {
        Ok(self.lock().boards.keys().cloned().collect())
    }

    fn load(&self, board_id: &str) -> Result<Option<Board>> {
        Ok(self.lock().boards.get(board_id).cloned())
    }

    fn save(&self, board: &Board) -> Result<()> {
        Self::check(&self.fail_board_writes, format!("boards/{}", board.board_id))?;
        self.lock()
            .boards
            .insert(board.board_id.clone(), board.clone());
        Ok(())
    }

    fn delete(&self, board_id: &str) -> Result<bool> {
        Self::check(&self.fail_board_writes, format!("boards/{board_id}"))?;
        Ok(self.lock().boards.remove(board_id).is_some())
    }

    fn exists(&self, board_id: &str) -> Result<bool> {
        Ok(self.lock().boards.contains_key(board_id))
    }
}

impl IndexRepository for MemoryStorage {
    fn load(&self, item_type: ItemType) -> Result<ReferenceIndexDoc> {
        Ok(self.index_snapshot(item_type))
    }

    fn save(&self, item_type: ItemType, doc: &ReferenceIndexDoc) -> Result<()> {
        Self::check(&self.fail_index_writes, format!("references/{item_type}"))?;
        self.lock().indexes.insert(item_type, doc.clone());
        Ok(())
    }
}
