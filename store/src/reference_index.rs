//! Reference Index: the per-type reverse lookup from item id to locations.
//!
//! Each operation is load → mutate → save on exactly one type's document.

use std::sync::Arc;

use kanban_types::IndexEntry;
use kanban_types::ItemType;
use kanban_types::ReferenceIndexDoc;

use crate::error::Result;
use crate::repository::IndexRepository;

#[derive(Clone)]
pub struct ReferenceIndex {
    repo: Arc<dyn IndexRepository>,
}

impl ReferenceIndex {
    pub fn new(repo: Arc<dyn IndexRepository>) -> Self {
        Self { repo }
    }

    /// Append a fresh entry for (`board_id`, `column_id`). Does not dedupe.
    pub fn record_reference(
        &self,
        item_type: ItemType,
        item_id: &str,
        board_id: &str,
        column_id: &str,
    ) -> Result<()> {
        self.record_entry(item_type, item_id, IndexEntry::new(board_id, column_id))
    }

    pub(crate) fn record_entry(
        &self,
        item_type: ItemType,
        item_id: &str,
        entry: IndexEntry,
    ) -> Result<()> {
        let mut doc = self.repo.load(item_type)?;
        doc.record(item_id, entry);
        self.repo.save(item_type, &doc)
    }

    /// Remove entries for `board_id` (only in `column_id` when given). The id
    /// is dropped from the document once it has no entries left. Returns the
    /// number of entries removed; nothing is written when that is zero.
    pub fn clear_reference(
        &self,
        item_type: ItemType,
        item_id: &str,
        board_id: &str,
        column_id: Option<&str>,
    ) -> Result<usize> {
        let mut doc = self.repo.load(item_type)?;
        let removed = doc.clear(item_id, board_id, column_id);
        if removed > 0 {
            self.repo.save(item_type, &doc)?;
        }
        Ok(removed)
    }

    /// Move the entry at (`board_id`, `from_column`) to `to_column`. Returns
    /// `false` without writing when the index has no such entry.
    pub fn retarget(
        &self,
        item_type: ItemType,
        item_id: &str,
        board_id: &str,
        from_column: &str,
        to_column: &str,
    ) -> Result<bool> {
        let mut doc = self.repo.load(item_type)?;
        if !doc.retarget(item_id, board_id, from_column, to_column) {
            return Ok(false);
        }
        self.repo.save(item_type, &doc)?;
        Ok(true)
    }

    pub fn lookup(&self, item_type: ItemType, item_id: &str) -> Result<Vec<IndexEntry>> {
        Ok(self.repo.load(item_type)?.lookup(item_id).to_vec())
    }

    pub fn load(&self, item_type: ItemType) -> Result<ReferenceIndexDoc> {
        self.repo.load(item_type)
    }

    /// Overwrite the whole document for `item_type`.
    pub fn replace(&self, item_type: ItemType, doc: &ReferenceIndexDoc) -> Result<()> {
        self.repo.save(item_type, doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStorage;
    use pretty_assertions::assert_eq;

    fn index() -> (Arc<MemoryStorage>, ReferenceIndex) {
        let storage = Arc::new(MemoryStorage::new());
        let index = ReferenceIndex::new(storage.clone());
        (storage, index)
    }

    #[test]
    fn record_then_lookup() {
        let (_storage, index) = index();
        index
            .record_reference(ItemType::Requirement, "REQ-1", "a", "todo")
            .unwrap();
        index
            .record_reference(ItemType::Requirement, "REQ-1", "b", "done")
            .unwrap();
        let boards: Vec<String> = index
            .lookup(ItemType::Requirement, "REQ-1")
            .unwrap()
            .into_iter()
            .map(|e| e.board_id)
            .collect();
        assert_eq!(boards, vec!["a", "b"]);
        assert!(index.lookup(ItemType::Task, "REQ-1").unwrap().is_empty());
    }

    #[test]
    fn clear_last_entry_prunes_persisted_key() {
        let (storage, index) = index();
        index
            .record_reference(ItemType::Epic, "E-1", "a", "todo")
            .unwrap();
        assert_eq!(
            index
                .clear_reference(ItemType::Epic, "E-1", "a", Some("todo"))
                .unwrap(),
            1
        );
        assert!(!storage.index_snapshot(ItemType::Epic).contains_id("E-1"));
        assert_eq!(
            index
                .clear_reference(ItemType::Epic, "E-1", "a", None)
                .unwrap(),
            0
        );
    }

    #[test]
    fn retarget_missing_entry_reports_false() {
        let (_storage, index) = index();
        assert!(
            !index
                .retarget(ItemType::Task, "T-1", "a", "todo", "done")
                .unwrap()
        );
        index
            .record_reference(ItemType::Task, "T-1", "a", "todo")
            .unwrap();
        assert!(
            index
                .retarget(ItemType::Task, "T-1", "a", "todo", "done")
                .unwrap()
        );
        assert_eq!(index.lookup(ItemType::Task, "T-1").unwrap()[0].column_id, "done");
    }
}
