//! Reverse index document: item id → every board/column holding it.
//!
//! One document exists per [`crate::ItemType`]. The document is derived data;
//! it must always be reconstructable from the boards. An id whose entry list
//! becomes empty is removed from the map rather than kept as `[]`.

use std::collections::BTreeMap;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// One location of an item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub board_id: String,
    pub column_id: String,
    pub added_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl IndexEntry {
    pub fn new(board_id: impl Into<String>, column_id: impl Into<String>) -> Self {
        Self {
            board_id: board_id.into(),
            column_id: column_id.into(),
            added_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn is_at(&self, board_id: &str, column_id: &str) -> bool {
        self.board_id == board_id && self.column_id == column_id
    }
}

/// Per-type index document. Keys are kept sorted so the persisted form is
/// deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ReferenceIndexDoc {
    entries: BTreeMap<String, Vec<IndexEntry>>,
}

impl ReferenceIndexDoc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct item ids.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Total number of entries across all ids.
    pub fn entry_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn contains_id(&self, item_id: &str) -> bool {
        self.entries.contains_key(item_id)
    }

    pub fn lookup(&self, item_id: &str) -> &[IndexEntry] {
        self.entries.get(item_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[IndexEntry])> {
        self.entries
            .iter()
            .map(|(id, entries)| (id.as_str(), entries.as_slice()))
    }

    /// Append `entry` to `item_id`'s list. No deduplication.
    pub fn record(&mut self, item_id: &str, entry: IndexEntry) {
        self.entries
            .entry(item_id.to_string())
            .or_default()
            .push(entry);
    }

    /// Remove entries for `board_id`, limited to `column_id` when given.
    /// Returns how many entries were removed.
    pub fn clear(&mut self, item_id: &str, board_id: &str, column_id: Option<&str>) -> usize {
        let Some(list) = self.entries.get_mut(item_id) else {
            return 0;
        };
        let before = list.len();
        list.retain(|e| !(e.board_id == board_id && column_id.is_none_or(|c| e.column_id == c)));
        let removed = before - list.len();
        if list.is_empty() {
            self.entries.remove(item_id);
        }
        removed
    }

    /// Point the entry at (`board_id`, `from_column`) to `to_column` and stamp
    /// `updated_at`. Returns `false` when no such entry exists.
    pub fn retarget(
        &mut self,
        item_id: &str,
        board_id: &str,
        from_column: &str,
        to_column: &str,
    ) -> bool {
        let Some(entry) = self
            .entries
            .get_mut(item_id)
            .and_then(|list| list.iter_mut().find(|e| e.is_at(board_id, from_column)))
        else {
            return false;
        };
        entry.column_id = to_column.to_string();
        entry.updated_at = Some(Utc::now());
        true
    }

    /// Drop every entry for which `keep` returns false, pruning ids left
    /// without entries. Returns the dropped `(item_id, entry)` pairs.
    pub fn retain<F>(&mut self, mut keep: F) -> Vec<(String, IndexEntry)>
    where
        F: FnMut(&str, &IndexEntry) -> bool,
    {
        let mut dropped = Vec::new();
        for (id, list) in self.entries.iter_mut() {
            let (kept, gone): (Vec<_>, Vec<_>) =
                list.drain(..).partition(|e| keep(id.as_str(), e));
            *list = kept;
            dropped.extend(gone.into_iter().map(|e| (id.clone(), e)));
        }
        self.entries.retain(|_, list| !list.is_empty());
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc_with(entries: &[(&str, &str, &str)]) -> ReferenceIndexDoc {
        let mut doc = ReferenceIndexDoc::new();
        for (id, board, column) in entries {
            doc.record(id, IndexEntry::new(*board, *column));
        }
        doc
    }

    #[test]
    fn lookup_missing_id_is_empty() {
        let doc = ReferenceIndexDoc::new();
        assert!(doc.lookup("REQ-1").is_empty());
    }

    #[test]
    fn clear_scoped_to_column_keeps_other_columns() {
        let mut doc = doc_with(&[
            ("T-1", "a", "todo"),
            ("T-1", "a", "done"),
            ("T-1", "b", "todo"),
        ]);
        assert_eq!(doc.clear("T-1", "a", Some("todo")), 1);
        let left: Vec<(&str, &str)> = doc
            .lookup("T-1")
            .iter()
            .map(|e| (e.board_id.as_str(), e.column_id.as_str()))
            .collect();
        assert_eq!(left, vec![("a", "done"), ("b", "todo")]);
    }

    #[test]
    fn clear_without_column_removes_whole_board() {
        let mut doc = doc_with(&[
            ("T-1", "a", "todo"),
            ("T-1", "a", "done"),
            ("T-1", "b", "todo"),
        ]);
        assert_eq!(doc.clear("T-1", "a", None), 2);
        assert_eq!(doc.lookup("T-1").len(), 1);
    }

    #[test]
    fn clearing_last_entry_prunes_key() {
        let mut doc = doc_with(&[("REQ-1", "demo", "planning")]);
        assert_eq!(doc.clear("REQ-1", "demo", None), 1);
        assert!(!doc.contains_id("REQ-1"));
        assert_eq!(serde_json::to_string(&doc).unwrap(), "{}");
    }

    #[test]
    fn retarget_updates_column_and_stamps() {
        let mut doc = doc_with(&[("REQ-1", "demo", "planning")]);
        assert!(doc.retarget("REQ-1", "demo", "planning", "in-progress"));
        let entry = &doc.lookup("REQ-1")[0];
        assert_eq!(entry.column_id, "in-progress");
        assert!(entry.updated_at.is_some());
        assert!(!doc.retarget("REQ-1", "demo", "planning", "done"));
    }

    #[test]
    fn retain_reports_dropped_and_prunes() {
        let mut doc = doc_with(&[
            ("A", "gone", "x"),
            ("B", "gone", "x"),
            ("B", "kept", "y"),
        ]);
        let dropped = doc.retain(|_, e| e.board_id != "gone");
        assert_eq!(dropped.len(), 2);
        assert!(!doc.contains_id("A"));
        assert_eq!(doc.lookup("B").len(), 1);
        assert_eq!(doc.entry_count(), 1);
    }

    #[test]
    fn persisted_form_is_a_plain_map() {
        let doc = doc_with(&[("REQ-1", "demo", "planning")]);
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["REQ-1"][0]["boardId"], "demo");
        assert_eq!(value["REQ-1"][0]["columnId"], "planning");
        assert!(value["REQ-1"][0].get("updatedAt").is_none());
    }
}
