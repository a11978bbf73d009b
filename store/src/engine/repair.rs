//! Integrity checks and repair: structural validation, orphan cleanup, and
//! full index reconciliation against the boards.

use std::collections::BTreeSet;
use std::collections::HashSet;
use std::fmt;

use kanban_types::Board;
use kanban_types::IndexEntry;
use kanban_types::ItemType;
use kanban_types::ReferenceIndexDoc;
use serde::Serialize;

use super::ReferenceEngine;
use crate::error::KanbanError;
use crate::error::Result;

/// A structural defect found by [`ReferenceEngine::validate_references`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceIssue {
    pub board_id: String,
    #[serde(flatten)]
    pub kind: IssueKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum IssueKind {
    /// The document could not be parsed (e.g. an item without `type`).
    UnreadableBoard { reason: String },
    /// The file name is not a usable board id.
    InvalidBoardId,
    /// The document's `boardId` differs from the id it is stored under.
    BoardIdMismatch { document_id: String },
    DuplicateColumn { column_id: String },
    MissingItemId {
        column_id: String,
        item_type: ItemType,
    },
    DuplicateReference {
        column_id: String,
        item_type: ItemType,
        item_id: String,
    },
}

impl fmt::Display for ReferenceIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let board = &self.board_id;
        match &self.kind {
            IssueKind::UnreadableBoard { reason } => write!(f, "{board}: unreadable ({reason})"),
            IssueKind::InvalidBoardId => write!(f, "{board}: invalid board id"),
            IssueKind::BoardIdMismatch { document_id } => {
                write!(f, "{board}: document claims id {document_id}")
            }
            IssueKind::DuplicateColumn { column_id } => {
                write!(f, "{board}: column {column_id} appears more than once")
            }
            IssueKind::MissingItemId {
                column_id,
                item_type,
            } => write!(f, "{board}/{column_id}: {item_type} reference without id"),
            IssueKind::DuplicateReference {
                column_id,
                item_type,
                item_id,
            } => write!(f, "{board}/{column_id}: {item_type} {item_id} listed twice"),
        }
    }
}

/// An index entry dropped by [`ReferenceEngine::cleanup_orphaned_references`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedEntry {
    pub item_type: ItemType,
    pub item_id: String,
    #[serde(flatten)]
    pub entry: IndexEntry,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub removed: Vec<RemovedEntry>,
}

impl CleanupReport {
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }
}

/// One location where boards and index disagree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftEntry {
    pub item_type: ItemType,
    pub item_id: String,
    pub board_id: String,
    pub column_id: String,
}

/// Differences between the index and what the boards actually hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexDrift {
    /// On a board but absent from the index.
    pub missing: Vec<DriftEntry>,
    /// In the index but not on the referenced board/column (including
    /// entries for deleted boards and duplicate entries).
    pub stale: Vec<DriftEntry>,
}

impl IndexDrift {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.stale.is_empty()
    }
}

fn placements(boards: &[Board]) -> BTreeSet<DriftEntry> {
    boards
        .iter()
        .flat_map(|board| {
            board.items().map(|(column, item)| DriftEntry {
                item_type: item.item_type,
                item_id: item.id.clone(),
                board_id: board.board_id.clone(),
                column_id: column.id.clone(),
            })
        })
        .collect()
}

fn compute_drift(boards: &[Board], docs: &[(ItemType, ReferenceIndexDoc)]) -> IndexDrift {
    let mut unmatched = placements(boards);
    let mut stale = Vec::new();
    for (item_type, doc) in docs {
        for (item_id, entries) in doc.iter() {
            for entry in entries {
                let key = DriftEntry {
                    item_type: *item_type,
                    item_id: item_id.to_string(),
                    board_id: entry.board_id.clone(),
                    column_id: entry.column_id.clone(),
                };
                // Removing on match means a second identical entry is stale.
                if !unmatched.remove(&key) {
                    stale.push(key);
                }
            }
        }
    }
    stale.sort();
    IndexDrift {
        missing: unmatched.into_iter().collect(),
        stale,
    }
}

/// The index `boards` imply for `item_type`, keeping timestamps from `old`
/// for locations that were already indexed.
fn derive_index(
    boards: &[Board],
    item_type: ItemType,
    old: &ReferenceIndexDoc,
) -> ReferenceIndexDoc {
    let mut doc = ReferenceIndexDoc::new();
    for board in boards {
        for (column, item) in board.items().filter(|(_, i)| i.item_type == item_type) {
            let entry = old
                .lookup(&item.id)
                .iter()
                .find(|e| e.is_at(&board.board_id, &column.id))
                .cloned()
                .unwrap_or_else(|| IndexEntry {
                    board_id: board.board_id.clone(),
                    column_id: column.id.clone(),
                    added_at: item.added_to_column,
                    updated_at: None,
                });
            doc.record(&item.id, entry);
        }
    }
    doc
}

impl ReferenceEngine {
    /// Walk every board and report structural defects. Defects are returned,
    /// never raised; only storage failures produce an error.
    pub fn validate_references(&self) -> Result<Vec<ReferenceIssue>> {
        let mut issues = Vec::new();
        for board_id in self.boards.list_ids()? {
            let issue = |kind| ReferenceIssue {
                board_id: board_id.clone(),
                kind,
            };
            let board = match self.boards.get_board(&board_id) {
                Ok(board) => board,
                Err(KanbanError::Corrupted { reason, .. }) => {
                    issues.push(issue(IssueKind::UnreadableBoard { reason }));
                    continue;
                }
                Err(KanbanError::InvalidId { .. }) => {
                    issues.push(issue(IssueKind::InvalidBoardId));
                    continue;
                }
                Err(KanbanError::BoardNotFound { .. }) => continue,
                Err(e) => return Err(e),
            };

            if board.board_id != board_id {
                issues.push(issue(IssueKind::BoardIdMismatch {
                    document_id: board.board_id.clone(),
                }));
            }

            let mut column_ids = HashSet::new();
            for column in &board.columns {
                if !column_ids.insert(column.id.as_str()) {
                    issues.push(issue(IssueKind::DuplicateColumn {
                        column_id: column.id.clone(),
                    }));
                }
                let mut keys = HashSet::new();
                for item in &column.items {
                    if item.id.trim().is_empty() {
                        issues.push(issue(IssueKind::MissingItemId {
                            column_id: column.id.clone(),
                            item_type: item.item_type,
                        }));
                    } else if !keys.insert((item.item_type, item.id.as_str())) {
                        issues.push(issue(IssueKind::DuplicateReference {
                            column_id: column.id.clone(),
                            item_type: item.item_type,
                            item_id: item.id.clone(),
                        }));
                    }
                }
            }
        }

        if !issues.is_empty() {
            tracing::warn!(issues = issues.len(), "reference validation found issues");
        }
        Ok(issues)
    }

    /// Drop index entries whose board no longer exists.
    ///
    /// Only repairs index → board drift. Items present on a board but missing
    /// from the index are left alone; see [`ReferenceEngine::rebuild_index`].
    pub fn cleanup_orphaned_references(&self) -> Result<CleanupReport> {
        let live: HashSet<String> = self.boards.list_ids()?.into_iter().collect();
        let mut report = CleanupReport::default();

        for item_type in ItemType::ALL {
            let mut doc = self.index.load(item_type)?;
            let dropped = doc.retain(|_, entry| live.contains(&entry.board_id));
            if dropped.is_empty() {
                continue;
            }
            self.index.replace(item_type, &doc)?;
            report
                .removed
                .extend(dropped.into_iter().map(|(item_id, entry)| RemovedEntry {
                    item_type,
                    item_id,
                    entry,
                }));
        }

        if report.removed_count() > 0 {
            tracing::info!(
                removed = report.removed_count(),
                "removed orphaned index entries"
            );
        }
        Ok(report)
    }

    /// Compare every index document with the boards without writing.
    pub fn audit_index(&self) -> Result<IndexDrift> {
        let boards = self.boards.get_all_boards()?;
        let docs = self.load_all_indexes()?;
        Ok(compute_drift(&boards, &docs))
    }

    /// Rewrite every index document from the boards and return the drift that
    /// was repaired. Entries that already matched keep their timestamps.
    ///
    /// Fails with [`KanbanError::Corrupted`] if any board document cannot be
    /// read, leaving the index untouched. Run
    /// [`ReferenceEngine::validate_references`] first to find such boards.
    pub fn rebuild_index(&self) -> Result<IndexDrift> {
        let boards = self.boards.get_all_boards()?;
        let docs = self.load_all_indexes()?;
        let drift = compute_drift(&boards, &docs);

        for (item_type, old) in &docs {
            let rebuilt = derive_index(&boards, *item_type, old);
            if &rebuilt != old {
                self.index.replace(*item_type, &rebuilt)?;
            }
        }

        if drift.is_clean() {
            tracing::debug!(boards = boards.len(), "index already consistent");
        } else {
            tracing::info!(
                missing = drift.missing.len(),
                stale = drift.stale.len(),
                "rebuilt reference index"
            );
        }
        Ok(drift)
    }

    fn load_all_indexes(&self) -> Result<Vec<(ItemType, ReferenceIndexDoc)>> {
        ItemType::ALL
            .into_iter()
            .map(|t| self.index.load(t).map(|doc| (t, doc)))
            .collect()
    }
}
