#![allow(clippy::unwrap_used, clippy::expect_used)]
//! End-to-end scenarios against the on-disk store.

use std::path::Path;

use kanban_store::CreateBoardOptions;
use kanban_store::ErrorKind;
use kanban_store::KanbanConfig;
use kanban_store::ReferenceEngine;
use kanban_store::types::BoardType;
use kanban_store::types::ItemType;
use kanban_store::types::Priority;
use kanban_store::types::ReferenceMetadata;
use pretty_assertions::assert_eq;
use serde_json::Value;

fn open(project: &Path) -> ReferenceEngine {
    ReferenceEngine::open_with_config(project, &KanbanConfig::default()).unwrap()
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn demo_board_lifecycle() {
    let tmp = tempfile::TempDir::new().unwrap();
    let engine = open(tmp.path());

    let board = engine
        .create_board("demo", "Demo", BoardType::Project, CreateBoardOptions::default())
        .unwrap();
    let columns: Vec<&str> = board.columns.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(columns, vec!["planning", "in-progress", "testing", "done"]);
    assert!(tmp.path().join("kanban/boards/demo.json").is_file());

    let added = engine
        .add_reference(
            ItemType::Requirement,
            "REQ-AUTH-001",
            "demo",
            "planning",
            ReferenceMetadata::default(),
        )
        .unwrap();
    assert_eq!(added.priority, Priority::Medium);
    assert_eq!(added.status, "pending");

    let moved = engine
        .move_reference("REQ-AUTH-001", "demo", "planning", "in-progress")
        .unwrap();
    assert!(moved.added_to_column >= added.added_to_column);
    let board = engine.get_board("demo").unwrap();
    assert!(board.column("planning").unwrap().items.is_empty());
    assert!(
        board
            .column("in-progress")
            .unwrap()
            .contains(ItemType::Requirement, "REQ-AUTH-001")
    );

    engine
        .remove_reference(ItemType::Requirement, "REQ-AUTH-001", "demo", None)
        .unwrap();
    assert!(
        engine
            .get_referencing_boards(ItemType::Requirement, "REQ-AUTH-001")
            .unwrap()
            .is_empty()
    );

    // The pruned id must not linger as an empty list on disk.
    let index = read_json(&tmp.path().join("kanban/references/requirement.json"));
    assert_eq!(index, serde_json::json!({}));
}

#[test]
fn shared_task_survives_deleting_one_board() {
    let tmp = tempfile::TempDir::new().unwrap();
    let engine = open(tmp.path());

    engine
        .create_board("sprint-1", "Sprint 1", BoardType::Sprint, CreateBoardOptions::default())
        .unwrap();
    engine
        .create_board("epic-x", "Epic X", BoardType::Epic, CreateBoardOptions::default())
        .unwrap();
    engine
        .add_reference(ItemType::Task, "T-9", "sprint-1", "todo", ReferenceMetadata::default())
        .unwrap();
    engine
        .add_reference(
            ItemType::Task,
            "T-9",
            "epic-x",
            "requirements",
            ReferenceMetadata::default(),
        )
        .unwrap();
    assert_eq!(
        engine
            .get_referencing_boards(ItemType::Task, "T-9")
            .unwrap()
            .len(),
        2
    );

    engine.delete_board("sprint-1").unwrap();
    assert!(!tmp.path().join("kanban/boards/sprint-1.json").exists());

    let entries = engine
        .get_referencing_boards(ItemType::Task, "T-9")
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].board_id, "epic-x");
    assert_eq!(entries[0].column_id, "requirements");
}

#[test]
fn cross_board_requirement_is_listed_everywhere() {
    let tmp = tempfile::TempDir::new().unwrap();
    let engine = open(tmp.path());
    engine
        .create_board("a", "A", BoardType::Sprint, CreateBoardOptions::default())
        .unwrap();
    engine
        .create_board("b", "B", BoardType::BusinessPlan, CreateBoardOptions::default())
        .unwrap();
    engine
        .add_reference(ItemType::Requirement, "REQ-1", "a", "backlog", ReferenceMetadata::default())
        .unwrap();
    engine
        .add_reference(ItemType::Requirement, "REQ-1", "b", "ideas", ReferenceMetadata::default())
        .unwrap();

    let mut boards: Vec<String> = engine
        .get_referencing_boards(ItemType::Requirement, "REQ-1")
        .unwrap()
        .into_iter()
        .map(|e| e.board_id)
        .collect();
    boards.sort();
    assert_eq!(boards, vec!["a", "b"]);
}

#[test]
fn interrupted_delete_is_repaired_by_cleanup() {
    let tmp = tempfile::TempDir::new().unwrap();
    let engine = open(tmp.path());
    engine
        .create_board("keep", "Keep", BoardType::Team, CreateBoardOptions::default())
        .unwrap();
    engine
        .create_board("drop", "Drop", BoardType::Team, CreateBoardOptions::default())
        .unwrap();
    for board in ["keep", "drop"] {
        engine
            .add_reference(ItemType::Epic, "EPIC-7", board, "ready", ReferenceMetadata::default())
            .unwrap();
    }

    // Simulate a crash after the board file went away but before the index
    // was cleared.
    std::fs::remove_file(tmp.path().join("kanban/boards/drop.json")).unwrap();
    assert_eq!(
        engine
            .get_referencing_boards(ItemType::Epic, "EPIC-7")
            .unwrap()
            .len(),
        2
    );

    let report = engine.cleanup_orphaned_references().unwrap();
    assert_eq!(report.removed_count(), 1);
    assert_eq!(report.removed[0].entry.board_id, "drop");
    assert_eq!(
        engine
            .cleanup_orphaned_references()
            .unwrap()
            .removed_count(),
        0
    );
    assert!(engine.audit_index().unwrap().is_clean());
}

#[test]
fn lost_index_file_is_rebuilt_from_boards() {
    let tmp = tempfile::TempDir::new().unwrap();
    let engine = open(tmp.path());
    engine
        .create_board("demo", "Demo", BoardType::Project, CreateBoardOptions::default())
        .unwrap();
    engine
        .add_reference(ItemType::Task, "T-1", "demo", "testing", ReferenceMetadata::default())
        .unwrap();
    engine
        .add_reference(
            ItemType::SubRequirement,
            "SR-1",
            "demo",
            "done",
            ReferenceMetadata::default(),
        )
        .unwrap();

    std::fs::remove_file(tmp.path().join("kanban/references/task.json")).unwrap();
    assert!(
        engine
            .get_referencing_boards(ItemType::Task, "T-1")
            .unwrap()
            .is_empty()
    );

    let drift = engine.rebuild_index().unwrap();
    assert_eq!(drift.missing.len(), 1);
    assert!(drift.stale.is_empty());

    let entries = engine
        .get_referencing_boards(ItemType::Task, "T-1")
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].column_id, "testing");
    assert_eq!(
        engine
            .get_referencing_boards(ItemType::SubRequirement, "SR-1")
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn unreadable_board_is_reported_not_raised() {
    let tmp = tempfile::TempDir::new().unwrap();
    let engine = open(tmp.path());
    engine
        .create_board("good", "Good", BoardType::Project, CreateBoardOptions::default())
        .unwrap();

    // An item without a `type` cannot be parsed.
    let mut raw = read_json(&tmp.path().join("kanban/boards/good.json"));
    raw["boardId"] = Value::from("bad");
    raw["columns"][0]["items"] = serde_json::json!([{ "id": "T-1" }]);
    std::fs::write(
        tmp.path().join("kanban/boards/bad.json"),
        serde_json::to_vec(&raw).unwrap(),
    )
    .unwrap();

    let issues = engine.validate_references().unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].board_id, "bad");
    assert!(issues[0].to_string().starts_with("bad: unreadable"));

    let err = engine.get_board("bad").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
}

#[test]
fn rebuild_refuses_to_run_over_unreadable_board() {
    let tmp = tempfile::TempDir::new().unwrap();
    let engine = open(tmp.path());
    engine
        .create_board("demo", "Demo", BoardType::Project, CreateBoardOptions::default())
        .unwrap();
    engine
        .add_reference(ItemType::Task, "T-1", "demo", "testing", ReferenceMetadata::default())
        .unwrap();
    let index_path = tmp.path().join("kanban/references/task.json");
    let before = std::fs::read(&index_path).unwrap();

    std::fs::write(tmp.path().join("kanban/boards/junk.json"), "{").unwrap();

    let err = engine.rebuild_index().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(std::fs::read(&index_path).unwrap(), before);

    let issues = engine.validate_references().unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].board_id, "junk");
}

#[test]
fn open_reads_project_config() {
    let tmp = tempfile::TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("kanban.toml"),
        "root_dir = \"state/boards\"\ndefault_added_by = \"agent\"\n",
    )
    .unwrap();

    let engine = ReferenceEngine::open(tmp.path()).unwrap();
    engine
        .create_board("demo", "Demo", BoardType::Sprint, CreateBoardOptions::default())
        .unwrap();
    let item = engine
        .add_reference(ItemType::Task, "T-1", "demo", "backlog", ReferenceMetadata::default())
        .unwrap();

    assert_eq!(item.added_by, "agent");
    assert!(tmp.path().join("state/boards/boards/demo.json").is_file());
    assert!(tmp.path().join("state/boards/references/task.json").is_file());
}

#[test]
fn boards_survive_reopen_in_stable_order() {
    let tmp = tempfile::TempDir::new().unwrap();
    {
        let engine = open(tmp.path());
        for id in ["sprint-3", "roadmap", "sprint-1"] {
            engine
                .create_board(id, id, BoardType::Sprint, CreateBoardOptions::default())
                .unwrap();
        }
    }
    let engine = open(tmp.path());
    let ids: Vec<String> = engine
        .get_all_boards()
        .unwrap()
        .into_iter()
        .map(|b| b.board_id)
        .collect();
    assert_eq!(ids, vec!["roadmap", "sprint-1", "sprint-3"]);
    assert_eq!(engine.list_board_ids().unwrap(), ids);
}
