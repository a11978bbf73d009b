//! Default column presets per board type.

use crate::BoardType;
use crate::Column;

const PROJECT: &[(&str, &str)] = &[
    ("planning", "Planning"),
    ("in-progress", "In Progress"),
    ("testing", "Testing"),
    ("done", "Done"),
];

const SPRINT: &[(&str, &str)] = &[
    ("backlog", "Backlog"),
    ("todo", "To Do"),
    ("in-progress", "In Progress"),
    ("review", "Review"),
    ("done", "Done"),
];

const TEAM: &[(&str, &str)] = &[
    ("backlog", "Backlog"),
    ("ready", "Ready"),
    ("in-progress", "In Progress"),
    ("blocked", "Blocked"),
    ("done", "Done"),
];

const EPIC: &[(&str, &str)] = &[
    ("requirements", "Requirements"),
    ("in-development", "In Development"),
    ("testing", "Testing"),
    ("completed", "Completed"),
];

const BUSINESS_PLAN: &[(&str, &str)] = &[
    ("ideas", "Ideas"),
    ("research", "Research"),
    ("planning", "Planning"),
    ("execution", "Execution"),
    ("review", "Review"),
];

fn preset(board_type: BoardType) -> &'static [(&'static str, &'static str)] {
    match board_type {
        BoardType::Project => PROJECT,
        BoardType::Sprint => SPRINT,
        BoardType::Team => TEAM,
        BoardType::Epic => EPIC,
        BoardType::BusinessPlan => BUSINESS_PLAN,
    }
}

/// Fresh, empty columns for `board_type`.
pub fn default_columns(board_type: BoardType) -> Vec<Column> {
    preset(board_type)
        .iter()
        .map(|(id, name)| Column::new(*id, *name))
        .collect()
}

/// Like [`default_columns`] but keyed by the type's text form. Unknown types
/// get the project preset.
pub fn default_columns_for(board_type: &str) -> Vec<Column> {
    default_columns(BoardType::parse_lossy(board_type))
}
