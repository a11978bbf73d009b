//! Identifier checks applied before anything touches storage.
//!
//! Board ids double as file stems, so they are restricted to a slug
//! alphabet. Column and item ids only need to be non-blank.

use crate::error::KanbanError;
use crate::error::Result;

pub const MAX_BOARD_ID_LEN: usize = 128;

pub fn validate_board_id(board_id: &str) -> Result<()> {
    let invalid = |reason| {
        Err(KanbanError::InvalidId {
            what: "board id",
            value: board_id.to_string(),
            reason,
        })
    };
    if board_id.is_empty() {
        return invalid("must not be empty");
    }
    if board_id.len() > MAX_BOARD_ID_LEN {
        return invalid("longer than 128 characters");
    }
    if board_id.starts_with('.') {
        return invalid("must not start with '.'");
    }
    if !board_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return invalid("only ASCII letters, digits, '-', '_' and '.' are allowed");
    }
    Ok(())
}

pub fn validate_column_id(column_id: &str) -> Result<()> {
    non_blank("column id", column_id)
}

pub fn validate_item_id(item_id: &str) -> Result<()> {
    non_blank("item id", item_id)
}

fn non_blank(what: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(KanbanError::InvalidId {
            what,
            value: value.to_string(),
            reason: "must not be blank",
        });
    }
    Ok(())
}
