//! Boards and their columns.

use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::ItemReference;
use crate::ItemType;
use crate::ParseEnumError;

/// Board type. Selects the default column preset at creation time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BoardType {
    #[default]
    Project,
    Sprint,
    Team,
    Epic,
    BusinessPlan,
}

impl BoardType {
    pub const ALL: [BoardType; 5] = [
        BoardType::Project,
        BoardType::Sprint,
        BoardType::Team,
        BoardType::Epic,
        BoardType::BusinessPlan,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BoardType::Project => "project",
            BoardType::Sprint => "sprint",
            BoardType::Team => "team",
            BoardType::Epic => "epic",
            BoardType::BusinessPlan => "business-plan",
        }
    }

    /// Parse a board type, falling back to [`BoardType::Project`] for
    /// anything unrecognised.
    pub fn parse_lossy(s: &str) -> BoardType {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for BoardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoardType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BoardType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "board type",
                value: s.to_string(),
            })
    }
}

/// An ordered slot within a board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    /// Unique within the owning board only.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub items: Vec<ItemReference>,
}

impl Column {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn position_of(&self, item_type: ItemType, id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.matches(item_type, id))
    }

    pub fn contains(&self, item_type: ItemType, id: &str) -> bool {
        self.position_of(item_type, id).is_some()
    }
}

/// One persisted board document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    /// Immutable identity; also the document's file stem.
    pub board_id: String,

    pub name: String,

    #[serde(rename = "type")]
    pub board_type: BoardType,

    pub created: DateTime<Utc>,

    /// Rewritten on every mutation.
    pub last_updated: DateTime<Utc>,

    #[serde(default)]
    pub metadata: Map<String, Value>,

    /// Display and workflow order.
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl Board {
    pub fn new(
        board_id: impl Into<String>,
        name: impl Into<String>,
        board_type: BoardType,
        columns: Vec<Column>,
    ) -> Self {
        let now = Utc::now();
        Self {
            board_id: board_id.into(),
            name: name.into(),
            board_type,
            created: now,
            last_updated: now,
            metadata: Map::new(),
            columns,
        }
    }

    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    pub fn column_mut(&mut self, column_id: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.id == column_id)
    }

    pub fn has_column(&self, column_id: &str) -> bool {
        self.column(column_id).is_some()
    }

    /// Stamp `last_updated` with the current time.
    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }

    pub fn item_count(&self) -> usize {
        self.columns.iter().map(|c| c.items.len()).sum()
    }

    /// Every `(column, item)` pair in column order.
    pub fn items(&self) -> impl Iterator<Item = (&Column, &ItemReference)> {
        self.columns
            .iter()
            .flat_map(|c| c.items.iter().map(move |i| (c, i)))
    }
}

/// An item reference annotated with the column that holds it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BoardReference {
    #[serde(flatten)]
    pub item: ItemReference,
    pub column: String,
    pub column_name: String,
}
