//! Item references: the placement record stored inside a column.

use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::DEFAULT_ADDED_BY;
use crate::DEFAULT_STATUS;
use crate::ParseEnumError;

/// Kind of the referenced work item. Each kind gets its own index document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum ItemType {
    Epic,
    Requirement,
    SubRequirement,
    Task,
}

impl ItemType {
    /// Every item type, in index-document order.
    pub const ALL: [ItemType; 4] = [
        ItemType::Epic,
        ItemType::Requirement,
        ItemType::SubRequirement,
        ItemType::Task,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Epic => "epic",
            ItemType::Requirement => "requirement",
            ItemType::SubRequirement => "sub-requirement",
            ItemType::Task => "task",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "item type",
                value: s.to_string(),
            })
    }
}

/// Priority of a placement.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(ParseEnumError {
                kind: "priority",
                value: other.to_string(),
            }),
        }
    }
}

/// A placement of an external work item in one column of one board.
///
/// `(item_type, id)` is the logical key. A column never holds two references
/// with the same key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemReference {
    #[serde(rename = "type")]
    pub item_type: ItemType,

    pub id: String,

    /// Most recent placement into the current column; reset on every move.
    pub added_to_column: DateTime<Utc>,

    #[serde(default = "default_added_by")]
    pub added_by: String,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub assignee: Option<String>,

    #[serde(default = "default_status")]
    pub status: String,

    #[serde(default)]
    pub metadata: Map<String, Value>,
}

fn default_added_by() -> String {
    DEFAULT_ADDED_BY.to_string()
}

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

impl ItemReference {
    /// Build a reference from caller options. `default_added_by` is the
    /// attribution used when the options carry none.
    pub fn new(
        item_type: ItemType,
        id: impl Into<String>,
        options: ReferenceMetadata,
        default_added_by: &str,
    ) -> Self {
        Self {
            item_type,
            id: id.into(),
            added_to_column: Utc::now(),
            added_by: options
                .added_by
                .unwrap_or_else(|| default_added_by.to_string()),
            priority: options.priority.unwrap_or_default(),
            assignee: options.assignee,
            status: options
                .status
                .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            metadata: options.metadata.unwrap_or_default(),
        }
    }

    /// Whether this reference has the given logical key.
    pub fn matches(&self, item_type: ItemType, id: &str) -> bool {
        self.item_type == item_type && self.id == id
    }
}

/// Caller-supplied attributes for a new reference. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl ReferenceMetadata {
    pub fn added_by(mut self, added_by: impl Into<String>) -> Self {
        self.added_by = Some(added_by.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
