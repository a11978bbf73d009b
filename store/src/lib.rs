//! `kanban-store` — file-backed board and reference store.
//!
//! Tracks where work items (epics, requirements, sub-requirements, tasks)
//! sit across any number of boards without owning the items themselves.
//!
//! Two independently stored artifacts are kept in step:
//! - **board documents** (`boards/{board_id}.json`), the source of truth;
//! - **reference index documents** (`references/{type}.json`), a derived
//!   reverse lookup from item id to board/column locations.
//!
//! [`ReferenceEngine`] is the entry point. It writes the board first and the
//! index second, never rolls back, and offers
//! [`ReferenceEngine::cleanup_orphaned_references`] and
//! [`ReferenceEngine::rebuild_index`] to recover from interrupted writes.

pub mod board_store;
pub mod config;
pub mod engine;
pub mod error;
pub mod ids;
pub mod reference_index;
pub mod repository;

pub use board_store::BoardStore;
pub use board_store::CreateBoardOptions;
pub use config::ConfigLoader;
pub use config::KanbanConfig;
pub use engine::CleanupReport;
pub use engine::IndexDrift;
pub use engine::ReferenceEngine;
pub use engine::ReferenceIssue;
pub use error::ErrorKind;
pub use error::KanbanError;
pub use error::Result;
pub use reference_index::ReferenceIndex;
pub use repository::BoardRepository;
pub use repository::FsStorage;
pub use repository::IndexRepository;
pub use repository::MemoryStorage;

pub use kanban_types as types;
