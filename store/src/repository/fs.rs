//! File-backed repository.
//!
//! ```text
//! <project>/kanban/
//!   .lock                       advisory write lock
//!   boards/{board_id}.json      Board
//!   references/{type}.json      ReferenceIndexDoc
//! ```
//!
//! Writes go through a temp file + fsync + rename so a crash never leaves a
//! half-written document behind.

use std::fs::File;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use kanban_types::Board;
use kanban_types::ItemType;
use kanban_types::ReferenceIndexDoc;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::BoardRepository;
use super::IndexRepository;
use crate::config::KanbanConfig;
use crate::error::KanbanError;
use crate::error::Result;

pub const BOARDS_DIR: &str = "boards";
pub const REFERENCES_DIR: &str = "references";
const LOCK_FILENAME: &str = ".lock";
const DOC_EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
    pretty_json: bool,
    lock_writes: bool,
}

impl FsStorage {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let storage = Self {
            root: root.into(),
            pretty_json: true,
            lock_writes: true,
        };
        storage.ensure_layout()?;
        Ok(storage)
    }

    /// Open the store for `project_dir` as described by `config`.
    pub fn from_config(project_dir: &Path, config: &KanbanConfig) -> Result<Self> {
        let storage = Self {
            root: config.store_root(project_dir),
            pretty_json: config.pretty_json,
            lock_writes: config.lock_writes,
        };
        storage.ensure_layout()?;
        Ok(storage)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn board_path(&self, board_id: &str) -> PathBuf {
        self.root
            .join(BOARDS_DIR)
            .join(format!("{board_id}.{DOC_EXTENSION}"))
    }

    pub fn index_path(&self, item_type: ItemType) -> PathBuf {
        self.root
            .join(REFERENCES_DIR)
            .join(format!("{}.{DOC_EXTENSION}", item_type.as_str()))
    }

    fn ensure_layout(&self) -> Result<()> {
        for dir in [self.root.join(BOARDS_DIR), self.root.join(REFERENCES_DIR)] {
            std::fs::create_dir_all(&dir).map_err(|e| KanbanError::io(&dir, e))?;
        }
        Ok(())
    }

    /// Run `f` while holding the store's exclusive write lock. The lock is
    /// released when the lock file handle drops.
    fn with_write_lock<R>(&self, f: impl FnOnce() -> Result<R>) -> Result<R> {
        if !self.lock_writes {
            return f();
        }
        let lock_path = self.root.join(LOCK_FILENAME);
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| KanbanError::io(&lock_path, e))?;
        fs2::FileExt::lock_exclusive(&lock_file).map_err(|e| KanbanError::io(&lock_path, e))?;
        f()
    }

    fn write_document<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let json = if self.pretty_json {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        self.with_write_lock(|| atomic_write(path, &json))
    }

    fn read_document<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(KanbanError::io(path, e)),
        };
        serde_json::from_str(&data)
            .map(Some)
            .map_err(|e| KanbanError::Corrupted {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

/// Write `data` to a hidden sibling, fsync it, then rename over `path`.
fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    let mut file = File::create(&tmp).map_err(|e| KanbanError::io(&tmp, e))?;
    file.write_all(data).map_err(|e| KanbanError::io(&tmp, e))?;
    file.sync_all().map_err(|e| KanbanError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| KanbanError::io(path, e))?;
    Ok(())
}

impl BoardRepository for FsStorage {
    fn list_ids(&self) -> Result<Vec<String>> {
        let dir = self.root.join(BOARDS_DIR);
        let entries = match std::fs::read_dir(&dir) {
            Ok(e) => e,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(KanbanError::io(&dir, e)),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| KanbanError::io(&dir, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            if let Some(id) = name.strip_suffix(".json") {
                ids.push(id.to_string());
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    fn load(&self, board_id: &str) -> Result<Option<Board>> {
        self.read_document(&self.board_path(board_id))
    }

    fn save(&self, board: &Board) -> Result<()> {
        self.write_document(&self.board_path(&board.board_id), board)
    }

    fn delete(&self, board_id: &str) -> Result<bool> {
        let path = self.board_path(board_id);
        self.with_write_lock(|| match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(KanbanError::io(&path, e)),
        })
    }

    fn exists(&self, board_id: &str) -> Result<bool> {
        Ok(self.board_path(board_id).is_file())
    }
}

impl IndexRepository for FsStorage {
    fn load(&self, item_type: ItemType) -> Result<ReferenceIndexDoc> {
        Ok(self
            .read_document(&self.index_path(item_type))?
            .unwrap_or_default())
    }

    fn save(&self, item_type: ItemType, doc: &ReferenceIndexDoc) -> Result<()> {
        self.write_document(&self.index_path(item_type), doc)
    }
}
