//! JSON file storage for task rows.
//!
//! The task file holds the id counter and the list of positional rows:
//!
//! ```json
//! { "next_id": 3, "rows": [[1, "Title", "To-Do", 5550001, "2024-01-01T09:00:00", "", 5550001, null, ""]] }
//! ```
//!
//! Rows are kept as raw JSON values and decoded on read. A row that fails to
//! decode is skipped with a warning but written back untouched, so one
//! corrupt entry never hides or destroys the rest of the board.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{BoardError, StorageError};
use crate::task::{TaskId, TaskRecord, TaskRow};

/// Read a JSON file, returning the default value if it does not exist.
pub fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StorageError> {
    if !path.exists() {
        debug!(path = %path.display(), "data file absent, starting empty");
        return Ok(T::default());
    }
    let io_err = |source: std::io::Error| StorageError::Io { path: path.to_path_buf(), source };
    let mut buf = String::new();
    File::open(path)
        .and_then(|mut f| f.read_to_string(&mut buf))
        .map_err(io_err)?;
    serde_json::from_str(&buf).map_err(|source| StorageError::Json { path: path.to_path_buf(), source })
}

/// Write a JSON file atomically (temp file + rename).
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let io_err = |source: std::io::Error| StorageError::Io { path: path.to_path_buf(), source };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(io_err)?;
    }
    let data = serde_json::to_string_pretty(value)
        .map_err(|source| StorageError::Json { path: path.to_path_buf(), source })?;
    let tmp = path.with_extension("json.tmp");
    let mut f = File::create(&tmp).map_err(io_err)?;
    f.write_all(data.as_bytes()).map_err(io_err)?;
    f.flush().map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

/// Decode one raw row into its positional form.
pub fn decode_row(value: &Value) -> Result<TaskRow, String> {
    TaskRow::deserialize(value).map_err(|e| e.to_string())
}

/// Decode and validate one raw row.
pub fn decode_record(value: &Value) -> Result<TaskRecord, String> {
    TaskRecord::try_from(decode_row(value)?).map_err(|e| e.to_string())
}

fn encode_record(task: &TaskRecord) -> Value {
    let TaskRow(id, title, status, pic, created_at, due, creator, editor, info) = TaskRow::from(task);
    serde_json::json!([
        id,
        title,
        status,
        pic,
        created_at.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        due,
        creator,
        editor,
        info
    ])
}

/// The persisted task table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTable {
    /// Next id to hand out. Only ever grows.
    #[serde(default = "first_id")]
    pub next_id: TaskId,
    #[serde(default)]
    pub rows: Vec<Value>,
}

fn first_id() -> TaskId {
    1
}

impl Default for TaskTable {
    fn default() -> Self {
        TaskTable { next_id: first_id(), rows: Vec::new() }
    }
}

impl TaskTable {
    /// Reserve a fresh id. Ids are never handed out twice.
    pub fn allocate_id(&mut self) -> Result<TaskId, BoardError> {
        let id = self.next_id.max(1);
        self.next_id = id.checked_add(1).ok_or(BoardError::IdsExhausted)?;
        Ok(id)
    }

    /// Position and decoded record of the first valid row with this id.
    pub fn find(&self, id: TaskId) -> Option<(usize, TaskRecord)> {
        self.rows.iter().enumerate().find_map(|(i, raw)| {
            if raw.get(0).and_then(Value::as_u64) != Some(id) {
                return None;
            }
            decode_record(raw).ok().map(|t| (i, t))
        })
    }

    pub fn push(&mut self, task: &TaskRecord) {
        self.rows.push(encode_record(task));
    }

    pub fn replace(&mut self, index: usize, task: &TaskRecord) {
        self.rows[index] = encode_record(task);
    }

    pub fn remove(&mut self, index: usize) {
        self.rows.remove(index);
    }

    /// Every decodable record in storage order; malformed rows are skipped.
    pub fn records(&self) -> Vec<TaskRecord> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| match decode_record(raw) {
                Ok(t) => Some(t),
                Err(reason) => {
                    warn!(row = i, %reason, "skipping malformed task row");
                    None
                }
            })
            .collect()
    }

    fn repair_counter(&mut self) {
        let max_id = self.rows.iter().filter_map(|r| r.get(0).and_then(Value::as_u64)).max().unwrap_or(0);
        if self.next_id <= max_id {
            warn!(next_id = self.next_id, max_id, "id counter behind stored rows, advancing");
            // Saturated counter: reads still work, allocation reports IdsExhausted.
            self.next_id = max_id.checked_add(1).unwrap_or(TaskId::MAX);
        }
    }
}

/// Task table bound to its backing file.
#[derive(Debug, Default)]
pub struct Database {
    path: Option<PathBuf>,
    table: TaskTable,
}

impl Database {
    /// Open the task file, starting empty if it does not exist yet.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let mut table: TaskTable = read_json(path)?;
        table.repair_counter();
        debug!(path = %path.display(), rows = table.rows.len(), "loaded task table");
        Ok(Database { path: Some(path.to_path_buf()), table })
    }

    /// A table that lives only in memory.
    pub fn in_memory() -> Self {
        Database { path: None, table: TaskTable::default() }
    }

    /// Raw rows in storage order, including malformed ones.
    pub fn rows(&self) -> &[Value] {
        &self.table.rows
    }

    pub fn table(&self) -> &TaskTable {
        &self.table
    }

    /// Apply a change to a copy of the table and keep it only if both the
    /// change and the write succeed.
    pub fn transact<T>(
        &mut self,
        change: impl FnOnce(&mut TaskTable) -> Result<T, BoardError>,
    ) -> Result<T, BoardError> {
        let mut draft = self.table.clone();
        let out = change(&mut draft)?;
        if let Some(path) = &self.path {
            write_json_atomic(path, &draft)?;
        }
        self.table = draft;
        Ok(out)
    }
}
