use crate::model::DomainError;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const STUDENTS: &str = "students";
pub const TEACHERS: &str = "teachers";
pub const RESULTS: &str = "results";

/// Flat key-value persistence: each collection is one JSON array, read and
/// written whole. No schema is enforced at this layer; validation belongs to
/// the repositories.
pub trait RecordStore {
    fn read(&self, collection: &str) -> anyhow::Result<Vec<serde_json::Value>>;
    fn write(&self, collection: &str, records: &[serde_json::Value]) -> anyhow::Result<()>;
}

/// One `<collection>.json` file per collection inside the selected workspace
/// directory. Writes go through a temp file and a rename so a crashed write
/// never leaves a half-written collection behind.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn open(dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create workspace {}", dir.to_string_lossy()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{}.json", collection))
    }
}

impl RecordStore for JsonFileStore {
    fn read(&self, collection: &str) -> anyhow::Result<Vec<serde_json::Value>> {
        let path = self.collection_path(collection);
        if !path.is_file() {
            // Absent collection reads as the empty array.
            return Ok(Vec::new());
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
        let records: Vec<serde_json::Value> = serde_json::from_str(&text)
            .with_context(|| format!("{} is not a JSON array", path.to_string_lossy()))?;
        Ok(records)
    }

    fn write(&self, collection: &str, records: &[serde_json::Value]) -> anyhow::Result<()> {
        let path = self.collection_path(collection);
        let tmp = self.dir.join(format!("{}.json.tmp", collection));
        let text = serde_json::to_string(records).context("failed to serialize collection")?;
        std::fs::write(&tmp, text)
            .with_context(|| format!("failed to write {}", tmp.to_string_lossy()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("failed to replace {}", path.to_string_lossy()))?;
        Ok(())
    }
}

/// In-memory fake with the same full-replace semantics, for tests.
#[cfg(test)]
pub struct MemoryStore {
    cells: std::cell::RefCell<std::collections::HashMap<String, Vec<serde_json::Value>>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self {
            cells: std::cell::RefCell::new(std::collections::HashMap::new()),
        }
    }
}

#[cfg(test)]
impl RecordStore for MemoryStore {
    fn read(&self, collection: &str) -> anyhow::Result<Vec<serde_json::Value>> {
        Ok(self
            .cells
            .borrow()
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }

    fn write(&self, collection: &str, records: &[serde_json::Value]) -> anyhow::Result<()> {
        self.cells
            .borrow_mut()
            .insert(collection.to_string(), records.to_vec());
        Ok(())
    }
}

pub fn read_records<T: DeserializeOwned>(
    store: &dyn RecordStore,
    collection: &str,
) -> Result<Vec<T>, DomainError> {
    let raw = store
        .read(collection)
        .map_err(|e| DomainError::new("store_read_failed", format!("{:?}", e)))?;
    raw.into_iter()
        .map(|value| {
            serde_json::from_value(value).map_err(|e| {
                DomainError::new(
                    "store_read_failed",
                    format!("malformed record in {}: {}", collection, e),
                )
            })
        })
        .collect()
}

pub fn write_records<T: Serialize>(
    store: &dyn RecordStore,
    collection: &str,
    records: &[T],
) -> Result<(), DomainError> {
    let raw: Vec<serde_json::Value> = records
        .iter()
        .map(|record| {
            serde_json::to_value(record)
                .map_err(|e| DomainError::new("store_write_failed", e.to_string()))
        })
        .collect::<Result<_, _>>()?;
    store
        .write(collection, &raw)
        .map_err(|e| DomainError::new("store_write_failed", format!("{:?}", e)))
}
