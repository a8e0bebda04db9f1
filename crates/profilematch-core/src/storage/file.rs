use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{KeyValueStore, StorageError};

/// Storage file name in the data directory
const STORE_FILE: &str = "session.json";

/// Key-value store persisted as a JSON object on disk.
///
/// Every write rewrites the whole file through a temporary file and a
/// rename, so a batch either lands completely or not at all.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(STORE_FILE)
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let path = self.path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| StorageError::Read(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| StorageError::Read(format!("{}: {}", path.display(), e)))
    }

    /// Entries to merge a write into. A corrupt file is replaced rather than
    /// blocking new writes, but an I/O failure aborts the write.
    fn read_map_for_update(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let path = self.path();
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(StorageError::Write(format!("{}: {}", path.display(), e))),
        };
        Ok(serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(error = %e, path = %path.display(), "Replacing corrupt storage file");
            BTreeMap::new()
        }))
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let path = self.path();
        let write_err = |e: std::io::Error| StorageError::Write(format!("{}: {}", path.display(), e));

        std::fs::create_dir_all(&self.dir).map_err(write_err)?;
        let contents = serde_json::to_string_pretty(map)
            .map_err(|e| StorageError::Write(e.to_string()))?;

        let tmp = tmp_path(&path);
        std::fs::write(&tmp, contents).map_err(write_err)?;
        std::fs::rename(&tmp, &path).map_err(write_err)?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    path.with_extension("json.tmp")
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
        let map = self.read_map()?;
        Ok(keys.iter().map(|k| map.get(*k).cloned()).collect())
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        let mut map = self.read_map_for_update()?;
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        self.write_map(&map)?;
        debug!(keys = entries.len(), path = %self.path().display(), "Wrote storage file");
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        if !self.path().exists() {
            return Ok(());
        }
        let mut map = self.read_map_for_update()?;
        for key in keys {
            map.remove(*key);
        }
        if map.is_empty() {
            std::fs::remove_file(self.path())
                .map_err(|e| StorageError::Write(e.to_string()))?;
            return Ok(());
        }
        self.write_map(&map)
    }
}
