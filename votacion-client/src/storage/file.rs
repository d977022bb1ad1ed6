//! Storage backed by a JSON file.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{debug, warn};

use super::{KeyValueStorage, StorageError, StorageResult};

const STORAGE_FILE: &str = "storage.json";

/// JSON map persisted in a single file.
///
/// Every read goes back to disk so that another process sharing the file is
/// observed on the next read.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Storage kept in `dir/storage.json`. The directory is created lazily.
    #[must_use]
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            path: dir.as_ref().join(STORAGE_FILE),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> StorageResult<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> StorageResult<()> {
        if map.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_vec_pretty(map)?)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
        }
        fs::rename(&tmp_path, &self.path)?;
        debug!(path = %self.path.display(), keys = map.len(), "storage written");
        Ok(())
    }

    /// Read-modify-write under the lock. A corrupt file is replaced, so the
    /// storage recovers on the next write.
    fn modify(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> StorageResult<()> {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(StorageError::Corrupt(err)) => {
                warn!(path = %self.path.display(), error = %err, "discarding corrupt storage file");
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };
        apply(&mut map);
        self.write_map(&map)
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.modify(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.modify(|map| {
            map.remove(key);
        })
    }

    fn is_persistent(&self) -> bool {
        true
    }
}
