//! FileKeyValueStore - one file per slot under a directory.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{KeyValueStore, KvError};

/// Durable key/value store that keeps each slot in `<dir>/<key>`.
///
/// Writes land in a sibling temp file first and are renamed into place, so a
/// reader never observes a half-written slot.
pub struct FileKeyValueStore {
    root: PathBuf,
    write_guard: Mutex<()>,
}

impl FileKeyValueStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, KvError> {
        let root = dir.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| KvError::Io(e.to_string()))?;
        Ok(Self {
            root,
            write_guard: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf, KvError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(KvError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, KvError> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(KvError::Io(format!("{}: {}", path.display(), e))),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), KvError> {
        let path = self.slot_path(key)?;
        let tmp = self.root.join(format!(".{}.tmp", key));
        let _guard = self
            .write_guard
            .lock()
            .map_err(|_| KvError::LockPoisoned("file write"))?;

        let write = || -> io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        };
        write().map_err(|e| KvError::Io(format!("{}: {}", path.display(), e)))
    }

    fn remove_item(&self, key: &str) -> Result<bool, KvError> {
        let path = self.slot_path(key)?;
        let _guard = self
            .write_guard
            .lock()
            .map_err(|_| KvError::LockPoisoned("file remove"))?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(KvError::Io(format!("{}: {}", path.display(), e))),
        }
    }
}
