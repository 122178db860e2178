//! Named blob storage behind the key store.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::keystore::{KeyStoreError, KeyStoreResult};

/// Key-value storage addressed by wallet name.
pub trait KvStore: Send + Sync {
    fn get(&self, name: &str) -> KeyStoreResult<Option<Vec<u8>>>;

    /// Insert or overwrite.
    fn put(&self, name: &str, value: &[u8]) -> KeyStoreResult<()>;

    /// Returns `false` if nothing was stored under `name`.
    fn delete(&self, name: &str) -> KeyStoreResult<bool>;

    /// All stored names, sorted.
    fn list(&self) -> KeyStoreResult<Vec<String>>;
}

impl<T: KvStore + ?Sized> KvStore for &T {
    fn get(&self, name: &str) -> KeyStoreResult<Option<Vec<u8>>> {
        (**self).get(name)
    }

    fn put(&self, name: &str, value: &[u8]) -> KeyStoreResult<()> {
        (**self).put(name, value)
    }

    fn delete(&self, name: &str) -> KeyStoreResult<bool> {
        (**self).delete(name)
    }

    fn list(&self) -> KeyStoreResult<Vec<String>> {
        (**self).list()
    }
}

/// Reject names that would escape the store directory or be hidden.
pub fn validate_name(name: &str) -> KeyStoreResult<()> {
    let ok = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(KeyStoreError::InvalidName(name.to_string()))
    }
}

/// One `<name>.json` file per entry in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) the store directory.
    pub fn open(dir: impl AsRef<Path>) -> KeyStoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, name: &str) -> KeyStoreResult<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{}.json", name)))
    }
}

impl KvStore for FileStore {
    fn get(&self, name: &str) -> KeyStoreResult<Option<Vec<u8>>> {
        match fs::read(self.path_for(name)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, name: &str, value: &[u8]) -> KeyStoreResult<()> {
        fs::write(self.path_for(name)?, value)?;
        Ok(())
    }

    fn delete(&self, name: &str) -> KeyStoreResult<bool> {
        match fs::remove_file(self.path_for(name)?) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> KeyStoreResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// In-memory store for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KvStore for MemoryStore {
    fn get(&self, name: &str) -> KeyStoreResult<Option<Vec<u8>>> {
        Ok(self.entries().get(name).cloned())
    }

    fn put(&self, name: &str, value: &[u8]) -> KeyStoreResult<()> {
        validate_name(name)?;
        self.entries().insert(name.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, name: &str) -> KeyStoreResult<bool> {
        Ok(self.entries().remove(name).is_some())
    }

    fn list(&self) -> KeyStoreResult<Vec<String>> {
        Ok(self.entries().keys().cloned().collect())
    }
}
