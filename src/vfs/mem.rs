use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::errors::*;
use crate::utils::FastHashMap;

use super::VFS;

/// An in-memory virtual file system. Clones share the underlying table, so a
/// test or an editor can keep a writable handle around after mounting it.
#[derive(Clone)]
pub struct Memory {
    files: Arc<RwLock<FastHashMap<PathBuf, Arc<Vec<u8>>>>>,
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            files: Arc::new(RwLock::new(FastHashMap::default())),
        }
    }

    /// Inserts or overwrites a file at `path`.
    pub fn write<P, T>(&self, path: P, bytes: T)
    where
        P: Into<PathBuf>,
        T: Into<Vec<u8>>,
    {
        self.files
            .write()
            .unwrap()
            .insert(path.into(), Arc::new(bytes.into()));
    }

    /// Removes the file at `path` if any.
    pub fn remove<P: AsRef<Path>>(&self, path: P) {
        self.files.write().unwrap().remove(path.as_ref());
    }
}

impl VFS for Memory {
    fn read_to_end(&self, location: &Path, buf: &mut Vec<u8>) -> Result<usize> {
        let files = self.files.read().unwrap();
        let bytes = files
            .get(location)
            .ok_or_else(|| Error::NotFound(format!("File {:?}", location)))?;

        buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn exists(&self, location: &Path) -> bool {
        self.files.read().unwrap().contains_key(location)
    }
}
