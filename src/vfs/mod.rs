//! The pluggable file-system abstraction resources read their raw bytes
//! through. The manager never touches the host file system directly; every
//! read goes through a mounted `VFS` implementation, which keeps blocking
//! I/O behind the loading thread and makes tests trivial to host in memory.

pub mod dir;
pub use self::dir::Directory;

pub mod mem;
pub use self::mem::Memory;

mod location;
pub use self::location::Location;

use std::path::Path;
use std::sync::Arc;

use crate::errors::*;
use crate::utils::{FastHashMap, HashValue};

pub trait VFS: Send + Sync + 'static {
    /// Reads the entire contents of a file into `buf`, returning the number
    /// of bytes appended.
    fn read_to_end(&self, location: &Path, buf: &mut Vec<u8>) -> Result<usize>;

    /// Checks if the file exists.
    fn exists(&self, location: &Path) -> bool;
}

/// A collection of mounted virtual file systems, keyed by identifier.
pub struct VFSDriver {
    mounts: FastHashMap<HashValue<str>, Arc<dyn VFS>>,
}

impl VFSDriver {
    pub fn new() -> Self {
        VFSDriver {
            mounts: FastHashMap::default(),
        }
    }

    /// Mount a file-system drive with identifier.
    pub fn mount<T, F>(&mut self, name: T, vfs: F) -> Result<()>
    where
        T: AsRef<str>,
        F: VFS + 'static,
    {
        let name = name.as_ref();
        let key = HashValue::from(name);
        if self.mounts.contains_key(&key) {
            return Err(Error::AlreadyExists(format!(
                "Virtual file system '{}'",
                name
            )));
        }

        info!("Mounts virtual file system '{}'.", name);
        self.mounts.insert(key, Arc::new(vfs));
        Ok(())
    }

    /// Gets the vfs with specified identifier.
    pub fn vfs(&self, fs: HashValue<str>) -> Option<Arc<dyn VFS>> {
        self.mounts.get(&fs).cloned()
    }

    /// Reads the entire file at `location` into `buf`.
    pub fn read_to_end(&self, location: &Location, buf: &mut Vec<u8>) -> Result<usize> {
        let vfs = self
            .vfs(location.fs())
            .ok_or_else(|| Error::NotFound(format!("Virtual file system of {:?}", location)))?;

        vfs.read_to_end(location.path(), buf)
    }

    /// Checks if a file exists at `location`.
    pub fn exists(&self, location: &Location) -> bool {
        self.vfs(location.fs())
            .map(|vfs| vfs.exists(location.path()))
            .unwrap_or(false)
    }
}
