use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::errors::*;

use super::VFS;

/// A virtual file system rooted at a readable directory of the host.
pub struct Directory {
    root: PathBuf,
}

impl Directory {
    pub fn new<T: Into<PathBuf>>(root: T) -> Result<Self> {
        let root = root.into();
        info!("Creates directory based virtual file system at {:?}.", root);

        let metadata = fs::metadata(&root)?;
        if metadata.is_dir() {
            Ok(Directory { root: root })
        } else {
            Err(Error::BadParam(format!(
                "Directory file system must be rooted at a readable directory, not {:?}.",
                root
            )))
        }
    }
}

impl VFS for Directory {
    fn read_to_end(&self, location: &Path, mut buf: &mut Vec<u8>) -> Result<usize> {
        let location = self.root.join(location);
        let mut file = fs::File::open(&location)?;
        let len = file.read_to_end(&mut buf)?;
        Ok(len)
    }

    fn exists(&self, location: &Path) -> bool {
        self.root.join(location).exists()
    }
}
