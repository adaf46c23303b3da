use std::path::{Path, PathBuf};

use crate::errors::*;
use crate::utils::HashValue;

/// A readable identifier of some piece of data in one of the mounted virtual
/// file systems, in the string form `"fs:relative/path"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    fs: HashValue<str>,
    path: PathBuf,
}

impl Location {
    pub fn from_str<T: AsRef<str>>(v: T) -> Result<Location> {
        let v = v.as_ref();
        let idx = v
            .find(':')
            .ok_or_else(|| Error::BadParam(format!("Location '{}' is malformed.", v)))?;

        let (fs, path) = v.split_at(idx);
        if path.len() <= 1 {
            return Err(Error::BadParam(format!("Location '{}' is malformed.", v)));
        }

        Ok(Location {
            fs: fs.into(),
            path: Path::new(&path[1..]).into(),
        })
    }

    #[inline]
    pub fn fs(&self) -> HashValue<str> {
        self.fs
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
