use std::any::Any;

use inlinable_string::InlinableString;

use crate::errors::*;
use crate::manifest::ResourceDef;

use super::{LoadContext, Resource, ResourceState, Slot};

pub const KIND: &str = "data";

/// An opaque blob of bytes read verbatim from a file, or supplied
/// programmatically with the `manual` flag.
pub struct Data {
    name: InlinableString,
    path: InlinableString,
    manual: bool,
    slot: Slot<Vec<u8>>,
}

impl Data {
    pub fn from_def(def: &ResourceDef) -> Result<Self> {
        if def.manual {
            return Ok(Data {
                name: def.name.clone(),
                path: InlinableString::from(""),
                manual: true,
                slot: Slot::new(),
            });
        }

        Ok(Data {
            name: def.name.clone(),
            path: def.attr_str("path")?.into(),
            manual: false,
            slot: Slot::new(),
        })
    }

    /// Supplies manual content. Only meaningful for resources flagged as
    /// manual; the next `load` will find the payload already in place.
    pub fn supply<T: Into<Vec<u8>>>(&self, bytes: T) {
        let bytes = bytes.into();
        let _ = self.slot.load_with(|| Ok(bytes));
    }

    pub fn len(&self) -> Option<usize> {
        self.slot.get(|v| v.len())
    }

    pub fn bytes<F: FnOnce(&[u8]) -> R, R>(&self, map: F) -> Option<R> {
        self.slot.get(|v| map(v))
    }
}

impl Resource for Data {
    fn kind(&self) -> &str {
        KIND
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> ResourceState {
        self.slot.state()
    }

    fn failure(&self) -> Option<String> {
        self.slot.failure()
    }

    fn manual(&self) -> bool {
        self.manual
    }

    fn load(&self, ctx: &LoadContext) -> Result<()> {
        if self.manual {
            // Nothing to read; content arrives through `supply`.
            return self.slot.load_with(|| {
                Err(Error::NotFound(format!(
                    "Manual content of data '{}'",
                    self.name
                )))
            });
        }

        self.slot.load_with(|| ctx.read(&self.path))
    }

    fn unload(&self, _: &LoadContext) {
        self.slot.release();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
