use std::any::Any;

use inlinable_string::InlinableString;

use crate::errors::*;
use crate::manifest::ResourceDef;

use super::{LoadContext, Resource, ResourceState, Slot};

pub const KIND: &str = "text";

/// A UTF-8 text file.
pub struct Text {
    name: InlinableString,
    path: InlinableString,
    slot: Slot<String>,
}

impl Text {
    pub fn from_def(def: &ResourceDef) -> Result<Self> {
        Ok(Text {
            name: def.name.clone(),
            path: def.attr_str("path")?.into(),
            slot: Slot::new(),
        })
    }

    pub fn value<F: FnOnce(&str) -> R, R>(&self, map: F) -> Option<R> {
        self.slot.get(|v| map(v))
    }
}

impl Resource for Text {
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

    fn load(&self, ctx: &LoadContext) -> Result<()> {
        let path = &self.path;
        self.slot.load_with(|| {
            let bytes = ctx.read(path)?;
            String::from_utf8(bytes)
                .map_err(|err| Error::BadParam(format!("Text '{}' is not UTF-8: {}", path, err)))
        })
    }

    fn unload(&self, _: &LoadContext) {
        self.slot.release();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
