use std::any::Any;

use inlinable_string::InlinableString;

use crate::device::ShaderHandle;
use crate::errors::*;
use crate::manifest::ResourceDef;

use super::{LoadContext, Resource, ResourceState, Slot};

pub const KIND: &str = "shader";

/// A shader program assembled from a vertex and a fragment source file.
/// Compilation semantics stay behind the device boundary; this resource
/// only moves the sources across it.
pub struct Shader {
    name: InlinableString,
    vs: InlinableString,
    fs: InlinableString,
    slot: Slot<ShaderHandle>,
}

impl Shader {
    pub fn from_def(def: &ResourceDef) -> Result<Self> {
        Ok(Shader {
            name: def.name.clone(),
            vs: def.attr_str("vs")?.into(),
            fs: def.attr_str("fs")?.into(),
            slot: Slot::new(),
        })
    }

    pub fn handle(&self) -> Option<ShaderHandle> {
        self.slot.get(|v| *v)
    }
}

impl Resource for Shader {
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
        let (vs, fs) = (&self.vs, &self.fs);
        self.slot.load_with(|| {
            let vs = String::from_utf8(ctx.read(vs)?)
                .map_err(|err| Error::BadParam(format!("Vertex shader is not UTF-8: {}", err)))?;
            let fs = String::from_utf8(ctx.read(fs)?)
                .map_err(|err| Error::BadParam(format!("Fragment shader is not UTF-8: {}", err)))?;

            ctx.device.create_shader(&vs, &fs)
        })
    }

    fn unload(&self, ctx: &LoadContext) {
        if let Some(handle) = self.slot.release() {
            ctx.device.delete_shader(handle);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
