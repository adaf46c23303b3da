use std::any::Any;
use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use inlinable_string::InlinableString;

use crate::device::{TextureHandle, TextureParams};
use crate::errors::*;
use crate::manifest::ResourceDef;

use super::{LoadContext, Resource, ResourceState, Slot};

pub const KIND: &str = "texture";

pub const MAGIC: [u8; 8] = [
    'T' as u8, 'E' as u8, 'X' as u8, ' ' as u8, 0, 0, 0, 1,
];

/// A device-resident texture, loaded from the cooked binary format produced
/// by the import tooling: the magic header, a serialized `TextureParams` and
/// the length-prefixed texel payload.
pub struct Texture {
    name: InlinableString,
    path: InlinableString,
    slot: Slot<TexturePayload>,
}

struct TexturePayload {
    params: TextureParams,
    handle: TextureHandle,
}

/// Encodes texels into the cooked on-disk representation.
pub fn encode(params: TextureParams, texels: &[u8]) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(texels.len() + 32);
    buf.write_all(&MAGIC)?;
    bincode::serialize_into(&mut buf, &params)
        .map_err(|err| Error::Other(format!("{}", err)))?;
    buf.write_u32::<LittleEndian>(texels.len() as u32)?;
    buf.write_all(texels)?;
    Ok(buf)
}

fn decode(bytes: &[u8]) -> Result<(TextureParams, Vec<u8>)> {
    let mut cursor = Cursor::new(bytes);

    let mut magic = [0; 8];
    cursor.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(Error::BadParam("Texture magic number mismatch.".into()));
    }

    let params: TextureParams = bincode::deserialize_from(&mut cursor)?;
    let len = cursor.read_u32::<LittleEndian>()? as usize;

    // The length prefix is untrusted input; never allocate more than what
    // the file can actually back.
    let remaining = bytes.len() - cursor.position() as usize;
    if len > remaining {
        return Err(Error::NoMemory(format!(
            "reserving {} texel bytes with {} left in the file",
            len, remaining
        )));
    }

    let mut texels = vec![0; len];
    cursor.read_exact(&mut texels)?;
    Ok((params, texels))
}

impl Texture {
    pub fn from_def(def: &ResourceDef) -> Result<Self> {
        Ok(Texture {
            name: def.name.clone(),
            path: def.attr_str("path")?.into(),
            slot: Slot::new(),
        })
    }

    pub fn handle(&self) -> Option<TextureHandle> {
        self.slot.get(|v| v.handle)
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.slot.get(|v| (v.params.width, v.params.height))
    }
}

impl Resource for Texture {
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
            let (params, texels) = decode(&bytes)?;
            let handle = ctx.device.create_texture(params, &texels)?;

            Ok(TexturePayload {
                params: params,
                handle: handle,
            })
        })
    }

    fn unload(&self, ctx: &LoadContext) {
        if let Some(payload) = self.slot.release() {
            ctx.device.delete_texture(payload.handle);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
