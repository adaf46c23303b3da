use std::any::Any;
use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use inlinable_string::InlinableString;

use crate::device::{SoundHandle, SoundParams};
use crate::errors::*;
use crate::manifest::ResourceDef;

use super::{LoadContext, Resource, ResourceState, Slot};

pub const KIND: &str = "sound";

pub const MAGIC: [u8; 8] = [
    'S' as u8, 'N' as u8, 'D' as u8, ' ' as u8, 0, 0, 0, 1,
];

/// A sound buffer realized from cooked PCM samples: the magic header, a
/// serialized `SoundParams` and the length-prefixed sample payload.
pub struct Sound {
    name: InlinableString,
    path: InlinableString,
    slot: Slot<SoundPayload>,
}

struct SoundPayload {
    params: SoundParams,
    handle: SoundHandle,
}

/// Encodes PCM samples into the cooked on-disk representation.
pub fn encode(params: SoundParams, samples: &[u8]) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(samples.len() + 32);
    buf.write_all(&MAGIC)?;
    bincode::serialize_into(&mut buf, &params)
        .map_err(|err| Error::Other(format!("{}", err)))?;
    buf.write_u32::<LittleEndian>(samples.len() as u32)?;
    buf.write_all(samples)?;
    Ok(buf)
}

fn decode(bytes: &[u8]) -> Result<(SoundParams, Vec<u8>)> {
    let mut cursor = Cursor::new(bytes);

    let mut magic = [0; 8];
    cursor.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(Error::BadParam("Sound magic number mismatch.".into()));
    }

    let params: SoundParams = bincode::deserialize_from(&mut cursor)?;
    let len = cursor.read_u32::<LittleEndian>()? as usize;

    // The length prefix is untrusted input; never allocate more than what
    // the file can actually back.
    let remaining = bytes.len() - cursor.position() as usize;
    if len > remaining {
        return Err(Error::NoMemory(format!(
            "reserving {} sample bytes with {} left in the file",
            len, remaining
        )));
    }

    let mut samples = vec![0; len];
    cursor.read_exact(&mut samples)?;
    Ok((params, samples))
}

impl Sound {
    pub fn from_def(def: &ResourceDef) -> Result<Self> {
        Ok(Sound {
            name: def.name.clone(),
            path: def.attr_str("path")?.into(),
            slot: Slot::new(),
        })
    }

    pub fn handle(&self) -> Option<SoundHandle> {
        self.slot.get(|v| v.handle)
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.slot.get(|v| v.params.sample_rate)
    }
}

impl Resource for Sound {
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
            let (params, samples) = decode(&bytes)?;
            let handle = ctx.device.create_sound(params, &samples)?;

            Ok(SoundPayload {
                params: params,
                handle: handle,
            })
        })
    }

    fn unload(&self, ctx: &LoadContext) {
        if let Some(payload) = self.slot.release() {
            ctx.device.delete_sound(payload.handle);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
