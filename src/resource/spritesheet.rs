use std::any::Any;

use inlinable_string::InlinableString;

use crate::device::TextureHandle;
use crate::errors::*;
use crate::manifest::ResourceDef;

use super::texture::Texture;
use super::{LoadContext, Resource, ResourceState, Slot};

pub const KIND: &str = "spritesheet";

/// A rectangular region of a spritesheet, in texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A texture sliced into a grid of equally sized cells, indexed row-major.
/// Depends on a `texture` resource of the same group; the texture is loaded
/// first and its failure propagates as this resource's own.
pub struct Spritesheet {
    name: InlinableString,
    texture: InlinableString,
    cell_width: u32,
    cell_height: u32,
    slot: Slot<SheetPayload>,
}

struct SheetPayload {
    texture: TextureHandle,
    frames: Vec<Frame>,
}

fn slice(width: u32, height: u32, cell_width: u32, cell_height: u32) -> Vec<Frame> {
    let cols = width / cell_width;
    let rows = height / cell_height;

    let mut frames = Vec::with_capacity((cols * rows) as usize);
    for row in 0..rows {
        for col in 0..cols {
            frames.push(Frame {
                x: col * cell_width,
                y: row * cell_height,
                width: cell_width,
                height: cell_height,
            });
        }
    }

    frames
}

impl Spritesheet {
    pub fn from_def(def: &ResourceDef) -> Result<Self> {
        let cell_width = def.attr_u32("cell_width")?;
        let cell_height = def.attr_u32("cell_height")?;
        if cell_width == 0 || cell_height == 0 {
            return Err(Error::BadParam(format!(
                "Spritesheet '{}' needs non-zero cell dimensions.",
                def.name
            )));
        }

        Ok(Spritesheet {
            name: def.name.clone(),
            texture: def.attr_str("texture")?.into(),
            cell_width: cell_width,
            cell_height: cell_height,
            slot: Slot::new(),
        })
    }

    pub fn texture(&self) -> Option<TextureHandle> {
        self.slot.get(|v| v.texture)
    }

    pub fn frame(&self, index: usize) -> Option<Frame> {
        self.slot.get(|v| v.frames.get(index).cloned()).unwrap_or(None)
    }

    pub fn len(&self) -> Option<usize> {
        self.slot.get(|v| v.frames.len())
    }
}

impl Resource for Spritesheet {
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
        let (texture, cw, ch) = (&self.texture, self.cell_width, self.cell_height);
        self.slot.load_with(|| {
            let dep = ctx.dependency(super::texture::KIND, texture)?;
            let dep = dep
                .as_any()
                .downcast_ref::<Texture>()
                .ok_or_else(|| Error::NotFound(format!("Texture '{}'", texture)))?;

            // The dependency is loaded at this point, so both are present.
            let handle = dep.handle().unwrap();
            let (width, height) = dep.dimensions().unwrap();

            if width < cw || height < ch {
                return Err(Error::BadParam(format!(
                    "Texture '{}' ({}x{}) is smaller than a single {}x{} cell.",
                    texture, width, height, cw, ch
                )));
            }

            Ok(SheetPayload {
                texture: handle,
                frames: slice(width, height, cw, ch),
            })
        })
    }

    fn unload(&self, _: &LoadContext) {
        // The texture handle is owned by the texture resource; only the
        // frame table goes away here.
        self.slot.release();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn grid() {
        let frames = slice(100, 50, 25, 25);
        assert_eq!(frames.len(), 8);
        assert_eq!(
            frames[0],
            Frame {
                x: 0,
                y: 0,
                width: 25,
                height: 25
            }
        );
        assert_eq!(
            frames[5],
            Frame {
                x: 25,
                y: 25,
                width: 25,
                height: 25
            }
        );
    }
}
