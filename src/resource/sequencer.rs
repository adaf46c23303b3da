use std::any::Any;

use inlinable_string::InlinableString;

use crate::errors::*;
use crate::manifest::ResourceDef;

use super::{LoadContext, Resource, ResourceState, Slot};

pub const KIND: &str = "sequencer";

/// An ordered sequence of frame indices played back at a fixed rate.
/// Defined entirely inline in the group document; loading performs no I/O.
pub struct Sequencer {
    name: InlinableString,
    frames: Vec<u32>,
    fps: f32,
    slot: Slot<()>,
}

impl Sequencer {
    pub fn from_def(def: &ResourceDef) -> Result<Self> {
        let frames = def.attr_u32_list("frames")?;
        if frames.is_empty() {
            return Err(Error::BadParam(format!(
                "Sequencer '{}' needs at least one frame.",
                def.name
            )));
        }

        let fps = def.attr_f32("fps")?;
        if fps <= 0.0 {
            return Err(Error::BadParam(format!(
                "Sequencer '{}' needs a positive fps.",
                def.name
            )));
        }

        Ok(Sequencer {
            name: def.name.clone(),
            frames: frames,
            fps: fps,
            slot: Slot::new(),
        })
    }

    pub fn frames(&self) -> &[u32] {
        &self.frames
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// The frame index shown `elapsed` seconds into a looping playback.
    pub fn frame_at(&self, elapsed: f32) -> u32 {
        let idx = (elapsed.max(0.0) * self.fps) as usize % self.frames.len();
        self.frames[idx]
    }
}

impl Resource for Sequencer {
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

    fn load(&self, _: &LoadContext) -> Result<()> {
        self.slot.load_with(|| Ok(()))
    }

    fn unload(&self, _: &LoadContext) {
        self.slot.release();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
