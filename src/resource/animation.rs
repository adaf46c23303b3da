use std::any::Any;

use inlinable_string::InlinableString;

use crate::device::TextureHandle;
use crate::errors::*;
use crate::manifest::ResourceDef;

use super::sequencer::Sequencer;
use super::spritesheet::{Frame, Spritesheet};
use super::{LoadContext, Resource, ResourceState, Slot};

pub const KIND: &str = "sprite_animation";

/// A playable animation: a spritesheet plus one named track per sequencer,
/// with every frame index resolved against the sheet up front. Depends on a
/// `spritesheet` and one or more `sequencer`s of the same group.
pub struct SpriteAnimation {
    name: InlinableString,
    spritesheet: InlinableString,
    sequencers: Vec<InlinableString>,
    slot: Slot<AnimationPayload>,
}

struct AnimationPayload {
    texture: TextureHandle,
    tracks: Vec<Track>,
}

struct Track {
    name: InlinableString,
    fps: f32,
    frames: Vec<Frame>,
}

impl SpriteAnimation {
    pub fn from_def(def: &ResourceDef) -> Result<Self> {
        let sequencers = def.attr_str_list("sequencers")?;
        if sequencers.is_empty() {
            return Err(Error::BadParam(format!(
                "Sprite animation '{}' needs at least one sequencer.",
                def.name
            )));
        }

        Ok(SpriteAnimation {
            name: def.name.clone(),
            spritesheet: def.attr_str("spritesheet")?.into(),
            sequencers: sequencers.into_iter().map(|v| v.into()).collect(),
            slot: Slot::new(),
        })
    }

    pub fn texture(&self) -> Option<TextureHandle> {
        self.slot.get(|v| v.texture)
    }

    pub fn tracks(&self) -> Option<usize> {
        self.slot.get(|v| v.tracks.len())
    }

    /// The frame rects of the named track, in playback order.
    pub fn track_frames(&self, track: &str) -> Option<Vec<Frame>> {
        self.slot
            .get(|v| {
                v.tracks
                    .iter()
                    .find(|t| t.name == track)
                    .map(|t| t.frames.clone())
            })
            .unwrap_or(None)
    }

    pub fn track_fps(&self, track: &str) -> Option<f32> {
        self.slot
            .get(|v| v.tracks.iter().find(|t| t.name == track).map(|t| t.fps))
            .unwrap_or(None)
    }
}

impl Resource for SpriteAnimation {
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
        let (spritesheet, sequencers) = (&self.spritesheet, &self.sequencers);
        self.slot.load_with(|| {
            let sheet = ctx.dependency(super::spritesheet::KIND, spritesheet)?;
            let sheet = sheet
                .as_any()
                .downcast_ref::<Spritesheet>()
                .ok_or_else(|| Error::NotFound(format!("Spritesheet '{}'", spritesheet)))?;

            let texture = sheet.texture().unwrap();
            let cells = sheet.len().unwrap();

            let mut tracks = Vec::with_capacity(sequencers.len());
            for name in sequencers {
                let seq = ctx.dependency(super::sequencer::KIND, name)?;
                let seq = seq
                    .as_any()
                    .downcast_ref::<Sequencer>()
                    .ok_or_else(|| Error::NotFound(format!("Sequencer '{}'", name)))?;

                let mut frames = Vec::with_capacity(seq.frames().len());
                for &idx in seq.frames() {
                    let frame = sheet.frame(idx as usize).ok_or_else(|| {
                        Error::BadParam(format!(
                            "Sequencer '{}' references frame {} outside spritesheet '{}' ({} cells).",
                            name, idx, spritesheet, cells
                        ))
                    })?;
                    frames.push(frame);
                }

                tracks.push(Track {
                    name: name.clone(),
                    fps: seq.fps(),
                    frames: frames,
                });
            }

            Ok(AnimationPayload {
                texture: texture,
                tracks: tracks,
            })
        })
    }

    fn unload(&self, _: &LoadContext) {
        self.slot.release();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
