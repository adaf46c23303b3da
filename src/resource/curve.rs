use std::any::Any;

use cgmath::Vector2;
use inlinable_string::InlinableString;
use serde_json;

use crate::errors::*;
use crate::manifest::ResourceDef;

use super::{LoadContext, Resource, ResourceState, Slot};

pub const KIND: &str = "curve";

/// A piecewise-linear curve defined by a JSON list of 2-D control points,
/// sampled with `evaluate`. Control points must be sorted by their x
/// component.
pub struct Curve {
    name: InlinableString,
    path: InlinableString,
    slot: Slot<Vec<Vector2<f32>>>,
}

fn decode(bytes: &[u8]) -> Result<Vec<Vector2<f32>>> {
    let points: Vec<(f32, f32)> = serde_json::from_slice(bytes)?;
    if points.len() < 2 {
        return Err(Error::BadParam(
            "Curve needs at least two control points.".into(),
        ));
    }

    for w in points.windows(2) {
        if w[1].0 < w[0].0 {
            return Err(Error::BadParam(
                "Curve control points must be sorted by x.".into(),
            ));
        }
    }

    Ok(points.into_iter().map(|(x, y)| Vector2::new(x, y)).collect())
}

fn sample(points: &[Vector2<f32>], t: f32) -> f32 {
    let first = points.first().unwrap();
    if t <= first.x {
        return first.y;
    }

    let last = points.last().unwrap();
    if t >= last.x {
        return last.y;
    }

    for w in points.windows(2) {
        if t <= w[1].x {
            let span = w[1].x - w[0].x;
            if span <= ::std::f32::EPSILON {
                return w[1].y;
            }

            let alpha = (t - w[0].x) / span;
            return w[0].y + (w[1].y - w[0].y) * alpha;
        }
    }

    last.y
}

impl Curve {
    pub fn from_def(def: &ResourceDef) -> Result<Self> {
        Ok(Curve {
            name: def.name.clone(),
            path: def.attr_str("path")?.into(),
            slot: Slot::new(),
        })
    }

    /// Samples the curve at `t`, clamping outside the defined range.
    pub fn evaluate(&self, t: f32) -> Option<f32> {
        self.slot.get(|points| sample(points, t))
    }

    pub fn len(&self) -> Option<usize> {
        self.slot.get(|points| points.len())
    }
}

impl Resource for Curve {
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
        self.slot.load_with(|| decode(&ctx.read(path)?))
    }

    fn unload(&self, _: &LoadContext) {
        self.slot.release();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
