//! `kiln` loads, caches and reference-tracks game assets asynchronously.
//!
//! Assets are described as _resources_: named, typed loadable entities
//! (textures, sounds, spritesheets, shaders, text, curves and so on) that
//! live inside named _groups_, each parsed from one definition document.
//! The `ResourceManager` façade dispatches group-level load and unload
//! requests to a scheduling backend and exposes lookup by (kind, name) to
//! the rest of the engine.
//!
//! # Groups
//!
//! A group is the unit of loading. Its document lists one element per
//! resource with a type discriminator and kind-specific attributes; a
//! per-type-name factory registry turns elements into resource instances.
//! Members keep their insertion order, so a spritesheet listed after its
//! texture is guaranteed to load after it.
//!
//! # Backends
//!
//! Scheduling is a strategy picked at construction time:
//!
//! - `SingleThreaded` executes load/unload synchronously inside the call,
//!   for platforms without threading. The caller blocks for the duration.
//! - `MultiThreaded` appends a batch to a FIFO queue serviced by one
//!   long-lived worker thread and returns immediately. Completions are
//!   applied on the owning thread by `advance`, once per frame.
//!
//! Either way the caller-facing contract is identical; code written against
//! the manager cannot tell the backends apart except by timing.
//!
//! # Lifecycle
//!
//! Every resource walks the same state machine: unloaded, loading, loaded
//! or failed. The payload exists exactly while the state is loaded. Loads
//! are idempotent, failures are recorded per resource and stay queryable,
//! and nothing is ever thrown across the worker boundary; consumers poll
//! `is_loaded` (or subscribe to group events) and re-query lookups that
//! returned nothing while a load was still in flight.

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

pub mod device;
pub mod errors;
pub mod group;
pub mod manager;
pub mod manifest;
pub mod registry;
pub mod resource;
pub mod utils;
pub mod vfs;

pub mod prelude {
    pub use crate::device::{Device, HeadlessDevice};
    pub use crate::errors::{Error, Result};
    pub use crate::group::ResourceGroup;
    pub use crate::manager::{
        GroupEvent, GroupListener, GroupState, ResourceManager, ThreadingMode,
    };
    pub use crate::manifest::{GroupManifest, ResourceDef};
    pub use crate::registry::ResourceRegistry;
    pub use crate::resource::{LoadContext, Resource, ResourceState};
    pub use crate::vfs::{Directory, Location, Memory, VFS};
}
