//! The abstract loadable entity and its uniform lifecycle.
//!
//! Every concrete kind only specializes the parsing of its definition
//! element and the materialization of its payload; the state machine, the
//! idempotence rules and the failure bookkeeping are shared through `Slot`.
//!
//! A resource's payload exists if and only if its state is `Loaded`. Any
//! error during load leaves the resource in `Failed` with a retrievable
//! reason, never in a half-populated `Loaded`.

pub mod animation;
pub mod curve;
pub mod data;
pub mod sequencer;
pub mod shader;
pub mod sound;
pub mod spritesheet;
pub mod text;
pub mod texture;

pub use self::animation::SpriteAnimation;
pub use self::curve::Curve;
pub use self::data::Data;
pub use self::sequencer::Sequencer;
pub use self::shader::Shader;
pub use self::sound::Sound;
pub use self::spritesheet::Spritesheet;
pub use self::text::Text;
pub use self::texture::Texture;

use std::any::Any;
use std::sync::{Arc, RwLock};

use crate::device::Device;
use crate::errors::*;
use crate::vfs::{Location, VFSDriver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceState {
    Unloaded,
    Loading,
    Loaded,
    Failed,
}

/// A named, typed loadable asset with a load/unload lifecycle.
pub trait Resource: Send + Sync + 'static {
    /// The type discriminator this resource was registered under.
    fn kind(&self) -> &str;

    /// The name, unique within the owning group.
    fn name(&self) -> &str;

    /// Pure query of the lifecycle state; never blocks on in-flight I/O.
    fn state(&self) -> ResourceState;

    /// The recorded reason of the last load failure, if any.
    fn failure(&self) -> Option<String>;

    /// True if the content is supplied programmatically rather than parsed
    /// from a definition file.
    fn manual(&self) -> bool {
        false
    }

    /// Populates the payload. Idempotent: a second call on a loaded
    /// resource returns success without repeating the work, and a load
    /// still in flight on another thread is an error rather than a second
    /// run. May block on file I/O or device creation, so in the
    /// multi-threaded backend this is only ever invoked from the worker.
    fn load(&self, ctx: &LoadContext) -> Result<()>;

    /// Releases the payload and resets to `Unloaded`. Safe to call
    /// repeatedly and on an unloaded resource.
    fn unload(&self, ctx: &LoadContext);

    fn as_any(&self) -> &dyn Any;

    #[inline]
    fn is_loaded(&self) -> bool {
        self.state() == ResourceState::Loaded
    }
}

/// Resolves sibling resources during load, so that dependent kinds can pull
/// their dependencies in before declaring themselves loaded.
pub trait ResourceResolver {
    fn resolve(&self, kind: &str, name: &str) -> Option<Arc<dyn Resource>>;
}

/// Everything a resource may touch while loading: the mounted file systems,
/// the hardware resource provider and a resolver for dependencies.
pub struct LoadContext<'a> {
    pub vfs: &'a VFSDriver,
    pub device: &'a dyn Device,
    resolver: &'a dyn ResourceResolver,
}

impl<'a> LoadContext<'a> {
    pub fn new(
        vfs: &'a VFSDriver,
        device: &'a dyn Device,
        resolver: &'a dyn ResourceResolver,
    ) -> Self {
        LoadContext {
            vfs: vfs,
            device: device,
            resolver: resolver,
        }
    }

    /// Reads the entire file at a `"fs:path"` location.
    pub fn read(&self, location: &str) -> Result<Vec<u8>> {
        let location = Location::from_str(location)?;
        let mut buf = Vec::new();
        self.vfs.read_to_end(&location, &mut buf)?;
        Ok(buf)
    }

    /// Looks up a sibling resource by (kind, name).
    pub fn resource(&self, kind: &str, name: &str) -> Option<Arc<dyn Resource>> {
        self.resolver.resolve(kind, name)
    }

    /// Resolves a dependency and makes sure it is loaded, propagating its
    /// failure as our own. Loading an already-loaded dependency is a no-op,
    /// so out-of-order definitions still converge.
    pub fn dependency(&self, kind: &str, name: &str) -> Result<Arc<dyn Resource>> {
        let dep = self
            .resource(kind, name)
            .ok_or_else(|| Error::NotFound(format!("Dependency '{}' ({})", name, kind)))?;

        dep.load(self).map_err(|err| {
            Error::Other(format!(
                "Dependency '{}' ({}) failed to load: {}",
                name, kind, err
            ))
        })?;

        Ok(dep)
    }
}

/// The uniform lifecycle cell shared by all resource kinds. The payload is
/// embedded in the state enum, which makes the "payload exists iff loaded"
/// invariant structural.
pub struct Slot<T> {
    status: RwLock<Status<T>>,
}

enum Status<T> {
    Unloaded,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> Slot<T> {
    pub fn new() -> Self {
        Slot {
            status: RwLock::new(Status::Unloaded),
        }
    }

    /// Creates a slot holding manual content, born in the loaded state.
    pub fn with(v: T) -> Self {
        Slot {
            status: RwLock::new(Status::Loaded(v)),
        }
    }

    pub fn state(&self) -> ResourceState {
        match *self.status.read().unwrap() {
            Status::Unloaded => ResourceState::Unloaded,
            Status::Loading => ResourceState::Loading,
            Status::Loaded(_) => ResourceState::Loaded,
            Status::Failed(_) => ResourceState::Failed,
        }
    }

    pub fn failure(&self) -> Option<String> {
        match *self.status.read().unwrap() {
            Status::Failed(ref reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Runs `f` to materialize the payload, unless its already there. The
    /// lock is not held while `f` blocks; the transient `Loading` state is
    /// observable meanwhile. A load already in flight on another thread is
    /// rejected, never run a second time, so the first payload can not be
    /// silently overwritten.
    pub fn load_with<F: FnOnce() -> Result<T>>(&self, f: F) -> Result<()> {
        {
            let mut status = self.status.write().unwrap();
            match *status {
                Status::Loaded(_) => return Ok(()),
                Status::Loading => {
                    return Err(Error::Other("Load already in flight.".into()));
                }
                _ => {}
            }

            *status = Status::Loading;
        }

        match f() {
            Ok(v) => {
                *self.status.write().unwrap() = Status::Loaded(v);
                Ok(())
            }
            Err(err) => {
                *self.status.write().unwrap() = Status::Failed(format!("{}", err));
                Err(err)
            }
        }
    }

    /// Resets to `Unloaded`, handing the payload back for teardown if there
    /// was one.
    pub fn release(&self) -> Option<T> {
        let mut status = self.status.write().unwrap();
        match ::std::mem::replace(&mut *status, Status::Unloaded) {
            Status::Loaded(v) => Some(v),
            _ => None,
        }
    }

    /// Maps over the payload if its there.
    pub fn get<F: FnOnce(&T) -> R, R>(&self, map: F) -> Option<R> {
        match *self.status.read().unwrap() {
            Status::Loaded(ref v) => Some(map(v)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lifecycle() {
        let slot = Slot::new();
        assert_eq!(slot.state(), ResourceState::Unloaded);
        assert!(slot.release().is_none());

        slot.load_with(|| Ok(42)).unwrap();
        assert_eq!(slot.state(), ResourceState::Loaded);
        assert_eq!(slot.get(|v| *v), Some(42));

        // Idempotent; the closure must not run again.
        slot.load_with(|| panic!("must not be invoked")).unwrap();

        assert_eq!(slot.release(), Some(42));
        assert_eq!(slot.state(), ResourceState::Unloaded);
        assert!(slot.release().is_none());
    }

    #[test]
    fn failure() {
        let slot = Slot::<u32>::new();
        assert!(slot
            .load_with(|| Err(Error::Other("broken".into())))
            .is_err());

        assert_eq!(slot.state(), ResourceState::Failed);
        assert_eq!(slot.failure(), Some("broken".to_string()));
        assert!(slot.get(|v| *v).is_none());

        // A failed slot resets cleanly.
        assert!(slot.release().is_none());
        assert_eq!(slot.state(), ResourceState::Unloaded);
    }

    #[test]
    fn manual() {
        let slot = Slot::with("payload");
        assert_eq!(slot.state(), ResourceState::Loaded);
    }

    #[test]
    fn in_flight_load_is_exclusive() {
        use std::sync::mpsc;
        use std::thread;
        use std::time::Duration;

        let slot = Arc::new(Slot::new());
        let (tx, rx) = mpsc::channel();

        let worker = {
            let slot = slot.clone();
            thread::spawn(move || {
                slot.load_with(|| {
                    tx.send(()).unwrap();
                    thread::sleep(Duration::from_millis(50));
                    Ok(7)
                })
            })
        };

        // The first load is underway; a competing one must not run.
        rx.recv().unwrap();
        assert_eq!(slot.state(), ResourceState::Loading);
        assert!(slot.load_with(|| panic!("must not be invoked")).is_err());

        worker.join().unwrap().unwrap();
        assert_eq!(slot.get(|v| *v), Some(7));
    }
}
