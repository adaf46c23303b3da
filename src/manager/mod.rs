//! The resource manager façade.
//!
//! The manager owns every group, the mounted file systems and the
//! scheduling backend. Load and unload requests go through `load_group` /
//! `unload_group`; the per-frame `advance` applies completed batches to
//! manager-visible state and delivers notifications, always on the owning
//! thread. Consumers look resources up by (kind, name) and must tolerate a
//! transient `None` while an asynchronous load is in flight.

pub mod backend;
pub mod worker;

pub use self::backend::Direction;

use std::sync::{Arc, RwLock};

use inlinable_string::InlinableString;

use crate::device::Device;
use crate::errors::*;
use crate::group::ResourceGroup;
use crate::manifest::GroupManifest;
use crate::registry::ResourceRegistry;
use crate::resource::Resource;
use crate::utils::{FastHashMap, HashValue};
use crate::vfs::{Location, VFSDriver, VFS};

use self::backend::{Backend, Completion, SyncBackend};
use self::worker::ThreadedBackend;

/// The scheduling strategy, picked at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadingMode {
    /// Load and unload run synchronously inside the scheduling call. For
    /// platforms without threading; the caller blocks for the duration.
    SingleThreaded,
    /// Batches are deferred to a dedicated worker thread and applied by
    /// `advance`; the calling thread never blocks on asset I/O.
    MultiThreaded,
}

/// The lifecycle of a group as the manager sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    Unloaded,
    Loading,
    Loaded,
    Unloading,
}

/// A notification delivered through `advance` once a batch has been applied.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupEvent {
    /// The load batch finished. `failures` lists the members that did not
    /// reach the loaded state; their reasons stay queryable on the
    /// resources themselves.
    Loaded {
        group: String,
        failures: Vec<String>,
    },
    Unloaded {
        group: String,
    },
}

pub trait GroupListener: Send {
    fn on_group_event(&mut self, event: &GroupEvent);
}

struct GroupEntry {
    group: Arc<ResourceGroup>,
    state: GroupState,
}

pub struct ResourceManager {
    driver: Arc<RwLock<VFSDriver>>,
    registry: ResourceRegistry,
    backend: Box<dyn Backend>,
    entries: Vec<GroupEntry>,
    index: FastHashMap<HashValue<str>, usize>,
    listeners: Vec<Box<dyn GroupListener>>,
    completions: Vec<Completion>,
}

impl ResourceManager {
    /// Creates a new manager with an explicit factory registry and hardware
    /// resource provider.
    pub fn new(
        registry: ResourceRegistry,
        device: Arc<dyn Device>,
        mode: ThreadingMode,
    ) -> Result<Self> {
        let driver = Arc::new(RwLock::new(VFSDriver::new()));

        let backend: Box<dyn Backend> = match mode {
            ThreadingMode::SingleThreaded => {
                Box::new(SyncBackend::new(driver.clone(), device))
            }
            ThreadingMode::MultiThreaded => {
                Box::new(ThreadedBackend::new(driver.clone(), device)?)
            }
        };

        Ok(ResourceManager {
            driver: driver,
            registry: registry,
            backend: backend,
            entries: Vec::new(),
            index: FastHashMap::default(),
            listeners: Vec::new(),
            completions: Vec::new(),
        })
    }

    /// Mount a file-system drive with identifier.
    pub fn mount<T, F>(&mut self, name: T, vfs: F) -> Result<()>
    where
        T: AsRef<str>,
        F: VFS + 'static,
    {
        self.driver.write().unwrap().mount(name, vfs)
    }

    /// Registers a listener notified of group completions during `advance`.
    pub fn add_listener<T: GroupListener + 'static>(&mut self, listener: T) {
        self.listeners.push(Box::new(listener));
    }

    /// Parses a group definition document at `location` and registers it.
    /// All the members start unloaded.
    pub fn create_group<T: AsRef<str>>(&mut self, location: T) -> Result<()> {
        let location = Location::from_str(location.as_ref())?;
        let mut buf = Vec::new();
        self.driver.read().unwrap().read_to_end(&location, &mut buf)?;

        let manifest = GroupManifest::parse(&buf)?;
        self.add_group(&manifest)
    }

    /// Registers a group from an already parsed manifest. Fails with
    /// `AlreadyExists` on a duplicated group name; a malformed member fails
    /// the whole group atomically.
    pub fn add_group(&mut self, manifest: &GroupManifest) -> Result<()> {
        let key = HashValue::from(&*manifest.name);
        if self.index.contains_key(&key) {
            return Err(Error::AlreadyExists(format!("Group '{}'", manifest.name)));
        }

        let group = ResourceGroup::from_manifest(manifest, &self.registry)?;
        info!(
            "Registers group '{}' with {} resources.",
            manifest.name,
            group.len()
        );

        self.index.insert(key, self.entries.len());
        self.entries.push(GroupEntry {
            group: Arc::new(group),
            state: GroupState::Unloaded,
        });

        Ok(())
    }

    /// Schedules a load of every resource in the named group.
    ///
    /// Returns `Ok` once the batch is scheduled (multi-threaded) or has run
    /// to completion (single-threaded); `AlreadyExists` if the group is
    /// loaded or a batch for it is still in flight; `NotFound` if no such
    /// group was registered.
    pub fn load_group<T: AsRef<str>>(&mut self, name: T) -> Result<()> {
        let name = name.as_ref();
        let idx = self.locate(name)?;

        match self.entries[idx].state {
            GroupState::Unloaded => {}
            _ => {
                return Err(Error::AlreadyExists(format!("Load request of '{}'", name)));
            }
        }

        info!("Schedules load of group '{}'.", name);
        self.entries[idx].state = GroupState::Loading;
        self.backend.schedule_load(self.entries[idx].group.clone())
    }

    /// Schedules an unload of the named group. A group that is not loaded
    /// is a no-op, not an error; a group with a batch in flight is rejected
    /// with `AlreadyExists`.
    pub fn unload_group<T: AsRef<str>>(&mut self, name: T) -> Result<()> {
        let name = name.as_ref();
        let idx = self.locate(name)?;

        match self.entries[idx].state {
            GroupState::Unloaded => return Ok(()),
            GroupState::Loading | GroupState::Unloading => {
                return Err(Error::AlreadyExists(format!(
                    "In-flight batch of '{}'",
                    name
                )));
            }
            GroupState::Loaded => {}
        }

        info!("Schedules unload of group '{}'.", name);
        self.entries[idx].state = GroupState::Unloading;
        self.backend
            .schedule_unload(self.entries[idx].group.clone())
    }

    /// Applies completed batches to manager-visible state and delivers
    /// group notifications. Called once per frame from the owning thread;
    /// never blocks on asset I/O.
    pub fn advance(&mut self) {
        self.backend.poll(&mut self.completions);

        for completion in self.completions.drain(..) {
            let idx = match self.index.get(&HashValue::from(&*completion.group)) {
                Some(&idx) => idx,
                None => continue,
            };

            let event = match completion.direction {
                Direction::Load => {
                    self.entries[idx].state = GroupState::Loaded;

                    if completion.failures.is_empty() {
                        info!("Group '{}' finished loading.", completion.group);
                    } else {
                        warn!(
                            "Group '{}' finished loading with {} failure(s).",
                            completion.group,
                            completion.failures.len()
                        );
                    }

                    GroupEvent::Loaded {
                        group: completion.group.to_string(),
                        failures: completion
                            .failures
                            .iter()
                            .map(InlinableString::to_string)
                            .collect(),
                    }
                }
                Direction::Unload => {
                    self.entries[idx].state = GroupState::Unloaded;
                    info!("Group '{}' finished unloading.", completion.group);

                    GroupEvent::Unloaded {
                        group: completion.group.to_string(),
                    }
                }
            };

            for listener in &mut self.listeners {
                listener.on_group_event(&event);
            }
        }
    }

    /// Global resource lookup by (kind, name) across all groups, in group
    /// registration order. Only resources that are actually loaded are
    /// returned; a `None` during an asynchronous load is transient and
    /// callers are expected to re-query.
    pub fn resource(&self, kind: &str, name: &str) -> Option<Arc<dyn Resource>> {
        for entry in &self.entries {
            if let Some(resource) = entry.group.resource(kind, name) {
                if resource.is_loaded() {
                    return Some(resource);
                }
            }
        }

        None
    }

    /// Gets the named group regardless of its load state.
    pub fn group<T: AsRef<str>>(&self, name: T) -> Option<Arc<ResourceGroup>> {
        self.index
            .get(&HashValue::from(name.as_ref()))
            .map(|&idx| self.entries[idx].group.clone())
    }

    pub fn group_state<T: AsRef<str>>(&self, name: T) -> Option<GroupState> {
        self.index
            .get(&HashValue::from(name.as_ref()))
            .map(|&idx| self.entries[idx].state)
    }

    #[inline]
    pub fn is_group_loaded<T: AsRef<str>>(&self, name: T) -> bool {
        self.group_state(name) == Some(GroupState::Loaded)
    }

    /// The number of batches scheduled but not yet picked up by the
    /// backend. Always zero for the single-threaded backend.
    #[inline]
    pub fn pending(&self) -> usize {
        self.backend.pending()
    }

    fn locate(&self, name: &str) -> Result<usize> {
        self.index
            .get(&HashValue::from(name))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Group '{}'", name)))
    }
}
