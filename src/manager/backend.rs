//! The scheduling strategy behind the manager façade. The single-threaded
//! variant executes batches inline for platforms without threads; the
//! multi-threaded variant lives in `worker.rs`.

use std::sync::{Arc, Mutex, RwLock};

use inlinable_string::InlinableString;
use smallvec::SmallVec;

use crate::device::Device;
use crate::errors::*;
use crate::group::ResourceGroup;
use crate::resource::LoadContext;
use crate::vfs::VFSDriver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Load,
    Unload,
}

/// An in-flight unit of work: one group, one direction.
pub struct Batch {
    pub direction: Direction,
    pub group: Arc<ResourceGroup>,
}

/// The record of a finished batch, consumed by the manager on the owning
/// thread during `advance`.
pub struct Completion {
    pub group: InlinableString,
    pub direction: Direction,
    pub failures: SmallVec<[InlinableString; 4]>,
}

/// Runs a batch on the calling thread, recording per-resource failures.
/// Blocking I/O happens in here, so the multi-threaded backend only ever
/// calls this from its worker. `interrupted` is consulted between members;
/// once it fires the remaining members are skipped, so a shutting-down
/// worker only waits for the resource it is on.
pub fn execute(
    batch: &Batch,
    vfs: &VFSDriver,
    device: &dyn Device,
    interrupted: &dyn Fn() -> bool,
) -> Completion {
    let group = &batch.group;
    let ctx = LoadContext::new(vfs, device, group.as_ref());

    let mut failures = SmallVec::new();
    for resource in group.iter() {
        if interrupted() {
            break;
        }

        match batch.direction {
            Direction::Load => {
                if resource.load(&ctx).is_err() {
                    // The reason stays queryable on the resource itself.
                    failures.push(resource.name().into());
                }
            }
            Direction::Unload => resource.unload(&ctx),
        }
    }

    Completion {
        group: group.name().into(),
        direction: batch.direction,
        failures: failures,
    }
}

pub trait Backend: Send {
    /// Schedules a load batch. The single-threaded variant runs it to
    /// completion before returning and surfaces failures in the returned
    /// result; the multi-threaded variant returns as soon as the batch is
    /// enqueued.
    fn schedule_load(&self, group: Arc<ResourceGroup>) -> Result<()>;

    /// Schedules an unload batch, with the same inline-vs-deferred split.
    fn schedule_unload(&self, group: Arc<ResourceGroup>) -> Result<()>;

    /// Drains the completions that have accumulated since the last poll.
    fn poll(&self, out: &mut Vec<Completion>);

    /// The number of batches scheduled but not yet picked up.
    fn pending(&self) -> usize;
}

/// Executes every batch synchronously inside the scheduling call. `poll`
/// performs no deferred work; completions are only replayed through it so
/// that notification delivery matches the multi-threaded backend.
pub struct SyncBackend {
    driver: Arc<RwLock<VFSDriver>>,
    device: Arc<dyn Device>,
    completions: Mutex<Vec<Completion>>,
}

impl SyncBackend {
    pub fn new(driver: Arc<RwLock<VFSDriver>>, device: Arc<dyn Device>) -> Self {
        SyncBackend {
            driver: driver,
            device: device,
            completions: Mutex::new(Vec::new()),
        }
    }

    fn run(&self, direction: Direction, group: Arc<ResourceGroup>) -> Completion {
        let batch = Batch {
            direction: direction,
            group: group,
        };

        let driver = self.driver.read().unwrap();
        execute(&batch, &driver, self.device.as_ref(), &|| false)
    }
}

impl Backend for SyncBackend {
    fn schedule_load(&self, group: Arc<ResourceGroup>) -> Result<()> {
        let completion = self.run(Direction::Load, group);
        let result = if completion.failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Other(format!(
                "Group '{}' failed to load {} resource(s).",
                completion.group,
                completion.failures.len()
            )))
        };

        self.completions.lock().unwrap().push(completion);
        result
    }

    fn schedule_unload(&self, group: Arc<ResourceGroup>) -> Result<()> {
        let completion = self.run(Direction::Unload, group);
        self.completions.lock().unwrap().push(completion);
        Ok(())
    }

    fn poll(&self, out: &mut Vec<Completion>) {
        out.append(&mut self.completions.lock().unwrap());
    }

    fn pending(&self) -> usize {
        0
    }
}
