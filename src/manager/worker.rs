//! The multi-threaded backend: a FIFO batch queue serviced by one
//! long-lived worker thread.
//!
//! The queue mutex guards enqueue, dequeue and completion hand-off only.
//! It is never held across a blocking `load`/`unload`, so the manager-facing
//! side stays responsive however slow the I/O behind a batch is. Publishing
//! completions through the same mutex is also what gives consumers the
//! happens-before edge between a payload write on the worker and a state
//! observed as loaded on the main thread.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::thread;

use crate::device::Device;
use crate::errors::*;
use crate::group::ResourceGroup;
use crate::vfs::VFSDriver;

use super::backend::{execute, Backend, Batch, Completion, Direction};

struct State {
    queue: VecDeque<Batch>,
    completions: Vec<Completion>,
    shutdown: bool,
}

struct Shared {
    state: Mutex<State>,
    cond: Condvar,
}

pub struct ThreadedBackend {
    shared: Arc<Shared>,
    join: Option<thread::JoinHandle<()>>,
}

impl ThreadedBackend {
    pub fn new(driver: Arc<RwLock<VFSDriver>>, device: Arc<dyn Device>) -> Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                queue: VecDeque::new(),
                completions: Vec::new(),
                shutdown: false,
            }),
            cond: Condvar::new(),
        });

        let join = {
            let shared = shared.clone();
            thread::Builder::new()
                .name("kiln-worker".into())
                .spawn(move || Self::run(shared, driver, device))
                .map_err(|err| Error::Other(format!("Failed to spawn worker: {}", err)))?
        };

        Ok(ThreadedBackend {
            shared: shared,
            join: Some(join),
        })
    }

    fn run(shared: Arc<Shared>, driver: Arc<RwLock<VFSDriver>>, device: Arc<dyn Device>) {
        loop {
            let batch = {
                let mut state = shared.state.lock().unwrap();
                loop {
                    if state.shutdown {
                        return;
                    }

                    if let Some(batch) = state.queue.pop_front() {
                        break batch;
                    }

                    state = shared.cond.wait(state).unwrap();
                }
            };

            // The queue lock is released here; the batch is processed
            // without it so slow I/O never blocks the scheduling side. The
            // shutdown flag is re-checked between members, so a teardown
            // never waits for more than the resource currently in flight.
            let completion = {
                let driver = driver.read().unwrap();
                let interrupted = || shared.state.lock().unwrap().shutdown;
                execute(&batch, &driver, device.as_ref(), &interrupted)
            };

            shared.state.lock().unwrap().completions.push(completion);
        }
    }

    fn enqueue(&self, direction: Direction, group: Arc<ResourceGroup>) -> Result<()> {
        let mut state = self.shared.state.lock().unwrap();
        if state.shutdown {
            return Err(Error::Other("Worker has been shut down.".into()));
        }

        state.queue.push_back(Batch {
            direction: direction,
            group: group,
        });

        self.shared.cond.notify_one();
        Ok(())
    }
}

impl Backend for ThreadedBackend {
    fn schedule_load(&self, group: Arc<ResourceGroup>) -> Result<()> {
        self.enqueue(Direction::Load, group)
    }

    fn schedule_unload(&self, group: Arc<ResourceGroup>) -> Result<()> {
        self.enqueue(Direction::Unload, group)
    }

    fn poll(&self, out: &mut Vec<Completion>) {
        out.append(&mut self.shared.state.lock().unwrap().completions);
    }

    fn pending(&self) -> usize {
        self.shared.state.lock().unwrap().queue.len()
    }
}

impl Drop for ThreadedBackend {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.shutdown = true;
        }

        self.shared.cond.notify_all();

        // The worker finishes the resource it is on, skips the rest of the
        // batch and exits; teardown is bounded by that resource's own I/O.
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}
