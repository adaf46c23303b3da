extern crate env_logger;
extern crate kiln;
extern crate rand;

use std::any::Any;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use kiln::prelude::*;
use kiln::resource::Slot;

/// A test-only kind with a controllable load duration and failure switch,
/// registered through the injected registry like any other kind.
struct Slow {
    name: String,
    millis: u64,
    fail: bool,
    slot: Slot<()>,
}

impl Resource for Slow {
    fn kind(&self) -> &str {
        "slow"
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
        let (millis, fail) = (self.millis, self.fail);
        self.slot.load_with(|| {
            thread::sleep(Duration::from_millis(millis));
            if fail {
                Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "instrumented failure",
                )))
            } else {
                Ok(())
            }
        })
    }

    fn unload(&self, _: &LoadContext) {
        self.slot.release();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn registry() -> ResourceRegistry {
    let mut registry = ResourceRegistry::with_builtins();
    registry.register("slow", |def| {
        Ok(Arc::new(Slow {
            name: def.name.to_string(),
            millis: def.attr_u32("millis")? as u64,
            fail: def.attr_str_opt("fail")?.is_some(),
            slot: Slot::new(),
        }))
    });
    registry
}

#[derive(Clone)]
struct Recorder(Arc<Mutex<Vec<GroupEvent>>>);

impl Recorder {
    fn new() -> Self {
        Recorder(Arc::new(Mutex::new(Vec::new())))
    }

    fn events(&self) -> Vec<GroupEvent> {
        self.0.lock().unwrap().clone()
    }
}

impl GroupListener for Recorder {
    fn on_group_event(&mut self, event: &GroupEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

fn slow_group(name: &str, resources: usize, millis: u64) -> GroupManifest {
    let mut doc = GroupManifest::parse(
        format!(r#"{{ "name": "{}", "resources": [] }}"#, name).as_bytes(),
    )
    .unwrap();

    for i in 0..resources {
        doc.resources
            .push(ResourceDef::new("slow", format!("r{}", i)).with("millis", millis as u32));
    }

    doc
}

fn wait_until<F: FnMut(&mut ResourceManager) -> bool>(mgr: &mut ResourceManager, mut done: F) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        mgr.advance();
        if done(mgr) {
            return;
        }

        if Instant::now() > deadline {
            panic!("timed out waiting for the manager");
        }

        thread::sleep(Duration::from_millis(1));
    }
}

fn manager(mode: ThreadingMode) -> ResourceManager {
    let _ = env_logger::try_init();
    ResourceManager::new(registry(), Arc::new(HeadlessDevice::new()), mode).unwrap()
}

#[test]
fn unknown_group() {
    let mut mgr = manager(ThreadingMode::MultiThreaded);
    mgr.add_group(&slow_group("a", 1, 0)).unwrap();

    match mgr.load_group("missing") {
        Err(Error::NotFound(_)) => {}
        other => panic!("unexpected {:?}", other),
    }

    // Nothing was scheduled.
    assert_eq!(mgr.pending(), 0);
    assert_eq!(mgr.group_state("missing"), None);
}

#[test]
fn synchronous_backend() {
    let mut mgr = manager(ThreadingMode::SingleThreaded);
    mgr.add_group(&slow_group("a", 4, 0)).unwrap();

    // The call itself runs the batch to completion.
    mgr.load_group("a").unwrap();
    assert!(mgr.resource("slow", "r0").is_some());

    mgr.advance();
    assert!(mgr.is_group_loaded("a"));

    match mgr.load_group("a") {
        Err(Error::AlreadyExists(_)) => {}
        other => panic!("unexpected {:?}", other),
    }

    mgr.unload_group("a").unwrap();
    mgr.advance();
    assert_eq!(mgr.group_state("a"), Some(GroupState::Unloaded));
    assert!(mgr.resource("slow", "r0").is_none());

    // Unloading a group that is not loaded is a no-op.
    mgr.unload_group("a").unwrap();
}

#[test]
fn synchronous_failures_surface_immediately() {
    let mut mgr = manager(ThreadingMode::SingleThreaded);

    let mut doc = slow_group("a", 1, 0);
    doc.resources
        .push(ResourceDef::new("slow", "broken").with("millis", 0).with("fail", "yes"));
    mgr.add_group(&doc).unwrap();

    assert!(mgr.load_group("a").is_err());

    mgr.advance();
    // The group still completed; the healthy sibling is loaded.
    assert!(mgr.is_group_loaded("a"));
    assert!(mgr.resource("slow", "r0").is_some());
    assert!(mgr.resource("slow", "broken").is_none());
}

#[test]
fn duplicated_load_requests() {
    let mut mgr = manager(ThreadingMode::MultiThreaded);
    mgr.add_group(&slow_group("a", 1, 100)).unwrap();

    mgr.load_group("a").unwrap();
    match mgr.load_group("a") {
        Err(Error::AlreadyExists(_)) => {}
        other => panic!("unexpected {:?}", other),
    }

    // An unload is rejected as well while the batch is in flight.
    match mgr.unload_group("a") {
        Err(Error::AlreadyExists(_)) => {}
        other => panic!("unexpected {:?}", other),
    }

    wait_until(&mut mgr, |mgr| mgr.is_group_loaded("a"));
}

#[test]
fn transient_lookup_during_load() {
    let mut mgr = manager(ThreadingMode::MultiThreaded);
    mgr.add_group(&slow_group("a", 1, 50)).unwrap();

    mgr.load_group("a").unwrap();

    // Not loaded yet; consumers see nothing and re-query later.
    assert!(mgr.resource("slow", "r0").is_none());

    wait_until(&mut mgr, |mgr| mgr.is_group_loaded("a"));
    assert!(mgr.resource("slow", "r0").is_some());
}

#[test]
fn fifo_completion_order() {
    let recorder = Recorder::new();

    let mut mgr = manager(ThreadingMode::MultiThreaded);
    mgr.add_listener(recorder.clone());

    mgr.add_group(&slow_group("a", 4, 10)).unwrap();
    mgr.add_group(&slow_group("b", 4, 10)).unwrap();

    mgr.load_group("a").unwrap();
    mgr.load_group("b").unwrap();

    wait_until(&mut mgr, |mgr| {
        mgr.is_group_loaded("a") && mgr.is_group_loaded("b")
    });

    let events = recorder.events();
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[0],
        GroupEvent::Loaded {
            group: "a".to_string(),
            failures: Vec::new()
        }
    );
    assert_eq!(
        events[1],
        GroupEvent::Loaded {
            group: "b".to_string(),
            failures: Vec::new()
        }
    );
}

#[test]
fn failures_are_reported_in_events() {
    let recorder = Recorder::new();

    let mut mgr = manager(ThreadingMode::MultiThreaded);
    mgr.add_listener(recorder.clone());

    let mut doc = slow_group("a", 1, 0);
    doc.resources
        .push(ResourceDef::new("slow", "broken").with("millis", 0).with("fail", "yes"));
    mgr.add_group(&doc).unwrap();

    mgr.load_group("a").unwrap();
    wait_until(&mut mgr, |mgr| mgr.is_group_loaded("a"));

    let events = recorder.events();
    assert_eq!(
        events[0],
        GroupEvent::Loaded {
            group: "a".to_string(),
            failures: vec!["broken".to_string()]
        }
    );

    // The reason is retrievable from the resource itself.
    let broken = mgr.group("a").unwrap().resource("slow", "broken").unwrap();
    assert!(broken.failure().unwrap().contains("instrumented failure"));
}

#[test]
fn end_to_end_over_files() {
    let fs = Memory::new();
    fs.write("credits.txt", &b"Thanks!"[..]);
    fs.write("fade.curve", &b"[[0.0, 0.0], [1.0, 1.0]]"[..]);
    fs.write(
        "ui.group",
        r#"{
            "name": "ui",
            "resources": [
                { "type": "text", "name": "credits", "path": "res:credits.txt" },
                { "type": "curve", "name": "fade", "path": "res:fade.curve" }
            ]
        }"#,
    );

    let mut mgr = manager(ThreadingMode::MultiThreaded);
    mgr.mount("res", fs).unwrap();
    mgr.create_group("res:ui.group").unwrap();

    match mgr.create_group("res:ui.group") {
        Err(Error::AlreadyExists(_)) => {}
        other => panic!("unexpected {:?}", other),
    }

    mgr.load_group("ui").unwrap();
    wait_until(&mut mgr, |mgr| mgr.is_group_loaded("ui"));

    let curve = mgr.resource("curve", "fade").unwrap();
    let curve = curve.as_any().downcast_ref::<kiln::resource::Curve>().unwrap();
    assert_eq!(curve.evaluate(0.5), Some(0.5));
}

#[test]
fn teardown_waits_for_the_current_resource_only() {
    let mut mgr = manager(ThreadingMode::MultiThreaded);
    mgr.add_group(&slow_group("a", 8, 200)).unwrap();
    mgr.load_group("a").unwrap();

    // Let the worker get into the batch, then tear the manager down. The
    // join must be bounded by the resource in flight, not the remaining
    // 8 x 200ms of the batch.
    thread::sleep(Duration::from_millis(50));

    let started = Instant::now();
    drop(mgr);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn stress() {
    let mut mgr = manager(ThreadingMode::MultiThreaded);

    let mut names = Vec::new();
    for i in 0..16 {
        let name = format!("group-{}", i);
        let resources = 1 + rand::random::<usize>() % 8;
        mgr.add_group(&slow_group(&name, resources, 1)).unwrap();
        names.push(name);
    }

    for name in &names {
        mgr.load_group(name).unwrap();
    }

    wait_until(&mut mgr, |mgr| {
        names.iter().all(|name| mgr.is_group_loaded(name))
    });

    for name in &names {
        mgr.unload_group(name).unwrap();
    }

    wait_until(&mut mgr, |mgr| {
        names
            .iter()
            .all(|name| mgr.group_state(name) == Some(GroupState::Unloaded))
    });
}
