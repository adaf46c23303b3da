extern crate kiln;

use std::sync::Arc;

use kiln::prelude::*;
use kiln::resource::LoadContext;
use kiln::vfs::VFSDriver;

fn testbed() -> (VFSDriver, Memory, Arc<HeadlessDevice>) {
    let fs = Memory::new();
    let mut driver = VFSDriver::new();
    driver.mount("res", fs.clone()).unwrap();
    (driver, fs, Arc::new(HeadlessDevice::new()))
}

fn manifest(doc: &str) -> GroupManifest {
    GroupManifest::parse(doc.as_bytes()).unwrap()
}

#[test]
fn atomic_creation() {
    let registry = ResourceRegistry::with_builtins();

    // The second element misses its `path`; the whole group fails.
    let manifest = manifest(
        r#"{
            "name": "ui",
            "resources": [
                { "type": "text", "name": "credits", "path": "res:credits.txt" },
                { "type": "text", "name": "broken" }
            ]
        }"#,
    );

    match ResourceGroup::from_manifest(&manifest, &registry) {
        Err(Error::BadParam(_)) => {}
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
}

#[test]
fn duplicated_names() {
    let registry = ResourceRegistry::with_builtins();

    let manifest = manifest(
        r#"{
            "name": "ui",
            "resources": [
                { "type": "text", "name": "credits", "path": "res:a.txt" },
                { "type": "text", "name": "credits", "path": "res:b.txt" }
            ]
        }"#,
    );

    match ResourceGroup::from_manifest(&manifest, &registry) {
        Err(Error::AlreadyExists(_)) => {}
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
}

#[test]
fn same_name_different_kind() {
    let registry = ResourceRegistry::with_builtins();

    // (kind, name) is the key, so a text and a data may share a name.
    let manifest = manifest(
        r#"{
            "name": "ui",
            "resources": [
                { "type": "text", "name": "credits", "path": "res:credits.txt" },
                { "type": "data", "name": "credits", "path": "res:credits.txt" }
            ]
        }"#,
    );

    let group = ResourceGroup::from_manifest(&manifest, &registry).unwrap();
    assert_eq!(group.len(), 2);
    assert!(group.resource("text", "credits").is_some());
    assert!(group.resource("data", "credits").is_some());
    assert!(group.resource("texture", "credits").is_none());
}

#[test]
fn lookup_is_stable() {
    let (driver, fs, device) = testbed();
    fs.write("credits.txt", &b"Thanks for playing!"[..]);

    let registry = ResourceRegistry::with_builtins();
    let manifest = manifest(
        r#"{
            "name": "ui",
            "resources": [
                { "type": "text", "name": "credits", "path": "res:credits.txt" }
            ]
        }"#,
    );

    let group = ResourceGroup::from_manifest(&manifest, &registry).unwrap();

    let r1 = group.resource("text", "credits").unwrap();
    let r2 = group.resource("text", "credits").unwrap();
    assert!(Arc::ptr_eq(&r1, &r2));

    let ctx = LoadContext::new(&driver, device.as_ref(), &group);
    group.load(&ctx).unwrap();
    assert!(r1.is_loaded());

    group.unload(&ctx);
    assert_eq!(r1.state(), ResourceState::Unloaded);
}

#[test]
fn partial_failure_keeps_siblings() {
    let (driver, fs, device) = testbed();
    fs.write("ok.txt", &b"fine"[..]);

    let registry = ResourceRegistry::with_builtins();
    let manifest = manifest(
        r#"{
            "name": "ui",
            "resources": [
                { "type": "text", "name": "missing", "path": "res:gone.txt" },
                { "type": "text", "name": "ok", "path": "res:ok.txt" }
            ]
        }"#,
    );

    let group = ResourceGroup::from_manifest(&manifest, &registry).unwrap();
    let ctx = LoadContext::new(&driver, device.as_ref(), &group);

    // The bad member must not abort the rest.
    assert!(group.load(&ctx).is_err());

    let missing = group.resource("text", "missing").unwrap();
    let ok = group.resource("text", "ok").unwrap();

    assert_eq!(missing.state(), ResourceState::Failed);
    assert!(missing.failure().is_some());
    assert!(ok.is_loaded());
}
